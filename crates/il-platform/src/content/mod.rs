mod fs_resolver;

pub use fs_resolver::FsContentResolver;
