pub mod app_dirs;
pub mod content;
pub mod runtime;

pub use app_dirs::DirsCacheDirsAdapter;
pub use content::FsContentResolver;
pub use runtime::SerialCallbackQueue;
