mod tail_copying_reader;

pub use tail_copying_reader::TailCopyingReader;
