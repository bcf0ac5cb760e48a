use thiserror::Error;

#[derive(Debug, Error)]
pub enum CacheDirsError {
    #[error("system cache directory unavailable")]
    CacheDirUnavailable,

    #[error("platform error: {0}")]
    Platform(String),
}
