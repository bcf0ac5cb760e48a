use std::fmt::Display;

use thiserror::Error;

/// Why a load did not produce an image.
///
/// 加载失败的原因。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoadError {
    #[error("unsupported source kind: {0}")]
    UnsupportedSourceKind(String),

    #[error("unsupported scheme: {0:?}")]
    UnsupportedScheme(String),

    /// Non-2xx response to GET or to the ETag revalidation HEAD.
    #[error("http error {status_code}: {body}")]
    HttpError { status_code: u16, body: String },

    #[error("response with no body")]
    EmptyResponseBody,

    #[error("empty content: {0}")]
    EmptyContentSource(String),

    #[error("decode error: {0}")]
    DecodeError(String),

    #[error("transport error: {0}")]
    TransportError(String),

    /// Cancellation observed while the load was running.
    #[error("load interrupted")]
    Interrupted,

    #[error("cache error: {0}")]
    CacheError(String),
}

impl LoadError {
    /// Build from any error, keeping the whole context chain.
    pub fn decode(err: impl Display) -> Self {
        LoadError::DecodeError(format!("{err:#}"))
    }

    pub fn transport(err: impl Display) -> Self {
        LoadError::TransportError(format!("{err:#}"))
    }

    pub fn cache(err: impl Display) -> Self {
        LoadError::CacheError(format!("{err:#}"))
    }

    pub fn is_interrupted(&self) -> bool {
        matches!(self, LoadError::Interrupted)
    }
}
