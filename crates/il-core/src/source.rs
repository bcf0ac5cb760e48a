//! Image source identifiers.
//! 图像来源标识。

use std::fmt::{Display, Formatter};
use std::path::PathBuf;

use url::Url;

use crate::error::LoadError;

const SCHEME_FILE: &str = "file";
const SCHEME_CONTENT: &str = "content";
const SCHEME_HTTP: &str = "http";
const SCHEME_HTTPS: &str = "https";

/// Opaque handle to platform-provided content, e.g. `content://media/images/42`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContentHandle(String);

impl ContentHandle {
    pub fn new(handle: impl Into<String>) -> Self {
        Self(handle.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Authority component (`media` in `content://media/images/42`).
    pub fn authority(&self) -> Option<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|url| url.host_str().map(str::to_owned))
    }

    /// Path segments after the authority.
    pub fn segments(&self) -> Vec<String> {
        Url::parse(&self.0)
            .ok()
            .and_then(|url| {
                url.path_segments().map(|segments| {
                    segments
                        .filter(|s| !s.is_empty())
                        .map(str::to_owned)
                        .collect()
                })
            })
            .unwrap_or_default()
    }
}

impl Display for ContentHandle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where an image comes from.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// Local file path.
    File(PathBuf),
    /// Platform content handle.
    Content(ContentHandle),
    /// Remote `http`/`https` URL.
    Remote(Url),
    /// Unparsed string, resolved by scheme at fetch time.
    Raw(String),
}

/// A source with its raw form resolved into a concrete kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceKind {
    File(PathBuf),
    Content(ContentHandle),
    Remote(Url),
}

impl ImageSource {
    /// Resolve into a concrete [`SourceKind`].
    ///
    /// Raw strings are parsed as URLs: `file` maps to a path, `content` to a
    /// content handle, `http`/`https` to a remote URL. Anything else, including
    /// a string with no scheme, is [`LoadError::UnsupportedScheme`].
    pub fn kind(&self) -> Result<SourceKind, LoadError> {
        match self {
            ImageSource::File(path) => Ok(SourceKind::File(path.clone())),
            ImageSource::Content(handle) => Ok(SourceKind::Content(handle.clone())),
            ImageSource::Remote(url) => match url.scheme() {
                SCHEME_HTTP | SCHEME_HTTPS => Ok(SourceKind::Remote(url.clone())),
                other => Err(LoadError::UnsupportedScheme(other.to_string())),
            },
            ImageSource::Raw(raw) => parse_raw(raw),
        }
    }
}

fn parse_raw(raw: &str) -> Result<SourceKind, LoadError> {
    let url = Url::parse(raw).map_err(|_| LoadError::UnsupportedScheme(String::new()))?;
    match url.scheme() {
        SCHEME_FILE => url
            .to_file_path()
            .map(SourceKind::File)
            .map_err(|_| LoadError::UnsupportedScheme(SCHEME_FILE.to_string())),
        SCHEME_CONTENT => Ok(SourceKind::Content(ContentHandle::new(raw))),
        SCHEME_HTTP | SCHEME_HTTPS => Ok(SourceKind::Remote(url)),
        other => Err(LoadError::UnsupportedScheme(other.to_string())),
    }
}

impl Display for ImageSource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ImageSource::File(path) => write!(f, "{}", path.display()),
            ImageSource::Content(handle) => write!(f, "{handle}"),
            ImageSource::Remote(url) => write!(f, "{url}"),
            ImageSource::Raw(raw) => write!(f, "{raw}"),
        }
    }
}

impl From<PathBuf> for ImageSource {
    fn from(path: PathBuf) -> Self {
        ImageSource::File(path)
    }
}

impl From<Url> for ImageSource {
    fn from(url: Url) -> Self {
        ImageSource::Remote(url)
    }
}

impl From<ContentHandle> for ImageSource {
    fn from(handle: ContentHandle) -> Self {
        ImageSource::Content(handle)
    }
}

impl From<String> for ImageSource {
    fn from(raw: String) -> Self {
        ImageSource::Raw(raw)
    }
}

impl From<&str> for ImageSource {
    fn from(raw: &str) -> Self {
        ImageSource::Raw(raw.to_string())
    }
}
