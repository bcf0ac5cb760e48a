//! Fetch engine: source dispatch and the cache tiers.
//! 获取引擎：按来源分派并经过各级缓存。

mod content;
mod emitter;
mod local;
mod remote;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use il_core::ports::{
    BitmapCachePort, ContentResolverPort, DiskCachePort, HttpTransportPort, ImageDecoderPort,
};
use il_core::{
    calculate_sample_size, Bitmap, Dimensions, ImageSource, LoadError, LoadOptions, SourceKind,
    TargetSize,
};

pub use emitter::EventEmitter;

/// Header bytes buffered while probing a download for its bounds.
pub const DEFAULT_HEADER_SNIFF_LIMIT: usize = 64 * 1024;

/// Turns an [`ImageSource`] into a decoded [`Bitmap`].
///
/// File and remote sources go through the memory cache when the request
/// asks for it; remote and content sources are also persisted through the
/// disk cache. All blocking I/O and decoding runs on the blocking pool.
pub struct FetchEngine {
    transport: Arc<dyn HttpTransportPort>,
    decoder: Arc<dyn ImageDecoderPort>,
    memory_cache: Arc<dyn BitmapCachePort>,
    disk_cache: Arc<dyn DiskCachePort>,
    content_resolver: Option<Arc<dyn ContentResolverPort>>,
    header_sniff_limit: usize,
}

impl FetchEngine {
    pub fn new(
        transport: Arc<dyn HttpTransportPort>,
        decoder: Arc<dyn ImageDecoderPort>,
        memory_cache: Arc<dyn BitmapCachePort>,
        disk_cache: Arc<dyn DiskCachePort>,
    ) -> Self {
        Self {
            transport,
            decoder,
            memory_cache,
            disk_cache,
            content_resolver: None,
            header_sniff_limit: DEFAULT_HEADER_SNIFF_LIMIT,
        }
    }

    pub fn with_content_resolver(mut self, resolver: Arc<dyn ContentResolverPort>) -> Self {
        self.content_resolver = Some(resolver);
        self
    }

    /// `0` keeps the default.
    pub fn with_header_sniff_limit(mut self, limit: usize) -> Self {
        if limit > 0 {
            self.header_sniff_limit = limit;
        }
        self
    }

    /// Fetch and decode `source`. Non-terminal events go to `emitter`.
    pub async fn fetch(
        &self,
        source: &ImageSource,
        options: &LoadOptions,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        emitter.check()?;
        match source.kind()? {
            SourceKind::File(path) => self.fetch_file(&path, options, emitter).await,
            SourceKind::Content(handle) => self.fetch_content(&handle, emitter).await,
            SourceKind::Remote(url) => self.fetch_remote(&url, options, emitter).await,
        }
    }

    /// Delete every disk cache file and registry entry.
    pub async fn clear_disk_cache(&self) -> anyhow::Result<usize> {
        self.disk_cache.clear().await
    }

    pub async fn clear_memory_cache(&self) {
        self.memory_cache.clear().await;
    }

    /// Read `path`, report its size and decode it sampled for `target`.
    async fn decode_file(
        &self,
        path: PathBuf,
        target: Option<TargetSize>,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        let decoder = self.decoder.clone();
        let emitter = emitter.clone();
        run_blocking(move || {
            let bytes = std::fs::read(&path).map_err(|err| {
                LoadError::TransportError(format!("read {}: {err}", path.display()))
            })?;
            decode_sampled(decoder.as_ref(), &bytes, target, &emitter)
        })
        .await
    }
}

/// Probe, emit `SizeDetected`, then decode at the sample size for `target`.
pub(crate) fn decode_sampled(
    decoder: &dyn ImageDecoderPort,
    bytes: &[u8],
    target: Option<TargetSize>,
    emitter: &EventEmitter,
) -> Result<Bitmap, LoadError> {
    let bounds = decoder
        .probe_bounds(bytes)
        .map_err(LoadError::decode)?
        .unwrap_or_default();
    emitter.size_detected(bounds);
    emitter.check()?;
    decode_with_bounds(decoder, bytes, bounds, target)
}

pub(crate) fn decode_with_bounds(
    decoder: &dyn ImageDecoderPort,
    bytes: &[u8],
    bounds: Dimensions,
    target: Option<TargetSize>,
) -> Result<Bitmap, LoadError> {
    let sample_size = calculate_sample_size(bounds, target);
    tracing::trace!(
        width = bounds.width,
        height = bounds.height,
        sample_size,
        "Decoding"
    );
    decoder
        .decode(bytes, sample_size)
        .map_err(LoadError::decode)
}

/// Remove a partially written cache file. A missing file is fine.
pub(crate) fn discard(file: &Path) {
    if let Err(err) = std::fs::remove_file(file) {
        if err.kind() != std::io::ErrorKind::NotFound {
            tracing::warn!(path = %file.display(), error = %err, "Failed to remove cache file");
        }
    }
}

/// Run `f` on the blocking pool.
pub(crate) async fn run_blocking<T, F>(f: F) -> Result<T, LoadError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, LoadError> + Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|err| LoadError::TransportError(format!("blocking task failed: {err}")))?
}

#[cfg(test)]
pub(crate) mod test_support;
