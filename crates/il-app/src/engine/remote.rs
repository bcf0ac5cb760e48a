use std::fs::File;
use std::io::{self, BufWriter, Read};
use std::path::PathBuf;
use std::sync::Arc;

use il_core::ports::ImageDecoderPort;
use il_core::{Bitmap, CacheKey, Dimensions, LoadError, LoadOptions, TargetSize};
use il_infra::TailCopyingReader;
use tokio::runtime::Handle;
use tokio_util::io::SyncIoBridge;
use tracing::{debug, info, warn};
use url::Url;

use super::{decode_with_bounds, discard, run_blocking, EventEmitter, FetchEngine};

const SNIFF_CHUNK: usize = 8 * 1024;

impl FetchEngine {
    #[tracing::instrument(name = "engine.fetch_remote", skip(self, url, options, emitter), fields(url = %url))]
    pub(crate) async fn fetch_remote(
        &self,
        url: &Url,
        options: &LoadOptions,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        if let Some(bitmap) = self.try_load_from_cache(url, options, emitter).await? {
            return Ok(bitmap);
        }
        emitter.check()?;
        self.download(url, options, emitter).await
    }

    /// Memory cache, then disk cache. With `with_etag` the key is built from
    /// a fresh HEAD response, and a failed HEAD fails the load.
    async fn try_load_from_cache(
        &self,
        url: &Url,
        options: &LoadOptions,
        emitter: &EventEmitter,
    ) -> Result<Option<Bitmap>, LoadError> {
        let etag = if options.with_etag {
            self.fetch_etag(url).await?
        } else {
            None
        };
        let key = CacheKey::for_remote(url, etag.as_deref());

        if options.use_memory_cache {
            if let Some(bitmap) = self.memory_cache.get(&key).await {
                debug!(cache_key = %key, "Memory cache hit");
                return Ok(Some(bitmap));
            }
        }

        let cached = match self.disk_cache.resolve(&key).await {
            Ok(cached) => cached,
            Err(err) => {
                warn!(cache_key = %key, error = %err, "Disk cache lookup failed, treating as miss");
                None
            }
        };
        let Some(path) = cached else {
            return Ok(None);
        };

        match self
            .decode_file(path.clone(), options.target_size, emitter)
            .await
        {
            Ok(bitmap) => {
                debug!(cache_key = %key, path = %path.display(), "Disk cache hit");
                if options.use_memory_cache {
                    self.memory_cache.put(&key, bitmap.clone()).await;
                }
                Ok(Some(bitmap))
            }
            Err(LoadError::Interrupted) => Err(LoadError::Interrupted),
            Err(err) => {
                warn!(cache_key = %key, error = %err, "Cached file unusable, downloading again");
                Ok(None)
            }
        }
    }

    async fn fetch_etag(&self, url: &Url) -> Result<Option<String>, LoadError> {
        let response = self.transport.head(url).await.map_err(LoadError::transport)?;
        if !response.is_success() {
            let status_code = response.status;
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::HttpError { status_code, body });
        }
        Ok(response.etag().map(str::to_owned))
    }

    async fn download(
        &self,
        url: &Url,
        options: &LoadOptions,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        let mut response = self.transport.get(url).await.map_err(LoadError::transport)?;
        if !response.is_success() {
            let status_code = response.status;
            let body = response.text().await.unwrap_or_default();
            return Err(LoadError::HttpError { status_code, body });
        }

        let etag = options
            .with_etag
            .then(|| response.etag().map(str::to_owned))
            .flatten();
        let key = CacheKey::for_remote(url, etag.as_deref());
        let total = response.content_length().unwrap_or(0);
        let Some(body) = response.body.take() else {
            return Err(LoadError::EmptyResponseBody);
        };

        let file = self
            .disk_cache
            .new_cache_file()
            .await
            .map_err(LoadError::cache)?;
        debug!(cache_key = %key, path = %file.display(), total, "Downloading");

        let job = DownloadJob {
            decoder: self.decoder.clone(),
            file: file.clone(),
            total,
            sniff_limit: self.header_sniff_limit,
            target: options.target_size,
            emitter: emitter.clone(),
        };
        let handle = Handle::current();
        let bitmap =
            run_blocking(move || job.run(SyncIoBridge::new_with_handle(body, handle))).await?;

        // An unregistered file is invisible to `clear`, so it must not stay.
        match self.disk_cache.register(&key, &file).await {
            Ok(()) => info!(cache_key = %key, "Downloaded and cached"),
            Err(err) => {
                warn!(cache_key = %key, error = %err, "Failed to register downloaded file");
                if let Err(err) = tokio::fs::remove_file(&file).await {
                    if err.kind() != io::ErrorKind::NotFound {
                        warn!(path = %file.display(), error = %err, "Failed to remove unregistered download");
                    }
                }
            }
        }
        if options.use_memory_cache {
            self.memory_cache.put(&key, bitmap.clone()).await;
        }
        Ok(bitmap)
    }
}

/// Blocking half of a download: stream the body into the cache file while
/// sniffing the header, then decode the completed file.
struct DownloadJob {
    decoder: Arc<dyn ImageDecoderPort>,
    file: PathBuf,
    total: u64,
    sniff_limit: usize,
    target: Option<TargetSize>,
    emitter: EventEmitter,
}

impl DownloadJob {
    /// The partial file is removed on any failure. This runs on the blocking
    /// pool, so it also happens when the awaiting task was dropped.
    fn run(self, body: impl Read) -> Result<Bitmap, LoadError> {
        let result = self.transfer(body);
        if result.is_err() {
            discard(&self.file);
        }
        result
    }

    fn transfer(&self, body: impl Read) -> Result<Bitmap, LoadError> {
        let emitter = &self.emitter;
        let map_io = |err: io::Error| {
            if emitter.is_cancelled() {
                LoadError::Interrupted
            } else {
                LoadError::transport(err)
            }
        };

        let sink = BufWriter::new(File::create(&self.file).map_err(LoadError::transport)?);
        let total = self.total;
        let mut reader = TailCopyingReader::new(body, sink, |copied| {
            if emitter.is_cancelled() {
                return Err(io::Error::other("cancelled"));
            }
            if total > 0 {
                emitter.progress(copied as f32 / total as f32);
            }
            Ok(())
        });

        let sniffed = self.sniff_bounds(&mut reader).map_err(map_io)?;
        emitter.size_detected(sniffed);
        reader.copy_tail().map_err(map_io)?;
        reader.finish().map_err(map_io)?;
        emitter.check()?;

        let bytes = std::fs::read(&self.file).map_err(LoadError::transport)?;
        let bounds = if sniffed.is_positive() {
            sniffed
        } else {
            let probed = self
                .decoder
                .probe_bounds(&bytes)
                .map_err(LoadError::decode)?
                .unwrap_or_default();
            emitter.size_detected(probed);
            probed
        };
        decode_with_bounds(self.decoder.as_ref(), &bytes, bounds, self.target)
    }

    /// Read up to `sniff_limit` bytes, probing after each chunk until the
    /// header yields a size. Unknown stays `0x0`.
    fn sniff_bounds(&self, reader: &mut impl Read) -> io::Result<Dimensions> {
        let mut header = Vec::with_capacity(SNIFF_CHUNK);
        let mut chunk = [0u8; SNIFF_CHUNK];
        while header.len() < self.sniff_limit {
            let want = SNIFF_CHUNK.min(self.sniff_limit - header.len());
            let n = match reader.read(&mut chunk[..want]) {
                Ok(0) => break,
                Ok(n) => n,
                Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                Err(err) => return Err(err),
            };
            header.extend_from_slice(&chunk[..n]);
            if let Ok(Some(bounds)) = self.decoder.probe_bounds(&header) {
                if bounds.is_positive() {
                    return Ok(bounds);
                }
            }
        }
        Ok(Dimensions::default())
    }
}
