use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;

use il_core::{Bitmap, CacheKey, ContentHandle, LoadError};
use tracing::debug;

use super::{discard, run_blocking, EventEmitter, FetchEngine};

impl FetchEngine {
    /// Copy the content into its cache file, decode at full size and apply
    /// the embedded orientation. The memory cache is not consulted: two opens
    /// of the same handle may yield different bytes.
    #[tracing::instrument(name = "engine.fetch_content", skip(self, handle, emitter), fields(handle = %handle))]
    pub(crate) async fn fetch_content(
        &self,
        handle: &ContentHandle,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        let Some(resolver) = self.content_resolver.clone() else {
            return Err(LoadError::UnsupportedSourceKind("content".to_string()));
        };

        let opened = {
            let handle = handle.clone();
            run_blocking(move || resolver.open(&handle).map_err(LoadError::transport)).await?
        };
        let Some(mut source) = opened else {
            return Err(LoadError::EmptyContentSource(handle.to_string()));
        };
        emitter.check()?;

        let key = CacheKey::for_content(handle);
        let file = self
            .disk_cache
            .lookup_or_allocate(&key)
            .await
            .map_err(LoadError::cache)?;
        debug!(cache_key = %key, path = %file.display(), "Copying content to cache file");

        let decoder = self.decoder.clone();
        let emitter = emitter.clone();
        run_blocking(move || {
            // The file is already registered; a truncated copy must not survive.
            if let Err(err) = copy_into(&mut source, &file) {
                discard(&file);
                return Err(LoadError::TransportError(format!(
                    "copy content to {}: {err}",
                    file.display()
                )));
            }
            if emitter.is_cancelled() {
                discard(&file);
                return Err(LoadError::Interrupted);
            }

            let bytes = std::fs::read(&file).map_err(LoadError::transport)?;
            let bitmap = decoder.decode_full(&bytes).map_err(LoadError::decode)?;
            decoder
                .correct_orientation(bitmap, &bytes)
                .map_err(LoadError::decode)
        })
        .await
    }
}

fn copy_into(source: &mut dyn Read, file: &Path) -> io::Result<()> {
    let mut sink = BufWriter::new(File::create(file)?);
    io::copy(source, &mut sink)?;
    sink.flush()
}
