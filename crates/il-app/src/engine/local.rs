use std::path::Path;

use il_core::{Bitmap, CacheKey, LoadError, LoadOptions};
use tracing::debug;

use super::{EventEmitter, FetchEngine};

impl FetchEngine {
    #[tracing::instrument(name = "engine.fetch_file", skip(self, options, emitter))]
    pub(crate) async fn fetch_file(
        &self,
        path: &Path,
        options: &LoadOptions,
        emitter: &EventEmitter,
    ) -> Result<Bitmap, LoadError> {
        let absolute = std::path::absolute(path).map_err(|err| {
            LoadError::TransportError(format!("resolve {}: {err}", path.display()))
        })?;
        let key = CacheKey::for_file(&absolute);

        if options.use_memory_cache {
            if let Some(bitmap) = self.memory_cache.get(&key).await {
                debug!(cache_key = %key, "Memory cache hit");
                return Ok(bitmap);
            }
        }

        let bitmap = self
            .decode_file(absolute, options.target_size, emitter)
            .await?;

        if options.use_memory_cache {
            self.memory_cache.put(&key, bitmap.clone()).await;
        }
        Ok(bitmap)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::{fake_image, Fixture};
    use super::*;
    use il_core::{Dimensions, FetchEvent, TargetSize};

    #[tokio::test]
    async fn second_load_with_memory_cache_skips_probe_and_decode() {
        let fixture = Fixture::new();
        let path = fixture.write_file("a.img", &fake_image(400, 300, 0));
        let options = LoadOptions {
            use_memory_cache: true,
            ..LoadOptions::default()
        };

        let first = fixture
            .engine
            .fetch(&path.clone().into(), &options, &EventEmitter::detached())
            .await
            .unwrap();
        let (probes, decodes) = fixture.decoder.calls();

        let second = fixture
            .engine
            .fetch(&path.into(), &options, &EventEmitter::detached())
            .await
            .unwrap();

        assert!(second.same_as(&first));
        assert_eq!(fixture.decoder.calls(), (probes, decodes));
    }

    #[tokio::test]
    async fn without_memory_cache_every_load_decodes() {
        let fixture = Fixture::new();
        let path = fixture.write_file("a.img", &fake_image(40, 30, 0));
        let options = LoadOptions::default();

        for _ in 0..2 {
            fixture
                .engine
                .fetch(&path.clone().into(), &options, &EventEmitter::detached())
                .await
                .unwrap();
        }

        assert_eq!(fixture.decoder.calls().1, 2);
        assert!(fixture.memory.is_empty().await);
    }

    #[tokio::test]
    async fn reports_size_and_samples_for_target() {
        let fixture = Fixture::new();
        let path = fixture.write_file("big.img", &fake_image(2048, 1536, 0));
        let (emitter, events) = super::super::test_support::recording_emitter();
        let options = LoadOptions {
            target_size: Some(TargetSize::new(100, 100)),
            ..LoadOptions::default()
        };

        let bitmap = fixture
            .engine
            .fetch(&path.into(), &options, &emitter)
            .await
            .unwrap();

        assert_eq!(bitmap.dimensions(), Dimensions::new(256, 192));
        assert_eq!(
            *events.lock().unwrap(),
            vec![FetchEvent::SizeDetected(Dimensions::new(2048, 1536))]
        );
    }

    #[tokio::test]
    async fn missing_file_is_a_transport_error() {
        let fixture = Fixture::new();
        let path = fixture.temp.path().join("nope.img");

        let err = fixture
            .engine
            .fetch(&path.into(), &LoadOptions::default(), &EventEmitter::detached())
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::TransportError(_)));
    }

    #[tokio::test]
    async fn undecodable_file_is_a_decode_error() {
        let fixture = Fixture::new();
        let path = fixture.write_file("junk.img", b"junk");

        let err = fixture
            .engine
            .fetch(&path.into(), &LoadOptions::default(), &EventEmitter::detached())
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::DecodeError(_)));
    }
}
