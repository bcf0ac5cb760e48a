//! # Dependency Injection / 依赖注入模块
//!
//! The only place that depends on il-infra, il-platform and il-app at once.
//! It assembles adapters into a loader and fills in defaults for values the
//! configuration leaves unset; it makes no other decisions.
//!
//! 唯一同时依赖 il-infra、il-platform 与 il-app 的地方，只负责组装。

use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use il_app::{FetchEngine, ImageLoader, LoaderPaths};
use il_core::ports::CacheDirsPort;
use il_core::LoaderConfig;
use il_infra::memory_budget::default_memory_budget_kib;
use il_infra::{DiskCacheRegistry, FileKeyValueStore, ImageCrateDecoder, MemoryCache, ReqwestTransport};
use il_platform::{DirsCacheDirsAdapter, FsContentResolver, SerialCallbackQueue};
use tracing::info;

const DEFAULT_USER_AGENT: &str = concat!("imageloader/", env!("CARGO_PKG_VERSION"));
const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// A wired loader and the pieces callers may need alongside it.
pub struct LoaderRuntime {
    pub loader: ImageLoader,
    /// The loader's callback context; `flush` waits for pending deliveries.
    pub callbacks: SerialCallbackQueue,
    pub paths: LoaderPaths,
}

/// Resolve filesystem locations from the platform directories and `config`.
pub fn resolve_paths(config: &LoaderConfig) -> anyhow::Result<LoaderPaths> {
    let dirs = DirsCacheDirsAdapter::new()
        .get_cache_dirs()
        .context("Failed to resolve cache directories")?;
    Ok(LoaderPaths::from_cache_dirs(&dirs).with_config_overrides(config))
}

/// Assemble the loader. Must be called from within a tokio runtime.
pub fn build_loader(config: &LoaderConfig, paths: &LoaderPaths) -> anyhow::Result<LoaderRuntime> {
    let user_agent = if config.user_agent.is_empty() {
        DEFAULT_USER_AGENT
    } else {
        config.user_agent.as_str()
    };
    let timeout_secs = match config.timeout_secs {
        0 => DEFAULT_TIMEOUT_SECS,
        secs => secs,
    };
    let transport = ReqwestTransport::new(user_agent, Duration::from_secs(timeout_secs))
        .context("Failed to create HTTP transport")?;

    let memory_budget_kib = match config.memory_budget_kib {
        0 => default_memory_budget_kib(),
        budget => budget,
    };
    let memory_cache = MemoryCache::with_budget(memory_budget_kib);

    let registry_store = FileKeyValueStore::new(paths.registry_path.clone());
    let disk_cache = DiskCacheRegistry::new(paths.cache_dir.clone(), Arc::new(registry_store))
        .with_context(|| {
            format!("Failed to open disk cache at {}", paths.cache_dir.display())
        })?;

    let mut engine = FetchEngine::new(
        Arc::new(transport),
        Arc::new(ImageCrateDecoder::new()),
        Arc::new(memory_cache),
        Arc::new(disk_cache),
    )
    .with_header_sniff_limit(config.header_sniff_limit);
    if !config.content_roots.is_empty() {
        engine = engine.with_content_resolver(Arc::new(FsContentResolver::new(
            config.content_roots.clone(),
        )));
    }

    let callbacks = SerialCallbackQueue::spawn();
    let loader = ImageLoader::new(Arc::new(engine), Arc::new(callbacks.clone()))
        .with_max_concurrent_fetches(config.max_concurrent_fetches);

    info!(
        cache_dir = %paths.cache_dir.display(),
        registry = %paths.registry_path.display(),
        memory_budget_kib,
        max_concurrent_fetches = config.max_concurrent_fetches,
        content_roots = config.content_roots.len(),
        "Image loader ready"
    );

    Ok(LoaderRuntime {
        loader,
        callbacks,
        paths: paths.clone(),
    })
}
