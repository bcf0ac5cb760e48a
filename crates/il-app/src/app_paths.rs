use std::path::PathBuf;

use il_core::cache_dirs::CacheDirs;
use il_core::LoaderConfig;

pub const REGISTRY_FILE_NAME: &str = "image_cache_registry.json";

/// Concrete filesystem locations used by the loader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderPaths {
    pub cache_dir: PathBuf,
    pub registry_path: PathBuf,
    pub logs_dir: PathBuf,
}

impl LoaderPaths {
    pub fn from_cache_dirs(dirs: &CacheDirs) -> Self {
        Self {
            cache_dir: dirs.cache_root.join("images"),
            registry_path: dirs.cache_root.join(REGISTRY_FILE_NAME),
            logs_dir: dirs.data_root.join("logs"),
        }
    }

    /// Paths set in `config` win over the resolved defaults. A configured
    /// cache dir without a registry path keeps the registry next to it.
    pub fn with_config_overrides(mut self, config: &LoaderConfig) -> Self {
        if !config.cache_dir.as_os_str().is_empty() {
            self.cache_dir = config.cache_dir.clone();
            self.registry_path = config.cache_dir.join(REGISTRY_FILE_NAME);
        }
        if !config.registry_path.as_os_str().is_empty() {
            self.registry_path = config.registry_path.clone();
        }
        if !config.log_dir.as_os_str().is_empty() {
            self.logs_dir = config.log_dir.clone();
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dirs() -> CacheDirs {
        CacheDirs {
            cache_root: PathBuf::from("/tmp/cache/imageloader"),
            data_root: PathBuf::from("/tmp/data/imageloader"),
        }
    }

    #[test]
    fn loader_paths_derive_from_cache_dirs() {
        let paths = LoaderPaths::from_cache_dirs(&dirs());

        assert_eq!(paths.cache_dir, PathBuf::from("/tmp/cache/imageloader/images"));
        assert_eq!(
            paths.registry_path,
            PathBuf::from("/tmp/cache/imageloader/image_cache_registry.json")
        );
        assert_eq!(paths.logs_dir, PathBuf::from("/tmp/data/imageloader/logs"));
    }

    #[test]
    fn empty_config_keeps_defaults() {
        let paths = LoaderPaths::from_cache_dirs(&dirs());
        assert_eq!(
            paths.clone().with_config_overrides(&LoaderConfig::empty()),
            paths
        );
    }

    #[test]
    fn configured_cache_dir_moves_registry_along() {
        let mut config = LoaderConfig::empty();
        config.cache_dir = PathBuf::from("/srv/il");

        let paths = LoaderPaths::from_cache_dirs(&dirs()).with_config_overrides(&config);

        assert_eq!(paths.cache_dir, PathBuf::from("/srv/il"));
        assert_eq!(
            paths.registry_path,
            PathBuf::from("/srv/il/image_cache_registry.json")
        );
    }

    #[test]
    fn explicit_registry_path_wins() {
        let mut config = LoaderConfig::empty();
        config.cache_dir = PathBuf::from("/srv/il");
        config.registry_path = PathBuf::from("/var/lib/il/registry.json");

        let paths = LoaderPaths::from_cache_dirs(&dirs()).with_config_overrides(&config);

        assert_eq!(paths.registry_path, PathBuf::from("/var/lib/il/registry.json"));
    }
}
