use std::path::PathBuf;

use il_core::{
    cache_dirs::CacheDirs,
    ports::{CacheDirsError, CacheDirsPort},
};

const APP_DIR_NAME: &str = "imageloader";
const PROFILE_ENV: &str = "IL_PROFILE";

/// Where the per-user directories come from.
#[derive(Debug, Clone)]
enum Roots {
    /// `dirs::cache_dir` and `dirs::data_local_dir`.
    System,
    /// One directory standing in for both.
    Fixed(PathBuf),
}

/// Cache and data roots under the platform's per-user directories.
///
/// Both roots end in `imageloader`, or `imageloader-<profile>` when a
/// profile is set, so side-by-side profiles never share a cache.
///
/// ```
/// use il_platform::app_dirs::DirsCacheDirsAdapter;
/// let _ = DirsCacheDirsAdapter::new();
/// ```
#[derive(Debug, Clone)]
pub struct DirsCacheDirsAdapter {
    roots: Roots,
    profile: Option<String>,
}

impl DirsCacheDirsAdapter {
    /// System directories, profile taken from `IL_PROFILE`.
    pub fn new() -> Self {
        let profile = std::env::var(PROFILE_ENV)
            .ok()
            .filter(|profile| !profile.is_empty());
        Self {
            roots: Roots::System,
            profile,
        }
    }

    /// Resolve both roots under `base`. Used by tests and portable installs.
    pub fn with_base_dir(base: PathBuf) -> Self {
        Self {
            roots: Roots::Fixed(base),
            ..Self::new()
        }
    }

    /// Override the profile; an empty string clears it.
    pub fn with_profile(mut self, profile: impl Into<String>) -> Self {
        let profile = profile.into();
        self.profile = (!profile.is_empty()).then_some(profile);
        self
    }

    fn app_dir_name(&self) -> String {
        match &self.profile {
            Some(profile) => format!("{APP_DIR_NAME}-{profile}"),
            None => APP_DIR_NAME.to_string(),
        }
    }
}

impl Default for DirsCacheDirsAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl CacheDirsPort for DirsCacheDirsAdapter {
    fn get_cache_dirs(&self) -> Result<CacheDirs, CacheDirsError> {
        let (cache_base, data_base) = match &self.roots {
            Roots::Fixed(base) => (base.clone(), base.clone()),
            Roots::System => (
                dirs::cache_dir().ok_or(CacheDirsError::CacheDirUnavailable)?,
                dirs::data_local_dir().ok_or_else(|| {
                    CacheDirsError::Platform("data local dir unavailable".to_string())
                })?,
            ),
        };
        let name = self.app_dir_name();

        Ok(CacheDirs {
            cache_root: cache_base.join(&name),
            data_root: data_base.join(name),
        })
    }
}
