use crate::cache_dirs::CacheDirs;
use crate::ports::errors::CacheDirsError;

pub trait CacheDirsPort: Send + Sync {
    fn get_cache_dirs(&self) -> Result<CacheDirs, CacheDirsError>;
}
