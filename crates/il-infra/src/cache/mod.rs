pub mod disk_registry;
pub mod memory_cache;

pub use disk_registry::DiskCacheRegistry;
pub use memory_cache::MemoryCache;
