//! # il-app
//!
//! The fetch pipeline: [`engine::FetchEngine`] turns a source into a decoded
//! bitmap through the cache tiers, and [`loader::ImageLoader`] drives a
//! request through its lifecycle and delivers events to a target.

pub mod app_paths;
pub mod engine;
pub mod loader;
pub mod preload;

pub use app_paths::LoaderPaths;
pub use engine::{EventEmitter, FetchEngine};
pub use loader::{ImageLoader, LoadHandle, LoadListener, LoadRequestBuilder};
pub use preload::{PreloadStatus, PreloadTarget};
