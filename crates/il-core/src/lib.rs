//! # il-core
//!
//! Core domain models and ports for the image loader.
//!
//! This crate contains pure domain logic without any infrastructure dependencies:
//! source identifiers, cache keys, the sampling calculation, bitmaps, load events,
//! the request state machine and the port traits adapters implement.

// Public module exports
pub mod bitmap;
pub mod cache_dirs;
pub mod cache_key;
pub mod config;
pub mod error;
pub mod event;
pub mod ids;
pub mod ports;
pub mod request;
pub mod request_state;
pub mod sampling;
pub mod source;

// Re-export commonly used types at the crate root
pub use bitmap::{Bitmap, Dimensions};
pub use cache_key::CacheKey;
pub use config::LoaderConfig;
pub use error::LoadError;
pub use event::{FetchEvent, LoadEvent};
pub use ids::RequestId;
pub use request::{LoadOptions, LoadRequest, PlaceholderId, TargetSize};
pub use request_state::{RequestState, RequestTransition};
pub use sampling::calculate_sample_size;
pub use source::{ContentHandle, ImageSource, SourceKind};
