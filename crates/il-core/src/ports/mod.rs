//! Port interfaces for the loader
//!
//! Ports define the contract between the pipeline (engine and request
//! controller) and infrastructure implementations. Decoding, transport,
//! persistence, content resolution and callback scheduling are all injected
//! through these traits, so the pipeline itself never touches a concrete
//! codec, HTTP client or filesystem layout.

mod cache;
pub mod cache_dirs;
mod callback;
mod content;
mod decoder;
pub mod errors;
mod kv_store;
mod target;
pub mod transport;

pub use cache::{BitmapCachePort, DiskCachePort};
pub use cache_dirs::CacheDirsPort;
pub use callback::{CallbackContextPort, CallbackTask};
pub use content::ContentResolverPort;
pub use decoder::ImageDecoderPort;
pub use errors::CacheDirsError;
pub use kv_store::KeyValueStorePort;
pub use target::LoadTarget;
pub use transport::{ByteStream, HttpResponse, HttpTransportPort};
