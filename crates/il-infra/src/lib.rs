//! # il-infra
//!
//! Infrastructure adapters for the image loader: the memory and disk cache
//! tiers, key-value persistence, the tee reader used while downloading, the
//! `image`-crate decoder and the `reqwest` transport.

pub mod cache;
pub mod decode;
pub mod http;
pub mod io;
pub mod kv;
pub mod memory_budget;

pub use cache::{DiskCacheRegistry, MemoryCache};
pub use decode::ImageCrateDecoder;
pub use http::ReqwestTransport;
pub use io::TailCopyingReader;
pub use kv::{FileKeyValueStore, InMemoryKeyValueStore};
