//! Process bootstrap for the image loader: configuration, tracing and
//! dependency wiring. The loader itself lives in the `il-*` crates.

pub mod bootstrap;
