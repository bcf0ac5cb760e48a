//! Events produced while a load runs.
//! 加载过程中产生的事件。

use crate::bitmap::{Bitmap, Dimensions};
use crate::error::LoadError;

/// Non-terminal progress reported by the fetch engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchEvent {
    /// Fraction of the body copied, in `0.0..=1.0`.
    Progress(f32),
    /// Source dimensions, known before the full decode.
    SizeDetected(Dimensions),
}

/// Everything a request listener can observe, in delivery order.
///
/// `Progress` and `SizeDetected` always precede the single terminal event
/// (`Loaded`, `Failed` or `AlreadyLoaded`).
#[derive(Debug, Clone)]
pub enum LoadEvent {
    /// The placeholder was applied to the target (on attach and on failure).
    PlaceholderApplied,
    Progress(f32),
    SizeDetected(Dimensions),
    Loaded(Bitmap),
    Failed(LoadError),
    /// The target already shows this source; nothing was fetched.
    AlreadyLoaded,
}

impl LoadEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LoadEvent::Loaded(_) | LoadEvent::Failed(_) | LoadEvent::AlreadyLoaded
        )
    }
}

impl From<FetchEvent> for LoadEvent {
    fn from(event: FetchEvent) -> Self {
        match event {
            FetchEvent::Progress(progress) => LoadEvent::Progress(progress),
            FetchEvent::SizeDetected(dimensions) => LoadEvent::SizeDetected(dimensions),
        }
    }
}
