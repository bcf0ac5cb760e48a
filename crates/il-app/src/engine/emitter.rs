use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use il_core::{Dimensions, FetchEvent, LoadError};
use tokio_util::sync::CancellationToken;

type EventSink = Arc<dyn Fn(FetchEvent) + Send + Sync>;

/// Channel from a running fetch back to its request.
///
/// Every emission checks the cancellation token first, and at most one
/// `SizeDetected` is forwarded per fetch.
#[derive(Clone)]
pub struct EventEmitter {
    token: CancellationToken,
    sink: EventSink,
    size_reported: Arc<AtomicBool>,
}

impl EventEmitter {
    pub fn new(token: CancellationToken, sink: impl Fn(FetchEvent) + Send + Sync + 'static) -> Self {
        Self {
            token,
            sink: Arc::new(sink),
            size_reported: Arc::new(AtomicBool::new(false)),
        }
    }

    /// An emitter nobody listens to and nobody cancels.
    pub fn detached() -> Self {
        Self::new(CancellationToken::new(), |_| {})
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// `Err(Interrupted)` once the request was cancelled.
    pub fn check(&self) -> Result<(), LoadError> {
        if self.is_cancelled() {
            Err(LoadError::Interrupted)
        } else {
            Ok(())
        }
    }

    pub fn progress(&self, fraction: f32) {
        if self.is_cancelled() {
            return;
        }
        (self.sink)(FetchEvent::Progress(fraction.clamp(0.0, 1.0)));
    }

    /// Forward the source size; unknown sizes and repeats are dropped.
    pub fn size_detected(&self, dimensions: Dimensions) {
        if self.is_cancelled() || !dimensions.is_positive() {
            return;
        }
        if self.size_reported.swap(true, Ordering::AcqRel) {
            return;
        }
        (self.sink)(FetchEvent::SizeDetected(dimensions));
    }
}
