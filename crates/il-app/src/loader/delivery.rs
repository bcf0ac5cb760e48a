//! Per-request state and the callbacks run on the callback context.

use std::sync::{Arc, Mutex, PoisonError};

use il_core::ports::LoadTarget;
use il_core::{Bitmap, ImageSource, LoadError, LoadEvent, LoadRequest, RequestState, RequestTransition};
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use super::LoadListener;

/// Request state guarded by a mutex, mirrored into a watch channel once the
/// hooks for a transition have run.
pub(crate) struct RequestCell {
    state: Mutex<RequestState>,
    watch: watch::Sender<RequestState>,
}

impl RequestCell {
    pub(crate) fn new() -> Self {
        let (watch, _) = watch::channel(RequestState::Created);
        Self {
            state: Mutex::new(RequestState::Created),
            watch,
        }
    }

    /// Apply `transition`; `false` when it is not allowed from the current state.
    pub(crate) fn transition(&self, transition: RequestTransition) -> bool {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match state.apply(transition) {
            Some(next) => {
                *state = next;
                true
            }
            None => false,
        }
    }

    pub(crate) fn current(&self) -> RequestState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub(crate) fn publish(&self) {
        self.watch.send_replace(self.current());
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<RequestState> {
        self.watch.subscribe()
    }
}

/// Everything a callback needs to deliver to one request's target and
/// listener. Methods must run on the callback context.
#[derive(Clone)]
pub(crate) struct Delivery {
    pub request: Arc<LoadRequest>,
    pub target: Arc<dyn LoadTarget>,
    pub listener: Option<LoadListener>,
    pub token: CancellationToken,
    pub cell: Arc<RequestCell>,
}

impl Delivery {
    pub(crate) fn emit(&self, event: &LoadEvent) {
        if let Some(listener) = &self.listener {
            listener(event);
        }
    }

    /// Whether non-terminal events may still be delivered.
    pub(crate) fn is_live(&self) -> bool {
        !self.token.is_cancelled() && self.cell.current() == RequestState::Executing
    }

    /// 清空目标并设置占位图
    pub(crate) fn apply_placeholder(&self) {
        self.target.clear();
        if let Some(placeholder) = self.request.options.placeholder {
            self.target.set_placeholder(placeholder);
        }
        self.emit(&LoadEvent::PlaceholderApplied);
    }

    /// No source: only the placeholder is applied.
    pub(crate) fn complete_without_source(&self) {
        if self.token.is_cancelled() || !self.cell.transition(RequestTransition::NoSource) {
            return;
        }
        self.apply_placeholder();
        self.cell.publish();
    }

    /// Short-circuit or attach. Returns `true` when the fetch should start.
    pub(crate) fn attach(&self, source: &ImageSource) -> bool {
        if self.token.is_cancelled() {
            return false;
        }

        if !self.request.options.force && self.target.is_already_loaded(source) {
            if self.cell.transition(RequestTransition::ShortCircuit) {
                self.emit(&LoadEvent::AlreadyLoaded);
                self.cell.publish();
            }
            return false;
        }

        if !self.cell.transition(RequestTransition::Attach) {
            return false;
        }
        self.apply_placeholder();
        self.target.on_loading_started(source, &self.request);
        self.cell.publish();
        true
    }

    /// Deliver the fetch result, unless the request was cancelled first.
    pub(crate) fn finish(&self, source: &ImageSource, result: Result<Bitmap, LoadError>) {
        if self.token.is_cancelled() {
            return;
        }
        match result {
            Ok(bitmap) => {
                if !self.cell.transition(RequestTransition::Succeed) {
                    return;
                }
                self.emit(&LoadEvent::Loaded(bitmap.clone()));
                self.target
                    .on_loading_succeeded(source, &self.request, &bitmap);
            }
            Err(err) => {
                if !self.cell.transition(RequestTransition::Fail) {
                    return;
                }
                self.target.on_loading_failed(&err, &self.request);
                self.emit(&LoadEvent::Failed(err));
                self.apply_placeholder();
            }
        }
        self.cell.publish();
    }
}
