//! Request controller: builds requests, runs them and delivers their events.
//! 请求控制器：构建请求、调度执行并投递事件。

mod delivery;

use std::sync::Arc;

use il_core::ports::{CallbackContextPort, LoadTarget};
use il_core::{
    FetchEvent, ImageSource, LoadEvent, LoadOptions, LoadRequest, PlaceholderId, RequestState,
    TargetSize,
};
use tokio::runtime::Handle;
use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info_span, warn, Instrument};

use crate::engine::{EventEmitter, FetchEngine};
use crate::preload::PreloadTarget;
use delivery::{Delivery, RequestCell};

/// Observer of every event of one request, called on the callback context.
pub type LoadListener = Arc<dyn Fn(&LoadEvent) + Send + Sync>;

/// Entry point for loading images into targets.
///
/// Fetches run as tokio tasks on the runtime that was current when the
/// loader was built; every target hook and listener call is posted to the
/// callback context.
#[derive(Clone)]
pub struct ImageLoader {
    engine: Arc<FetchEngine>,
    callbacks: Arc<dyn CallbackContextPort>,
    limiter: Option<Arc<Semaphore>>,
    preload_target: Arc<PreloadTarget>,
    runtime: Handle,
}

impl ImageLoader {
    /// Must be called from within a tokio runtime.
    pub fn new(engine: Arc<FetchEngine>, callbacks: Arc<dyn CallbackContextPort>) -> Self {
        Self {
            engine,
            callbacks,
            limiter: None,
            preload_target: Arc::new(PreloadTarget::new()),
            runtime: Handle::current(),
        }
    }

    /// Bound the number of fetches running at once. `0` means unbounded.
    pub fn with_max_concurrent_fetches(mut self, max: usize) -> Self {
        self.limiter = (max > 0).then(|| Arc::new(Semaphore::new(max)));
        self
    }

    pub fn load(&self, source: impl Into<ImageSource>) -> LoadRequestBuilder {
        self.load_optional(Some(source.into()))
    }

    /// A request without a source only applies the placeholder.
    pub fn load_optional(&self, source: Option<ImageSource>) -> LoadRequestBuilder {
        LoadRequestBuilder {
            loader: self.clone(),
            source,
            options: LoadOptions::default(),
            listener: None,
        }
    }

    /// Clear `target` on the callback context.
    pub fn clear_target(&self, target: Arc<dyn LoadTarget>) {
        self.callbacks.post(Box::new(move || target.clear()));
    }

    /// The shared target used by [`LoadRequestBuilder::preload`].
    pub fn preload_target(&self) -> &Arc<PreloadTarget> {
        &self.preload_target
    }

    pub fn engine(&self) -> &Arc<FetchEngine> {
        &self.engine
    }

    fn submit(&self, delivery: Delivery) {
        let Some(source) = delivery.request.source.clone() else {
            self.callbacks
                .post(Box::new(move || delivery.complete_without_source()));
            return;
        };

        let loader = self.clone();
        self.callbacks.post(Box::new(move || {
            if !delivery.attach(&source) {
                return;
            }
            let span = info_span!(
                "loader.request",
                request_id = %delivery.request.id,
                source = %source,
            );
            let worker = loader.clone().run(delivery, source);
            loader.runtime.spawn(worker.instrument(span));
        }));
    }

    async fn run(self, delivery: Delivery, source: ImageSource) {
        let _permit = match &self.limiter {
            Some(limiter) => tokio::select! {
                biased;
                _ = delivery.token.cancelled() => return,
                permit = limiter.clone().acquire_owned() => permit.ok(),
            },
            None => None,
        };

        let emitter = EventEmitter::new(delivery.token.clone(), self.event_sink(&delivery));
        let result = tokio::select! {
            biased;
            _ = delivery.token.cancelled() => return,
            result = self.engine.fetch(&source, &delivery.request.options, &emitter) => result,
        };
        if delivery.token.is_cancelled() {
            debug!("Cancelled, dropping result");
            return;
        }

        match &result {
            Ok(bitmap) => debug!(width = bitmap.width(), height = bitmap.height(), "Loaded"),
            Err(err) => warn!(error = %err, "Load failed"),
        }
        self.callbacks
            .post(Box::new(move || delivery.finish(&source, result)));
    }

    /// Forward engine events to the listener through the callback context.
    fn event_sink(&self, delivery: &Delivery) -> impl Fn(FetchEvent) + Send + Sync + 'static {
        let callbacks = self.callbacks.clone();
        let delivery = delivery.clone();
        move |event| {
            let delivery = delivery.clone();
            callbacks.post(Box::new(move || {
                if delivery.is_live() {
                    delivery.emit(&LoadEvent::from(event));
                }
            }));
        }
    }
}

/// Options for one load, consumed by [`into_target`](Self::into_target) or
/// [`preload`](Self::preload).
pub struct LoadRequestBuilder {
    loader: ImageLoader,
    source: Option<ImageSource>,
    options: LoadOptions,
    listener: Option<LoadListener>,
}

impl LoadRequestBuilder {
    pub fn target_size(mut self, width: u32, height: u32) -> Self {
        self.options.target_size = Some(TargetSize::new(width, height));
        self
    }

    pub fn use_memory_cache(mut self, enabled: bool) -> Self {
        self.options.use_memory_cache = enabled;
        self
    }

    pub fn with_etag(mut self, enabled: bool) -> Self {
        self.options.with_etag = enabled;
        self
    }

    pub fn force(mut self, enabled: bool) -> Self {
        self.options.force = enabled;
        self
    }

    pub fn placeholder(mut self, placeholder: PlaceholderId) -> Self {
        self.options.placeholder = Some(placeholder);
        self
    }

    pub fn listener(mut self, listener: impl Fn(&LoadEvent) + Send + Sync + 'static) -> Self {
        self.listener = Some(Arc::new(listener));
        self
    }

    /// The request as it would be submitted, with a fresh id.
    pub fn build(&self) -> LoadRequest {
        LoadRequest::new(self.source.clone(), self.options.clone())
    }

    /// Submit the request against `target`.
    pub fn into_target(self, target: Arc<dyn LoadTarget>) -> LoadHandle {
        let request = Arc::new(self.build());
        let token = CancellationToken::new();
        let cell = Arc::new(RequestCell::new());
        debug!(
            request_id = %request.id,
            has_source = request.source.is_some(),
            "Submitting request"
        );

        self.loader.submit(Delivery {
            request: request.clone(),
            target,
            listener: self.listener,
            token: token.clone(),
            cell: cell.clone(),
        });

        LoadHandle {
            request,
            token,
            cell,
        }
    }

    /// Load into the loader's shared [`PreloadTarget`].
    pub fn preload(self) -> LoadHandle {
        let target: Arc<dyn LoadTarget> = self.loader.preload_target.clone();
        self.into_target(target)
    }
}

/// Handle to a submitted request.
#[derive(Clone)]
pub struct LoadHandle {
    request: Arc<LoadRequest>,
    token: CancellationToken,
    cell: Arc<RequestCell>,
}

impl LoadHandle {
    pub fn request(&self) -> &LoadRequest {
        &self.request
    }

    pub fn state(&self) -> RequestState {
        self.cell.current()
    }

    /// Cancel the request. Returns `false` if it already reached a terminal
    /// state; no terminal event is delivered after a successful cancel.
    pub fn cancel(&self) -> bool {
        let cancelled = self.cell.transition(il_core::RequestTransition::Cancel);
        self.token.cancel();
        if cancelled {
            debug!(request_id = %self.request.id, "Request cancelled");
            self.cell.publish();
        }
        cancelled
    }

    /// Wait until the request is terminal and its hooks have run.
    pub async fn wait(&self) -> RequestState {
        let mut rx = self.cell.subscribe();
        let state = match rx.wait_for(RequestState::is_terminal).await {
            Ok(state) => *state,
            Err(_) => self.cell.current(),
        };
        state
    }
}
