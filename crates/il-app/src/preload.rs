//! Target that only records which sources have been loaded.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use il_core::ports::LoadTarget;
use il_core::{Bitmap, ImageSource, LoadError, LoadRequest};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreloadStatus {
    Loading,
    Loaded,
}

/// Shared target behind [`crate::LoadRequestBuilder::preload`].
///
/// Warms the caches without displaying anything. A source that loaded once
/// is reported as already loaded, so preloading it again is a no-op unless
/// forced; a failed source is forgotten and may be retried.
///
/// 预加载目标：记录加载状态，失败的来源会被移除。
#[derive(Debug, Default)]
pub struct PreloadTarget {
    entries: Mutex<HashMap<ImageSource, PreloadStatus>>,
}

impl PreloadTarget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn status(&self, source: &ImageSource) -> Option<PreloadStatus> {
        self.entries().get(source).copied()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<ImageSource, PreloadStatus>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl LoadTarget for PreloadTarget {
    fn on_loading_started(&self, source: &ImageSource, _request: &LoadRequest) {
        self.entries().insert(source.clone(), PreloadStatus::Loading);
    }

    fn on_loading_succeeded(&self, source: &ImageSource, _request: &LoadRequest, _bitmap: &Bitmap) {
        self.entries().insert(source.clone(), PreloadStatus::Loaded);
    }

    fn on_loading_failed(&self, _error: &LoadError, request: &LoadRequest) {
        if let Some(source) = &request.source {
            self.entries().remove(source);
        }
    }

    fn is_already_loaded(&self, source: &ImageSource) -> bool {
        self.status(source) == Some(PreloadStatus::Loaded)
    }
}
