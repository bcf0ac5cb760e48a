use crate::bitmap::Bitmap;
use crate::error::LoadError;
use crate::request::{LoadRequest, PlaceholderId};
use crate::source::ImageSource;

/// Receiver of a load's lifecycle hooks.
///
/// All hooks run on the loader's callback context, never concurrently.
/// Only `on_loading_succeeded` is required.
///
/// 加载目标：接收加载生命周期回调，均在回调上下文中串行执行。
pub trait LoadTarget: Send + Sync {
    fn on_loading_started(&self, _source: &ImageSource, _request: &LoadRequest) {}

    fn on_loading_succeeded(&self, source: &ImageSource, request: &LoadRequest, bitmap: &Bitmap);

    fn on_loading_failed(&self, _error: &LoadError, _request: &LoadRequest) {}

    fn set_placeholder(&self, _placeholder: PlaceholderId) {}

    /// `true` if the target already displays `source`; such loads are
    /// skipped unless forced.
    fn is_already_loaded(&self, _source: &ImageSource) -> bool {
        false
    }

    /// Drop whatever the target currently shows.
    fn clear(&self) {}
}
