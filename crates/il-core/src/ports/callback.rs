/// A unit of work run on the callback context.
pub type CallbackTask = Box<dyn FnOnce() + Send + 'static>;

/// Single serialized execution context for target and listener callbacks.
///
/// Tasks posted from any thread run one at a time, in posting order.
///
/// 所有回调在同一个串行上下文中按提交顺序执行。
pub trait CallbackContextPort: Send + Sync {
    fn post(&self, task: CallbackTask);
}
