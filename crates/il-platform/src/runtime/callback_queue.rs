use std::panic::{catch_unwind, AssertUnwindSafe};

use il_core::ports::{CallbackContextPort, CallbackTask};
use tokio::sync::{mpsc, oneshot};
use tracing::{error, warn};

/// Serial callback context: one task drains a queue in posting order.
///
/// A panicking callback is logged and does not stop the queue.
///
/// 串行回调队列：单个任务按提交顺序执行回调。
#[derive(Clone)]
pub struct SerialCallbackQueue {
    tx: mpsc::UnboundedSender<CallbackTask>,
}

impl SerialCallbackQueue {
    /// Start the queue on the current tokio runtime.
    pub fn spawn() -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<CallbackTask>();

        tokio::spawn(async move {
            while let Some(task) = rx.recv().await {
                if catch_unwind(AssertUnwindSafe(task)).is_err() {
                    error!("Callback panicked on the callback queue");
                }
            }
        });

        Self { tx }
    }

    /// Resolve once every task posted before this call has run.
    pub async fn flush(&self) {
        let (done_tx, done_rx) = oneshot::channel();
        self.post(Box::new(move || {
            let _ = done_tx.send(());
        }));
        let _ = done_rx.await;
    }
}

impl CallbackContextPort for SerialCallbackQueue {
    fn post(&self, task: CallbackTask) {
        if self.tx.send(task).is_err() {
            warn!("Callback queue is closed, dropping callback");
        }
    }
}
