mod callback_queue;

pub use callback_queue::SerialCallbackQueue;
