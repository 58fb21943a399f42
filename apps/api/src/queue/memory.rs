use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{QueueError, QueueMessage, WorkQueue};

/// In-process queue for tests. Can be switched into an "unreachable" mode.
#[derive(Default)]
pub struct MemoryWorkQueue {
    messages: Mutex<Vec<QueueMessage>>,
    unreachable: AtomicBool,
}

impl MemoryWorkQueue {
    pub fn unreachable() -> Self {
        let queue = Self::default();
        queue.unreachable.store(true, Ordering::SeqCst);
        queue
    }

    pub fn messages(&self) -> Vec<QueueMessage> {
        self.messages.lock().unwrap().clone()
    }
}

#[async_trait]
impl WorkQueue for MemoryWorkQueue {
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), QueueError> {
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(QueueError::Connection("connection refused".to_string()));
        }
        self.messages.lock().unwrap().push(message.clone());
        Ok(())
    }
}
