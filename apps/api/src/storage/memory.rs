use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::ResumeStorage;
use crate::errors::AppError;

/// In-process object store for tests. Puts can be made to fail after a
/// fixed number of successful writes.
pub struct MemoryResumeStorage {
    objects: Mutex<HashMap<String, Bytes>>,
    puts_left: AtomicUsize,
}

impl Default for MemoryResumeStorage {
    fn default() -> Self {
        Self {
            objects: Mutex::new(HashMap::new()),
            puts_left: AtomicUsize::new(usize::MAX),
        }
    }
}

impl MemoryResumeStorage {
    /// Accepts `count` puts, then rejects every further one.
    pub fn failing_after(count: usize) -> Self {
        let storage = Self::default();
        storage.puts_left.store(count, Ordering::SeqCst);
        storage
    }

    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<_> = self.objects.lock().unwrap().keys().cloned().collect();
        keys.sort();
        keys
    }
}

#[async_trait]
impl ResumeStorage for MemoryResumeStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        _content_type: &str,
    ) -> Result<(), AppError> {
        let accepted = self
            .puts_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |left| left.checked_sub(1))
            .is_ok();
        if !accepted {
            return Err(AppError::Storage(format!("bucket unavailable for {key}")));
        }
        self.objects.lock().unwrap().insert(key.to_string(), body);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }
}
