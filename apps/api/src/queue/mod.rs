//! Dispatch side of the external work queue.
//!
//! The service only ever enqueues. Workers consuming the queue live in a
//! separate deployment and own every ledger transition after `PENDING`.

pub mod redis_list;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum QueueError {
    #[error("queue connection error: {0}")]
    Connection(String),

    #[error("queue command error: {0}")]
    Command(String),

    #[error("queue serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Retry and retention settings handed to the worker with every message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// First retry delay; doubles on each further attempt.
    pub backoff_delay_ms: u64,
    /// Finished entries retained per queue before the oldest are pruned.
    pub keep_completed: u32,
    pub keep_failed: u32,
}

impl Default for DispatchPolicy {
    fn default() -> Self {
        DispatchPolicy {
            attempts: 3,
            backoff_delay_ms: 5_000,
            keep_completed: 100,
            keep_failed: 500,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Backoff {
    #[serde(rename = "type")]
    pub kind: String,
    pub delay: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DispatchOptions {
    pub attempts: u32,
    pub backoff: Backoff,
    pub remove_on_complete: u32,
    pub remove_on_fail: u32,
}

impl From<DispatchPolicy> for DispatchOptions {
    fn from(policy: DispatchPolicy) -> Self {
        DispatchOptions {
            attempts: policy.attempts,
            backoff: Backoff {
                kind: "exponential".to_string(),
                delay: policy.backoff_delay_ms,
            },
            remove_on_complete: policy.keep_completed,
            remove_on_fail: policy.keep_failed,
        }
    }
}

/// Envelope pushed onto the queue. `id` is the ledger row the worker updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    pub id: Uuid,
    pub name: String,
    pub data: Value,
    pub opts: DispatchOptions,
    pub enqueued_at: DateTime<Utc>,
}

impl QueueMessage {
    pub fn new(id: Uuid, queue: &str, data: Value, policy: DispatchPolicy) -> Self {
        QueueMessage {
            id,
            name: queue.to_string(),
            data,
            opts: policy.into(),
            enqueued_at: Utc::now(),
        }
    }
}

/// Hands messages to the execution queue. Carried in `AppState` as
/// `Arc<dyn WorkQueue>`.
#[async_trait]
pub trait WorkQueue: Send + Sync {
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), QueueError>;
}
