use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;
use tracing::{debug, error};

use super::{QueueError, QueueMessage, WorkQueue};

const KEY_PREFIX: &str = "carrix:queue";

/// Queue backed by a Redis list. Messages are `LPUSH`ed onto
/// `carrix:queue:{name}:wait`; workers pop from the other end.
///
/// Holds one multiplexed connection for the life of the process; the
/// manager reconnects on its own after a dropped link.
#[derive(Clone)]
pub struct RedisWorkQueue {
    connection: ConnectionManager,
}

impl RedisWorkQueue {
    /// Opens the shared connection and checks it with a `PING`.
    pub async fn connect(redis_url: &str) -> Result<Self, QueueError> {
        let client = redis::Client::open(redis_url).map_err(|e| {
            error!("Invalid Redis URL: {e}");
            QueueError::Connection(e.to_string())
        })?;

        let connection = ConnectionManager::new(client).await.map_err(|e| {
            error!("Failed to create Redis connection manager: {e}");
            QueueError::Connection(e.to_string())
        })?;

        let mut conn = connection.clone();
        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await
            .map_err(|e| QueueError::Connection(e.to_string()))?;

        Ok(Self { connection })
    }
}

pub fn wait_key(queue: &str) -> String {
    format!("{KEY_PREFIX}:{queue}:wait")
}

#[async_trait]
impl WorkQueue for RedisWorkQueue {
    async fn enqueue(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let body = serde_json::to_string(message)?;

        let mut conn = self.connection.clone();
        let key = wait_key(&message.name);
        let depth: u64 = conn
            .lpush(&key, body)
            .await
            .map_err(|e| QueueError::Command(e.to_string()))?;

        debug!(queue_job_id = %message.id, %key, depth, "Enqueued work");
        Ok(())
    }
}
