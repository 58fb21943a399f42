//! Object storage for uploaded resume files.

pub mod s3;

#[cfg(test)]
pub mod memory;

use async_trait::async_trait;
use bytes::Bytes;

use crate::errors::AppError;

#[async_trait]
pub trait ResumeStorage: Send + Sync {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str)
        -> Result<(), AppError>;

    /// Removes an object. Deleting a key that does not exist is not an error.
    async fn delete_object(&self, key: &str) -> Result<(), AppError>;
}
