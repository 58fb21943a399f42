use async_trait::async_trait;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::ResumeStorage;
use crate::config::Config;
use crate::errors::AppError;

#[derive(Clone)]
pub struct S3ResumeStorage {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3ResumeStorage {
    /// Client configured for MinIO (local) or AWS (production).
    pub async fn from_config(config: &Config) -> Self {
        let credentials = Credentials::new(
            &config.aws_access_key_id,
            &config.aws_secret_access_key,
            None,
            None,
            "carrix-static",
        );

        let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(&config.s3_endpoint)
            .load()
            .await;

        Self {
            client: aws_sdk_s3::Client::new(&s3_config),
            bucket: config.s3_bucket.clone(),
        }
    }
}

#[async_trait]
impl ResumeStorage for S3ResumeStorage {
    async fn put_object(
        &self,
        key: &str,
        body: Bytes,
        content_type: &str,
    ) -> Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 upload failed: {e}")))?;

        info!("Uploaded s3://{}/{}", self.bucket, key);
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> Result<(), AppError> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| AppError::Storage(format!("S3 delete failed: {e}")))?;

        info!("Deleted s3://{}/{}", self.bucket, key);
        Ok(())
    }
}
