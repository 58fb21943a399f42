use std::num::NonZeroU64;
use std::str::FromStr;

use anyhow::{Context, Result};

use crate::queue::DispatchPolicy;

/// Application configuration loaded from environment variables.
/// Fails at startup if required variables are missing.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub redis_url: String,
    pub s3_bucket: String,
    pub s3_endpoint: String,
    pub aws_access_key_id: String,
    pub aws_secret_access_key: String,
    pub jwt_secret: String,
    pub port: u16,
    pub rust_log: String,
    /// Logical queue name written into every ledger row and queue key.
    pub queue_name: String,
    pub dispatch: DispatchPolicy,
    pub retention_sweep_secs: u64,
    pub max_batch_files: usize,
    pub max_upload_bytes: usize,
    /// Ledger rows with no organization are visible to every tenant while true.
    pub legacy_unscoped_visible: bool,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Ok(Config {
            database_url: require_env("DATABASE_URL")?,
            database_max_connections: env_or("DATABASE_MAX_CONNECTIONS", 10)?,
            redis_url: require_env("REDIS_URL")?,
            s3_bucket: require_env("S3_BUCKET")?,
            s3_endpoint: require_env("S3_ENDPOINT")?,
            aws_access_key_id: require_env("AWS_ACCESS_KEY_ID")?,
            aws_secret_access_key: require_env("AWS_SECRET_ACCESS_KEY")?,
            jwt_secret: require_env("JWT_SECRET")?,
            port: env_or("PORT", 8080)?,
            rust_log: std::env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string()),
            queue_name: std::env::var("QUEUE_NAME")
                .unwrap_or_else(|_| "resume-processing".to_string()),
            dispatch: DispatchPolicy {
                attempts: env_or("QUEUE_ATTEMPTS", 3)?,
                backoff_delay_ms: env_or("QUEUE_BACKOFF_DELAY_MS", 5_000)?,
                keep_completed: env_or("QUEUE_KEEP_COMPLETED", 100)?,
                keep_failed: env_or("QUEUE_KEEP_FAILED", 500)?,
            },
            retention_sweep_secs: positive_env_or("RETENTION_SWEEP_SECS", 300)?,
            max_batch_files: env_or("MAX_BATCH_FILES", 200)?,
            max_upload_bytes: env_or("MAX_UPLOAD_BYTES", 100 * 1024 * 1024)?,
            legacy_unscoped_visible: env_or("LEGACY_UNSCOPED_VISIBLE", true)?,
        })
    }
}

fn require_env(key: &str) -> Result<String> {
    std::env::var(key).with_context(|| format!("Required environment variable '{key}' is not set"))
}

fn env_or<T>(key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .with_context(|| format!("Environment variable '{key}' has an invalid value: {raw}")),
        Err(_) => Ok(default),
    }
}

/// Like [`env_or`], but zero is rejected.
fn positive_env_or(key: &str, default: u64) -> Result<u64> {
    match std::env::var(key) {
        Ok(raw) => raw
            .trim()
            .parse::<NonZeroU64>()
            .map(NonZeroU64::get)
            .with_context(|| {
                format!("Environment variable '{key}' must be a positive integer: {raw}")
            }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
impl Config {
    pub fn for_tests() -> Self {
        Config {
            database_url: "postgres://localhost/carrix_test".to_string(),
            database_max_connections: 2,
            redis_url: "redis://localhost:6379".to_string(),
            s3_bucket: "carrix-test".to_string(),
            s3_endpoint: "http://localhost:9000".to_string(),
            aws_access_key_id: "test".to_string(),
            aws_secret_access_key: "test".to_string(),
            jwt_secret: "test-secret".to_string(),
            port: 8080,
            rust_log: "debug".to_string(),
            queue_name: "resume-processing".to_string(),
            dispatch: DispatchPolicy::default(),
            retention_sweep_secs: 300,
            max_batch_files: 5,
            max_upload_bytes: 10 * 1024 * 1024,
            legacy_unscoped_visible: true,
        }
    }
}
