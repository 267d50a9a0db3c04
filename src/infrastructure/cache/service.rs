//! Cache service trait and error types.

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur during cache operations.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Cache connection error: {0}")]
    ConnectionError(String),
    #[error("Cache operation error: {0}")]
    OperationError(String),
}

/// Result type for cache operations.
pub type CacheResult<T> = Result<T, CacheError>;

/// Short code to long URL cache with per-entry expiry.
///
/// The cache is never authoritative. Callers treat every error as a miss and
/// fall through to the link store.
///
/// # Implementations
///
/// - [`crate::infrastructure::cache::RedisCache`] - Redis `SET EX` / `GET`
/// - [`crate::infrastructure::cache::NullCache`] - Always misses
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CacheService: Send + Sync {
    /// Returns the cached URL for `short_code`, or `None` if absent or expired.
    async fn get_url(&self, short_code: &str) -> CacheResult<Option<String>>;

    /// Stores `long_url` under `short_code`, replacing any previous entry and
    /// resetting its expiry to `ttl`.
    async fn set_url(&self, short_code: &str, long_url: &str, ttl: Duration) -> CacheResult<()>;

    /// Reports whether the backend answers.
    async fn health_check(&self) -> bool;
}
