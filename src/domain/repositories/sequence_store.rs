//! Shared counter used to reserve ID blocks.

use crate::error::AppError;
use async_trait::async_trait;

/// A counter shared by every allocator in the deployment.
///
/// # Implementations
///
/// - [`crate::infrastructure::sequence::RedisSequenceStore`] - Redis `INCRBY`
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SequenceStore: Send + Sync {
    /// Atomically adds `delta` to the counter at `key` and returns the value
    /// after the increment. A missing counter starts at zero.
    ///
    /// The increment either fully applies or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Allocation`] if the store is unreachable or the
    /// counter holds a value that is not a non-negative integer.
    async fn increment_by(&self, key: &str, delta: u64) -> Result<u64, AppError>;

    /// Checks that the store answers commands.
    async fn health_check(&self) -> bool;
}
