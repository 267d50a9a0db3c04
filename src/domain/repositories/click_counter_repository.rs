//! Repository trait for aggregated click statistics.

use crate::domain::entities::ClickCounter;
use crate::error::AppError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Analytics storage for per-code click counters.
///
/// # Implementations
///
/// - [`crate::infrastructure::persistence::PgClickCounterRepository`] - PostgreSQL implementation
/// - Test mocks available with `cfg(test)`
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ClickCounterRepository: Send + Sync {
    /// Adds one click to `code` and sets its last click time, creating the
    /// counter on first use.
    ///
    /// Each call contributes exactly one click; replays are not deduplicated.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::StoreWrite`] if the upsert fails.
    async fn record_click(&self, code: &str, clicked_at: DateTime<Utc>) -> Result<(), AppError>;

    /// Reads the counter for `code`.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Internal`] on database errors.
    async fn find_by_code(&self, code: &str) -> Result<Option<ClickCounter>, AppError>;
}
