//! Click statistics read service.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::entities::ClickCounter;
use crate::domain::repositories::ClickCounterRepository;
use crate::error::AppError;
use crate::utils::base62;
use crate::utils::deadline::with_deadline;
use serde_json::json;

/// Service for reading the counters maintained by the analytics worker.
///
/// Counters are eventually consistent with redirects: a click shows up only
/// after the worker has consumed its event.
pub struct StatsService {
    counters: Arc<dyn ClickCounterRepository>,
    store_timeout: Duration,
}

impl StatsService {
    /// Creates a new statistics service.
    pub fn new(counters: Arc<dyn ClickCounterRepository>, store_timeout: Duration) -> Self {
        Self {
            counters,
            store_timeout,
        }
    }

    /// Retrieves the click counter for a short code.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidToken`] if `code` is not a base62 token.
    /// Returns [`AppError::NotFound`] if the code has never been clicked.
    /// Returns [`AppError::Internal`] or [`AppError::Timeout`] on store errors.
    pub async fn get_click_counter(&self, code: &str) -> Result<ClickCounter, AppError> {
        base62::decode(code)?;

        with_deadline(
            self.store_timeout,
            "click counter lookup",
            self.counters.find_by_code(code),
        )
        .await?
        .ok_or_else(|| AppError::not_found("Statistics not found", json!({ "code": code })))
    }
}
