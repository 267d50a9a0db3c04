//! Aggregated click statistics for a short code.

use chrono::{DateTime, Utc};

/// Click totals maintained by the analytics worker.
///
/// `click_count` never decreases. `last_clicked_at` holds the timestamp of
/// the most recently applied event, which is not necessarily the latest one
/// when events arrive out of order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClickCounter {
    pub code: String,
    pub click_count: i64,
    pub last_clicked_at: DateTime<Utc>,
}

impl ClickCounter {
    /// Creates a new ClickCounter instance.
    pub fn new(code: String, click_count: i64, last_clicked_at: DateTime<Utc>) -> Self {
        Self {
            code,
            click_count,
            last_clicked_at,
        }
    }
}
