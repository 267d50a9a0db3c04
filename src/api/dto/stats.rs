//! DTOs for click statistics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::entities::ClickCounter;

/// Aggregated clicks of one short code.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    pub short_code: String,
    pub click_count: i64,
    pub last_clicked_at: DateTime<Utc>,
}

impl From<ClickCounter> for StatsResponse {
    fn from(counter: ClickCounter) -> Self {
        Self {
            short_code: counter.code,
            click_count: counter.click_count,
            last_clicked_at: counter.last_clicked_at,
        }
    }
}
