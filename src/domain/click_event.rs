//! Click event model for asynchronous click tracking.

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A resolved click, published to the click stream as JSON.
///
/// # Wire Format
///
/// ```json
/// {"short_code": "ba", "timestamp": 1760870000, "user_agent": "Mozilla/5.0"}
/// ```
///
/// `timestamp` is in unix seconds. A missing `User-Agent` header is sent as an
/// empty string.
///
/// # Usage Flow
///
/// 1. Created in the redirect handler once the target URL is known
/// 2. Handed to [`crate::domain::click_emitter::ClickEmitter`], which publishes
///    it on a detached task
/// 3. Consumed by [`crate::domain::click_worker::ClickAggregator`] and folded
///    into a [`crate::domain::entities::ClickCounter`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClickEvent {
    pub short_code: String,
    pub timestamp: i64,
    #[serde(default)]
    pub user_agent: String,
}

impl ClickEvent {
    /// Creates an event stamped with the current time.
    pub fn new(short_code: String, user_agent: Option<&str>) -> Self {
        Self {
            short_code,
            timestamp: Utc::now().timestamp(),
            user_agent: user_agent.unwrap_or_default().to_string(),
        }
    }

    /// Serializes the event into its stream payload.
    pub fn to_payload(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Parses a stream payload.
    pub fn from_payload(payload: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(payload)
    }
}
