//! Link entity representing a shortened URL mapping.

use chrono::{DateTime, Utc};

/// A shortened URL.
///
/// Links are immutable once created. `code` is always the base62 encoding of
/// `id`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Link {
    pub id: u64,
    pub code: String,
    pub long_url: String,
    pub created_at: DateTime<Utc>,
}

impl Link {
    /// Creates a new Link instance.
    pub fn new(id: u64, code: String, long_url: String, created_at: DateTime<Utc>) -> Self {
        Self {
            id,
            code,
            long_url,
            created_at,
        }
    }
}

/// Input data for creating a new link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLink {
    pub id: u64,
    pub code: String,
    pub long_url: String,
}
