//! DTOs for the link shortening endpoint.

use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to shorten a URL.
///
/// The URL is stored as given; only emptiness is rejected.
#[derive(Debug, Deserialize, Validate)]
pub struct ShortenRequest {
    #[serde(alias = "url")]
    #[validate(length(min = 1, message = "long_url must not be empty"))]
    pub long_url: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ShortenResponse {
    pub short_code: String,
    pub short_url: String,
}
