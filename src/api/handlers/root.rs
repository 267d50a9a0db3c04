//! Liveness banner.

/// `GET /`
pub async fn root_handler() -> &'static str {
    "NanoLink URL shortener is running"
}
