//! Handler for short URL redirect.

use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header},
    response::IntoResponse,
};

use crate::domain::click_event::ClickEvent;
use crate::error::AppError;
use crate::state::AppState;

/// Redirects a short code to its long URL.
///
/// # Endpoint
///
/// `GET /{code}`
///
/// # Request Flow
///
/// 1. Resolve the code through the cache, falling back to the link store
/// 2. Emit a click event on a detached task
/// 3. Return 302 Found
///
/// The click is emitted only for codes that resolve. Emission never delays
/// or fails the redirect.
///
/// # Errors
///
/// Returns 400 if the code is not a base62 token and 404 if it is unknown.
pub async fn redirect_handler(
    Path(code): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, AppError> {
    let long_url = state.link_service.resolve(&code).await?;

    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok());
    state.click_emitter.emit(ClickEvent::new(code, user_agent));

    Ok((StatusCode::FOUND, [(header::LOCATION, long_url)]))
}
