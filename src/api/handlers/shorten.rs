//! Handler for link shortening endpoint.

use axum::{Json, extract::State};
use validator::Validate;

use crate::api::dto::shorten::{ShortenRequest, ShortenResponse};
use crate::error::AppError;
use crate::state::AppState;

/// Creates a short link.
///
/// # Endpoint
///
/// `POST /shorten` (also served at `/api/shorten`)
///
/// # Request Body
///
/// ```json
/// { "long_url": "https://example.com/page" }
/// ```
///
/// `url` is accepted as an alias of `long_url`.
///
/// # Response
///
/// ```json
/// { "short_code": "b", "short_url": "http://localhost:8080/b" }
/// ```
///
/// # Errors
///
/// Returns 400 if `long_url` is empty, 503 if no ID can be allocated, and
/// 500 if the link cannot be stored.
pub async fn shorten_handler(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<Json<ShortenResponse>, AppError> {
    payload.validate()?;

    let link = state.link_service.create_short_link(payload.long_url).await?;
    let short_url = state.link_service.get_short_url(&state.base_url, &link.code);

    Ok(Json(ShortenResponse {
        short_code: link.code,
        short_url,
    }))
}
