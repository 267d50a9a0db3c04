//! Handler for health check endpoint.

use axum::{Json, extract::State, http::StatusCode};

use crate::api::dto::health::{CheckStatus, HealthChecks, HealthResponse};
use crate::state::AppState;

/// Returns service health status with component checks.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response Codes
///
/// - **200 OK**: All components healthy
/// - **503 Service Unavailable**: One or more components degraded
///
/// # Components Checked
///
/// 1. **Database**: `SELECT 1` on the link store
/// 2. **Cache**: Redis PING
/// 3. **Sequence**: PING on the ID sequence store
/// 4. **Click stream**: PING on the stream server (error when emission is disabled)
pub async fn health_handler(
    State(state): State<AppState>,
) -> Result<Json<HealthResponse>, (StatusCode, Json<HealthResponse>)> {
    let (database, cache, sequence, click_stream) = tokio::join!(
        check_database(&state),
        check_cache(&state),
        check_sequence(&state),
        check_click_stream(&state)
    );

    let all_healthy =
        database.is_ok() && cache.is_ok() && sequence.is_ok() && click_stream.is_ok();

    let response = HealthResponse {
        status: if all_healthy { "healthy" } else { "degraded" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            database,
            cache,
            sequence,
            click_stream,
        },
    };

    if all_healthy {
        Ok(Json(response))
    } else {
        Err((StatusCode::SERVICE_UNAVAILABLE, Json(response)))
    }
}

async fn check_database(state: &AppState) -> CheckStatus {
    if state.link_repository.health_check().await {
        CheckStatus::ok("Connected")
    } else {
        CheckStatus::error("Database unreachable")
    }
}

async fn check_cache(state: &AppState) -> CheckStatus {
    if state.cache.health_check().await {
        CheckStatus::ok("Redis connected")
    } else {
        CheckStatus::error("Cache unavailable")
    }
}

async fn check_sequence(state: &AppState) -> CheckStatus {
    if state.link_service.sequence_healthy().await {
        CheckStatus::ok("Redis connected")
    } else {
        CheckStatus::error("ID sequence unreachable")
    }
}

async fn check_click_stream(state: &AppState) -> CheckStatus {
    if !state.click_emitter.is_enabled() {
        return CheckStatus::error("Click emission disabled");
    }

    if state.click_emitter.health_check().await {
        CheckStatus::ok("Stream connected")
    } else {
        CheckStatus::error("Stream unreachable")
    }
}
