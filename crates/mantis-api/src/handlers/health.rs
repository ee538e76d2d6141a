//! Liveness endpoint.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use tracing::warn;

use crate::AppState;

/// Reports liveness and whether the database answers a ping.
///
/// Returns 503 with `"database": "unreachable"` when the ping fails so load
/// balancers can drain the instance.
pub async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    match state.db.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "status": "healthy",
                "version": env!("CARGO_PKG_VERSION"),
                "database": "ok",
            })),
        ),
        Err(e) => {
            warn!(subsystem = "api", component = "health", error = %e, "Database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "status": "degraded",
                    "version": env!("CARGO_PKG_VERSION"),
                    "database": "unreachable",
                })),
            )
        }
    }
}
