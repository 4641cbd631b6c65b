use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::{Value, json};

use crate::server::AppState;

/// Health check endpoint handler.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/ping`
/// - **Response**: `{"status":"pong"}`
///
/// Unauthenticated; used by load balancers and uptime probes to verify the
/// service is alive.
pub async fn ping() -> Json<Value> {
    Json(json!({ "status": "pong" }))
}

/// Database-backed health check.
///
/// # Route
/// - **Method**: GET
/// - **Path**: `/health`
///
/// Runs a trivial query against the pool and reports its counters; a failed
/// probe answers 503 so orchestrators can take the instance out of rotation.
pub async fn health(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.db.health_check().await {
        Ok(()) => {
            let stats = state.db.stats();
            (
                StatusCode::OK,
                Json(json!({
                    "status": "ok",
                    "database": "up",
                    "pool": { "size": stats.size, "idle": stats.idle },
                })),
            )
        }
        Err(e) => {
            tracing::error!("❌ Health check failed: {e:#}");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "degraded", "database": "down" })),
            )
        }
    }
}
