//! Health check endpoints.

use axum::Json;
use serde_json::{Value, json};

/// Liveness probe: the process is up.
pub async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

/// Readiness probe: the process can serve traffic.
pub async fn readiness_check() -> Json<Value> {
    Json(json!({ "status": "ready" }))
}
