/*
 * Responsibility
 * - GET /health (liveness)
 * - /api paths are always in the gate's scope, so this also exercises the gate
 */
use axum::{Json, http::StatusCode, response::IntoResponse};
use serde_json::json;

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok"})))
}
