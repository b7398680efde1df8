/*
 * Responsibility
 * - URL layout of /api/v1
 * - Admission is applied once for the whole app in app.rs, not per route
 */
use axum::{Router, routing::get};

use crate::api::v1::handlers::{health::health, user::current_user};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/user", get(current_user))
}
