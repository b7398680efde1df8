/*
 * Responsibility
 * - Browser-facing pages behind the admission gate
 * - Markup stays minimal; sign-in/sign-up UI is hosted by the identity provider
 */
mod handlers;

use axum::{Router, routing::get};

use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::home))
        .route("/dashboard", get(handlers::dashboard))
        .route("/admin", get(handlers::admin))
        .route("/admin/{*rest}", get(handlers::admin))
        .route("/example", get(handlers::example))
        .route("/session-tasks", get(handlers::session_tasks))
}
