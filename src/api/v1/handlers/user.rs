/*
 * Responsibility
 * - GET /user: the signed-in user's session as JSON
 * - 401 when signed out (the gate leaves /api paths unprotected by default,
 *   so the handler answers for itself)
 */
use axum::Json;

use crate::api::v1::{dto::user::UserResponse, extractors::CurrentSession};

pub async fn current_user(CurrentSession(session): CurrentSession) -> Json<UserResponse> {
    tracing::debug!(session_id = %session.session_id, "serving current user");
    Json(session.into())
}
