//! Admission gate as axum middleware.
//!
//! Every request passes through here before routing reaches a handler:
//! 1. out-of-scope paths (static assets etc.) go straight through, no session lookup
//! 2. otherwise the session is resolved via the identity collaborator
//! 3. the gate decides; the resolved session is handed to handlers via extensions

use axum::{
    Router,
    body::Body,
    extract::State,
    http::Request,
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
};

use crate::error::AppError;
use crate::services::admission::{Decision, RequestDescriptor};
use crate::state::AppState;

/// Put the gate in front of every route (and the fallback) of `router`.
pub fn apply(router: Router<AppState>, state: AppState) -> Router<AppState> {
    router.layer(middleware::from_fn_with_state(state, admission_middleware))
}

async fn admission_middleware(
    State(state): State<AppState>,
    mut req: Request<Body>,
    next: Next,
) -> Response {
    if !state.gate.in_scope(req.uri().path()) {
        return next.run(req).await;
    }

    let lookup = state.identity.resolve_session(req.headers()).await;

    let decision = state
        .gate
        .evaluate(&RequestDescriptor::from_uri(req.uri()), &lookup);

    match decision {
        Decision::Continue => {
            if let Ok(Some(session)) = lookup {
                // middleware → extractor handoff
                req.extensions_mut().insert(session);
            }
            next.run(req).await
        }
        Decision::Redirect(target) => Redirect::temporary(&target).into_response(),
        Decision::Reject(rejection) => AppError::from(rejection).into_response(),
    }
}
