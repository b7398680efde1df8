//! Transport-level layers shared by every route.
//!
//! These sit outside the admission gate, so they also apply to requests the
//! gate redirects or rejects.
//!
//! Responsibility:
//! - `x-request-id`: generated when absent, echoed on the response
//! - Access log via `TraceLayer`
//! - Request body limit
//! - Overall request timeout
//!
//! Notes:
//! - Limit and timeout come from `HttpConfig` (`REQUEST_BODY_LIMIT_BYTES`,
//!   `REQUEST_TIMEOUT_SECONDS`).
//! - The session lookup has its own, shorter timeout in the identity adapter;
//!   this one only bounds the request as a whole.

use axum::Router;
use axum::error_handling::HandleErrorLayer;
use axum::http::{StatusCode, header::HeaderName};
use tower::timeout::TimeoutLayer;
use tower::{BoxError, ServiceBuilder};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use crate::config::HttpConfig;

const REQUEST_ID_HEADER: &str = "x-request-id";

/// Apply transport middleware to the fully assembled Router.
pub fn apply(router: Router, config: &HttpConfig) -> Router {
    let request_id = HeaderName::from_static(REQUEST_ID_HEADER);

    let layers = ServiceBuilder::new()
        // Router::layer needs an `Infallible` service; TimeoutLayer errors become status codes.
        .layer(HandleErrorLayer::new(|err: BoxError| async move {
            if err.is::<tower::timeout::error::Elapsed>() {
                tracing::warn!("request timed out");
                StatusCode::REQUEST_TIMEOUT
            } else {
                tracing::error!(error = %err, "unhandled middleware error");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }))
        // Set before tracing so the access log and the gate's logs share the id.
        .layer(SetRequestIdLayer::new(request_id.clone(), MakeRequestUuid))
        .layer(PropagateRequestIdLayer::new(request_id))
        // Pages and the API only take small bodies.
        .layer(RequestBodyLimitLayer::new(config.body_limit_bytes))
        // Bounds slow clients and a stalled session store alike.
        .layer(TimeoutLayer::new(config.request_timeout))
        // Access log for every request, admitted or not.
        .layer(TraceLayer::new_for_http());

    router.layer(layers)
}
