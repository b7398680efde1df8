//! CORS for browser clients of the `/api` surface.
//!
//! Note:
//! - CORS is enforced by browsers only. It is not an access control; admission
//!   is decided by the gate whatever the origin.
//! - Applied at the Router level, outside the gate, so preflight responses carry
//!   the headers even when the gate would redirect the real request.
//!
//! Policy:
//! - Development: any origin, WITHOUT credentials.
//! - Production: exact-match allow-list from `CORS_ALLOWED_ORIGINS`, WITHOUT credentials.

use std::time::Duration;

use axum::Router;
use axum::http::{HeaderName, HeaderValue, Method, header};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::Config;

/// Apply the CORS policy to the given Router.
///
/// IMPORTANT:
/// - Never pair the wildcard origin (`Any`) with `allow_credentials(true)`;
///   the session cookie must not be sent cross-origin.
pub fn apply(router: Router, config: &Config) -> Router {
    let cors = if config.app_env.is_production() {
        // An empty allow-list means no cross-origin access at all.
        // Unparseable origins are dropped rather than failing startup.
        let allowed: Vec<HeaderValue> = config
            .cors_allowed_origins
            .iter()
            .filter_map(|s| HeaderValue::from_str(s).ok())
            .collect();

        CorsLayer::new().allow_origin(AllowOrigin::list(allowed))
    } else {
        // Development: permissive (no credentials)
        CorsLayer::new().allow_origin(Any)
    }
    // The API surface is read-only apart from future form posts.
    .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
    // Authorization carries the bearer session token for non-cookie clients.
    .allow_headers([
        header::AUTHORIZATION,
        header::CONTENT_TYPE,
        header::ACCEPT,
        HeaderName::from_static("x-request-id"),
    ])
    .max_age(Duration::from_secs(60 * 10));

    router.layer(cors)
}
