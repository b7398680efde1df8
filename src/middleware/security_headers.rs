//! Security-related response headers for browser clients.
//!
//! Applied at the Router level, outside the gate, so redirects and 401/403
//! answers carry them too.
//!
//! Responsibility:
//! - Clickjacking protection
//! - MIME sniffing protection
//! - Referrer leakage control
//! - Browser feature restrictions
//!
//! Headers are only added when a handler did not set its own.
//! Configuration-free; extend with `Config` if a page ever needs framing.

use axum::Router;
use axum::http::header::{HeaderName, HeaderValue};
use tower_http::set_header::SetResponseHeaderLayer;

const HEADERS: [(&str, &str); 5] = [
    // Clickjacking protection (legacy + modern)
    ("x-frame-options", "DENY"),
    ("content-security-policy", "frame-ancestors 'none'"),
    // Prevent MIME sniffing
    ("x-content-type-options", "nosniff"),
    // Return-to queries in URLs stay on this origin
    ("referrer-policy", "same-origin"),
    // Disable powerful browser features by default
    ("permissions-policy", "camera=(), microphone=(), geolocation=()"),
];

/// Apply common security headers to all responses.
pub fn apply(router: Router) -> Router {
    HEADERS.into_iter().fold(router, |router, (name, value)| {
        router.layer(SetResponseHeaderLayer::if_not_present(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        ))
    })
}
