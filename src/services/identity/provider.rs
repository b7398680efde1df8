//! The seam to the external identity provider.
use std::time::Duration;

use async_trait::async_trait;
use axum::http::{HeaderMap, header};
use axum_extra::extract::CookieJar;
use thiserror::Error;

use crate::services::cache::CacheError;
use crate::services::identity::session::SessionContext;

pub type IdentityResult<T> = Result<T, IdentityError>;

/// Failures while resolving a session.
///
/// None of these reach the client directly: the admission gate treats every
/// one of them as "no session" (fail-closed on protected paths).
#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("malformed session token")]
    InvalidToken,
    #[error("session store unavailable: {0}")]
    Backend(#[from] CacheError),
    #[error("session lookup timed out after {0:?}")]
    Timeout(Duration),
    #[error("unreadable session record: {0}")]
    InvalidRecord(String),
}

/// Resolves the Session Context for a request.
///
/// Retry and timeout policy belong to the implementation, not to the gate.
#[async_trait]
pub trait IdentityProvider: Send + Sync + 'static {
    fn provider_name(&self) -> &'static str;

    /// `Ok(None)` when the request carries no session at all.
    async fn resolve_session(&self, headers: &HeaderMap) -> IdentityResult<Option<SessionContext>>;
}

const MAX_TOKEN_LEN: usize = 512;

/// Session token from `Authorization: Bearer …`, falling back to the session cookie.
pub fn session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    CookieJar::from_headers(headers)
        .get(cookie_name)
        .map(|c| c.value().trim().to_string())
        .filter(|t| !t.is_empty())
}

/// Tokens become part of a cache key, so only a conservative charset is allowed.
pub fn is_well_formed(token: &str) -> bool {
    !token.is_empty()
        && token.len() <= MAX_TOKEN_LEN
        && token
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || matches!(b, b'.' | b'_' | b'-'))
}
