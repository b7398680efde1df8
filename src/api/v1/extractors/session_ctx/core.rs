use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::error::AppError;
use crate::services::identity::SessionContext;

/// The signed-in session, as resolved by the admission middleware.
/// Missing or not yet authenticated (pending, anonymous) → 401.
pub struct CurrentSession(pub SessionContext);

impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionContext>()
            .filter(|s| s.is_authenticated())
            .cloned()
            .map(CurrentSession)
            .ok_or(AppError::Unauthorized)
    }
}

/// Whatever session the middleware resolved, in any status.
pub struct MaybeSession(pub Option<SessionContext>);

impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(MaybeSession(parts.extensions.get::<SessionContext>().cloned()))
    }
}
