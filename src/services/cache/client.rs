//! Read-side cache interface used to reach the identity provider's session store.
use async_trait::async_trait;
use thiserror::Error;

pub type CacheResult<T> = Result<T, CacheError>;

/// Transport/command failures from a cache backend.
///
/// Kept apart from `AppError` so the caller picks the failure policy
/// (the session lookup fails closed on protected paths).
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache connection error: {0}")]
    BackendConnection(String),
    #[error("cache command error: {0}")]
    BackendCommand(String),
}

/// Implementations must be cheap to clone (typically `Arc<...>` inside).
#[async_trait]
pub trait CacheClient: Clone + Send + Sync + 'static {
    // Backend name for logs.
    fn backend_name(&self) -> &'static str;

    // Get a UTF-8 string value; `None` when the key does not exist.
    async fn get_string(&self, key: &str) -> CacheResult<Option<String>>;
}
