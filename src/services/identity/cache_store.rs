//! `IdentityProvider` backed by the provider's session records in a cache.
//!
//! Records are JSON written by the identity provider under `<prefix>:<token>`:
//!
//! ```json
//! { "id": "sess_1", "user_id": "user_1", "status": "active",
//!   "claims": { "metadata": { "role": "admin" } },
//!   "permissions": ["invoices:create"], "tasks": [], "org_id": null,
//!   "expires_at": "2030-01-01T00:00:00Z" }
//! ```
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::HeaderMap;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{Map, Value};

use crate::services::cache::CacheClient;
use crate::services::identity::provider::{
    IdentityError, IdentityProvider, IdentityResult, is_well_formed, session_token,
};
use crate::services::identity::session::{Claims, SessionContext, SessionStatus};

#[derive(Debug, Clone)]
pub struct SessionStoreSettings {
    pub key_prefix: String,
    pub cookie_name: String,
    pub lookup_timeout: Duration,
}

impl Default for SessionStoreSettings {
    fn default() -> Self {
        Self {
            key_prefix: "session".to_string(),
            cookie_name: "__session".to_string(),
            lookup_timeout: Duration::from_millis(2000),
        }
    }
}

#[derive(Debug, Deserialize)]
struct SessionRecord {
    id: String,
    #[serde(default)]
    user_id: Option<String>,
    status: String,
    #[serde(default)]
    claims: Map<String, Value>,
    #[serde(default)]
    permissions: Vec<String>,
    #[serde(default)]
    tasks: Vec<String>,
    #[serde(default)]
    org_id: Option<String>,
    #[serde(default)]
    expires_at: Option<DateTime<Utc>>,
}

impl SessionRecord {
    fn into_context(self, now: DateTime<Utc>) -> SessionContext {
        let expired = self.expires_at.is_some_and(|exp| exp <= now);

        // a signed-in session always names its user
        let status = match (self.status.as_str(), &self.user_id) {
            _ if expired => SessionStatus::Anonymous,
            ("active", Some(_)) => SessionStatus::Authenticated,
            ("pending", _) => SessionStatus::Pending,
            _ => SessionStatus::Anonymous,
        };

        SessionContext {
            session_id: self.id,
            user_id: self.user_id,
            status,
            claims: Claims::new(self.claims),
            permissions: self.permissions,
            tasks: self.tasks,
            org_id: self.org_id,
        }
    }
}

#[derive(Clone)]
pub struct CacheIdentityProvider<C: CacheClient> {
    cache: Arc<C>,
    settings: SessionStoreSettings,
}

impl<C: CacheClient> CacheIdentityProvider<C> {
    pub fn new(cache: Arc<C>, settings: SessionStoreSettings) -> Self {
        Self { cache, settings }
    }

    pub fn key(&self, token: &str) -> String {
        format!("{}:{}", self.settings.key_prefix, token)
    }

    async fn lookup(&self, key: &str) -> IdentityResult<Option<String>> {
        let timeout = self.settings.lookup_timeout;
        let value = tokio::time::timeout(timeout, self.cache.get_string(key))
            .await
            .map_err(|_| IdentityError::Timeout(timeout))??;
        Ok(value)
    }
}

#[async_trait]
impl<C: CacheClient> IdentityProvider for CacheIdentityProvider<C> {
    fn provider_name(&self) -> &'static str {
        self.cache.backend_name()
    }

    async fn resolve_session(&self, headers: &HeaderMap) -> IdentityResult<Option<SessionContext>> {
        let Some(token) = session_token(headers, &self.settings.cookie_name) else {
            return Ok(None);
        };

        if !is_well_formed(&token) {
            return Err(IdentityError::InvalidToken);
        }

        let Some(raw) = self.lookup(&self.key(&token)).await? else {
            tracing::debug!(backend = self.cache.backend_name(), "no session record for token");
            return Ok(None);
        };

        let record: SessionRecord =
            serde_json::from_str(&raw).map_err(|e| IdentityError::InvalidRecord(e.to_string()))?;

        Ok(Some(record.into_context(Utc::now())))
    }
}
