//! Session Context handed to the admission gate and to handlers.
//!
//! Built once per request by an `IdentityProvider`, never mutated afterwards.
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use serde_json::{Map, Value};
use thiserror::Error;

use super::roles::{self, Role, UnknownRole};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
    Authenticated,
    /// Sign-in started but session tasks are still outstanding.
    Pending,
    Anonymous,
}

/// Arbitrary key/value claims asserted by the identity provider.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Claims(Map<String, Value>);

impl Claims {
    pub fn new(map: Map<String, Value>) -> Self {
        Self(map)
    }

    /// Look up a dotted path such as `metadata.role`.
    pub fn get(&self, path: &str) -> Option<&Value> {
        let mut keys = path.split('.');
        let first = self.0.get(keys.next()?)?;
        keys.try_fold(first, |value, key| value.get(key))
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(Value::as_str)
    }
}

/// A named condition on an authenticated session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Check {
    Role(Role),
    Permission(String),
    Claim { path: String, value: String },
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CheckParseError {
    #[error("expected role=<role>, permission=<name> or claim:<path>=<value>, got {0:?}")]
    Syntax(String),
    #[error(transparent)]
    Role(#[from] UnknownRole),
}

impl FromStr for Check {
    type Err = CheckParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let syntax = || CheckParseError::Syntax(raw.to_string());

        if let Some(role) = raw.strip_prefix("role=") {
            return Ok(Self::Role(role.parse()?));
        }
        if let Some(name) = raw.strip_prefix("permission=") {
            if name.trim().is_empty() {
                return Err(syntax());
            }
            return Ok(Self::Permission(name.trim().to_string()));
        }
        if let Some(rest) = raw.strip_prefix("claim:") {
            let (path, value) = rest.split_once('=').ok_or_else(syntax)?;
            if path.trim().is_empty() {
                return Err(syntax());
            }
            return Ok(Self::Claim {
                path: path.trim().to_string(),
                value: value.trim().to_string(),
            });
        }
        Err(syntax())
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role={}", role),
            Self::Permission(name) => write!(f, "permission={}", name),
            Self::Claim { path, value } => write!(f, "claim:{}={}", path, value),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SessionContext {
    pub session_id: String,
    pub user_id: Option<String>,
    pub status: SessionStatus,
    pub claims: Claims,
    pub permissions: Vec<String>,
    pub tasks: Vec<String>,
    pub org_id: Option<String>,
}

impl SessionContext {
    pub fn new(session_id: impl Into<String>, status: SessionStatus) -> Self {
        Self {
            session_id: session_id.into(),
            user_id: None,
            status,
            claims: Claims::default(),
            permissions: Vec::new(),
            tasks: Vec::new(),
            org_id: None,
        }
    }

    pub fn authenticated(session_id: impl Into<String>, user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            ..Self::new(session_id, SessionStatus::Authenticated)
        }
    }

    pub fn pending<I, T>(session_id: impl Into<String>, user_id: impl Into<String>, tasks: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            user_id: Some(user_id.into()),
            tasks: tasks.into_iter().map(Into::into).collect(),
            ..Self::new(session_id, SessionStatus::Pending)
        }
    }

    /// Replace claims with the given JSON object. Non-objects clear them.
    pub fn with_claims(mut self, claims: Value) -> Self {
        self.claims = match claims {
            Value::Object(map) => Claims::new(map),
            _ => Claims::default(),
        };
        self
    }

    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.push(permission.into());
        self
    }

    pub fn is_authenticated(&self) -> bool {
        self.status == SessionStatus::Authenticated
    }

    pub fn is_pending(&self) -> bool {
        self.status == SessionStatus::Pending
    }

    pub fn role(&self) -> Option<Role> {
        self.claims.get_str(roles::ROLE_CLAIM).and_then(Role::from_claim)
    }

    /// Whether the session satisfies `check`. Only authenticated sessions can.
    pub fn has(&self, check: &Check) -> bool {
        if !self.is_authenticated() {
            return false;
        }
        match check {
            Check::Role(role) => roles::check_role(self, *role),
            Check::Permission(name) => self.permissions.iter().any(|p| p == name),
            Check::Claim { path, value } => match self.claims.get(path) {
                Some(Value::String(s)) => s == value,
                Some(Value::Array(items)) => {
                    items.iter().any(|v| v.as_str() == Some(value.as_str()))
                }
                Some(Value::Bool(b)) => b.to_string() == *value,
                Some(Value::Number(n)) => n.to_string() == *value,
                _ => false,
            },
        }
    }
}
