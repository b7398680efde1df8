use std::fmt;
use std::str::FromStr;

use axum::http::Uri;
use thiserror::Error;

use crate::services::admission::matcher::{PathPattern, PatternError, RouteMatcher};
use crate::services::identity::session::{Check, CheckParseError};

pub const DEFAULT_SKIP_ROUTES: &str = "/static(.*),*.html,*.htm,*.css,*.js,*.jpg,*.jpeg,*.webp,\
*.png,*.gif,*.svg,*.ttf,*.woff,*.woff2,*.ico,*.csv,*.doc,*.docx,*.xls,*.xlsx,*.zip,*.webmanifest";
pub const DEFAULT_ALWAYS_ROUTES: &str = "/(api|trpc)(.*)";
pub const DEFAULT_PUBLIC_ROUTES: &str = "/sign-in(.*),/sign-up(.*),/session-tasks(.*)";
pub const DEFAULT_PROTECTED_ROUTES: &str = "/admin(.*) role=admin,/dashboard(.*),/example(.*)";

/// What a protected path asks of the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    Authenticated,
    Session(Check),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Authenticated => f.write_str("authenticated"),
            Self::Session(check) => write!(f, "{}", check),
        }
    }
}

#[derive(Debug, Error)]
pub enum RouteRuleError {
    #[error(transparent)]
    Pattern(#[from] PatternError),
    #[error(transparent)]
    Requirement(#[from] CheckParseError),
    #[error("expected '<pattern> [requirement]', got {0:?}")]
    Syntax(String),
}

/// `<pattern> [requirement]`, e.g. `/admin(.*) role=admin`.
#[derive(Debug, Clone)]
pub struct ProtectedRoute {
    pub pattern: PathPattern,
    pub requirement: Requirement,
}

impl FromStr for ProtectedRoute {
    type Err = RouteRuleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split_whitespace();
        let pattern = parts
            .next()
            .ok_or_else(|| RouteRuleError::Syntax(s.to_string()))?
            .parse::<PathPattern>()?;

        let requirement = match parts.next() {
            None => Requirement::Authenticated,
            Some(check) => Requirement::Session(check.parse()?),
        };

        if parts.next().is_some() {
            return Err(RouteRuleError::Syntax(s.trim().to_string()));
        }

        Ok(Self {
            pattern,
            requirement,
        })
    }
}

pub fn parse_protected_list(raw: &str) -> Result<Vec<ProtectedRoute>, RouteRuleError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect()
}

/// How a denied request is answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenyAction {
    Redirect,
    Reject,
}

impl FromStr for DenyAction {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redirect" => Ok(Self::Redirect),
            "reject" => Ok(Self::Reject),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RedirectTargets {
    pub sign_in: String,
    pub session_tasks: String,
    pub unauthorized: String,
    /// Query parameter carrying the original path on sign-in redirects.
    pub return_to_param: Option<String>,
}

impl Default for RedirectTargets {
    fn default() -> Self {
        Self {
            sign_in: "/".to_string(),
            session_tasks: "/session-tasks".to_string(),
            unauthorized: "/".to_string(),
            return_to_param: None,
        }
    }
}

/// Everything the gate needs; built once at startup.
///
/// Precedence: `always` > `skip` > `public` > first matching `protected`.
#[derive(Debug, Clone)]
pub struct GateConfig {
    pub skip: RouteMatcher,
    pub always: RouteMatcher,
    pub public: RouteMatcher,
    pub protected: Vec<ProtectedRoute>,
    pub redirects: RedirectTargets,
    pub on_unauthenticated: DenyAction,
    pub on_unauthorized: DenyAction,
}

impl GateConfig {
    /// The built-in rule set with default redirect targets.
    pub fn defaults() -> Result<Self, RouteRuleError> {
        Ok(Self {
            skip: RouteMatcher::parse_list(DEFAULT_SKIP_ROUTES)?,
            always: RouteMatcher::parse_list(DEFAULT_ALWAYS_ROUTES)?,
            public: RouteMatcher::parse_list(DEFAULT_PUBLIC_ROUTES)?,
            protected: parse_protected_list(DEFAULT_PROTECTED_ROUTES)?,
            redirects: RedirectTargets::default(),
            on_unauthenticated: DenyAction::Redirect,
            on_unauthorized: DenyAction::Redirect,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    Unauthenticated,
    Forbidden,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Continue,
    Redirect(String),
    Reject(Rejection),
}

/// Where a path falls in the rule set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass<'a> {
    OutOfScope,
    Public,
    Unprotected,
    Protected(&'a Requirement),
}

#[derive(Debug, Clone, Copy)]
pub struct RequestDescriptor<'a> {
    pub path: &'a str,
    pub query: Option<&'a str>,
}

impl<'a> RequestDescriptor<'a> {
    pub fn new(path: &'a str) -> Self {
        Self { path, query: None }
    }

    pub fn from_uri(uri: &'a Uri) -> Self {
        Self {
            path: uri.path(),
            query: uri.query(),
        }
    }

    pub fn path_and_query(&self) -> String {
        match self.query {
            Some(q) if !q.is_empty() => format!("{}?{}", self.path, q),
            _ => self.path.to_string(),
        }
    }
}
