/*
 * Responsibility
 * - Read settings from the environment (.env supported via dotenvy)
 * - Compile the admission rule set once at startup; invalid rules abort startup
 * - `from_lookup` keeps parsing independent of the process environment (tests)
 */
use std::fmt;
use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use crate::services::admission::matcher::RouteMatcher;
use crate::services::admission::types::{
    DEFAULT_ALWAYS_ROUTES, DEFAULT_PROTECTED_ROUTES, DEFAULT_PUBLIC_ROUTES, DEFAULT_SKIP_ROUTES,
    DenyAction, GateConfig, RedirectTargets, parse_protected_list,
};
use crate::services::identity::SessionStoreSettings;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppEnv {
    Development,
    Production,
}

impl AppEnv {
    fn parse(value: Option<&str>) -> Self {
        match value.unwrap_or("development").to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            _ => Self::Development,
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Self::Production)
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Missing(&'static str),
    Invalid(&'static str),
    InvalidRoutes { key: &'static str, reason: String },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Missing(key) => write!(f, "missing configuration: {}", key),
            ConfigError::Invalid(key) => write!(f, "invalid configuration: {}", key),
            ConfigError::InvalidRoutes { key, reason } => {
                write!(f, "invalid route rules in {}: {}", key, reason)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone)]
pub struct HttpConfig {
    pub request_timeout: Duration,
    pub body_limit_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct SessionStoreConfig {
    /// `None` selects the in-process store (development only).
    pub url: Option<String>,
    pub settings: SessionStoreSettings,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub addr: SocketAddr,
    pub app_env: AppEnv,
    pub cors_allowed_origins: Vec<String>,
    pub http: HttpConfig,
    pub session_store: SessionStoreConfig,
    pub gate: GateConfig,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // blank values count as unset
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let port: u16 = var("PORT").and_then(|s| s.parse().ok()).unwrap_or(3000);

        let addr: SocketAddr = SocketAddr::from_str(&format!("0.0.0.0:{}", port))
            .map_err(|_| ConfigError::Invalid("PORT"))?;

        let app_env = AppEnv::parse(var("APP_ENV").as_deref());

        let cors_allowed_origins = var("CORS_ALLOWED_ORIGINS")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>();

        let http = HttpConfig {
            request_timeout: Duration::from_secs(
                var("REQUEST_TIMEOUT_SECONDS")
                    .and_then(|v| v.parse().ok())
                    .unwrap_or(30),
            ),
            body_limit_bytes: var("REQUEST_BODY_LIMIT_BYTES")
                .and_then(|v| v.parse().ok())
                .unwrap_or(1024 * 1024),
        };

        let session_url = var("SESSION_STORE_URL");
        if session_url.is_none() && app_env.is_production() {
            return Err(ConfigError::Missing("SESSION_STORE_URL"));
        }

        let defaults = SessionStoreSettings::default();
        let session_store = SessionStoreConfig {
            url: session_url,
            settings: SessionStoreSettings {
                key_prefix: var("SESSION_KEY_PREFIX").unwrap_or(defaults.key_prefix),
                cookie_name: var("SESSION_COOKIE_NAME").unwrap_or(defaults.cookie_name),
                lookup_timeout: var("SESSION_LOOKUP_TIMEOUT_MS")
                    .and_then(|v| v.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.lookup_timeout),
            },
        };

        let gate = GateConfig {
            skip: route_list(&var, "GATE_SKIP_ROUTES", DEFAULT_SKIP_ROUTES)?,
            always: route_list(&var, "GATE_ALWAYS_ROUTES", DEFAULT_ALWAYS_ROUTES)?,
            public: route_list(&var, "GATE_PUBLIC_ROUTES", DEFAULT_PUBLIC_ROUTES)?,
            protected: parse_protected_list(
                var("GATE_PROTECTED_ROUTES")
                    .as_deref()
                    .unwrap_or(DEFAULT_PROTECTED_ROUTES),
            )
            .map_err(|e| ConfigError::InvalidRoutes {
                key: "GATE_PROTECTED_ROUTES",
                reason: e.to_string(),
            })?,
            redirects: redirect_targets(&var)?,
            on_unauthenticated: deny_action(&var, "GATE_UNAUTHENTICATED_ACTION")?,
            on_unauthorized: deny_action(&var, "GATE_UNAUTHORIZED_ACTION")?,
        };

        Ok(Self {
            addr,
            app_env,
            cors_allowed_origins,
            http,
            session_store,
            gate,
        })
    }
}

fn route_list(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
    default: &str,
) -> Result<RouteMatcher, ConfigError> {
    RouteMatcher::parse_list(var(key).as_deref().unwrap_or(default)).map_err(|e| {
        ConfigError::InvalidRoutes {
            key,
            reason: e.to_string(),
        }
    })
}

fn deny_action(
    var: &impl Fn(&str) -> Option<String>,
    key: &'static str,
) -> Result<DenyAction, ConfigError> {
    match var(key) {
        None => Ok(DenyAction::Redirect),
        Some(v) => v.parse().map_err(|_| ConfigError::Invalid(key)),
    }
}

fn redirect_targets(var: &impl Fn(&str) -> Option<String>) -> Result<RedirectTargets, ConfigError> {
    let defaults = RedirectTargets::default();
    let target = |key: &'static str, default: String| match var(key) {
        None => Ok(default),
        Some(v) if is_redirect_target(&v) => Ok(v),
        Some(_) => Err(ConfigError::Invalid(key)),
    };

    Ok(RedirectTargets {
        sign_in: target("GATE_SIGN_IN_URL", defaults.sign_in)?,
        session_tasks: target("GATE_SESSION_TASKS_URL", defaults.session_tasks)?,
        unauthorized: target("GATE_UNAUTHORIZED_URL", defaults.unauthorized)?,
        return_to_param: var("GATE_RETURN_TO_PARAM"),
    })
}

// Site-relative path, or an absolute http(s) URL (e.g. a hosted sign-in page).
fn is_redirect_target(value: &str) -> bool {
    if value.starts_with('/') {
        return !value.starts_with("//");
    }
    url::Url::parse(value).is_ok_and(|u| matches!(u.scheme(), "http" | "https"))
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn defaults_without_environment() {
        let config = config_from(&[]).unwrap();
        assert_eq!(config.addr.port(), 3000);
        assert_eq!(config.app_env, AppEnv::Development);
        assert!(config.session_store.url.is_none());
        assert_eq!(config.session_store.settings.cookie_name, "__session");
        assert_eq!(config.http.request_timeout, Duration::from_secs(30));
        assert_eq!(config.gate.redirects, RedirectTargets::default());
        assert_eq!(config.gate.on_unauthenticated, DenyAction::Redirect);
        assert_eq!(config.gate.protected.len(), 3);
    }

    #[test]
    fn production_requires_session_store() {
        assert!(matches!(
            config_from(&[("APP_ENV", "production")]),
            Err(ConfigError::Missing("SESSION_STORE_URL"))
        ));
        let config = config_from(&[
            ("APP_ENV", "prod"),
            ("SESSION_STORE_URL", "redis://cache:6379"),
        ])
        .unwrap();
        assert!(config.app_env.is_production());
    }

    #[test]
    fn gate_overrides() {
        let config = config_from(&[
            ("GATE_PROTECTED_ROUTES", "/billing(.*) permission=invoices:create"),
            ("GATE_PUBLIC_ROUTES", ""),
            ("GATE_SIGN_IN_URL", "https://accounts.example.com/sign-in"),
            ("GATE_RETURN_TO_PARAM", "redirect_url"),
            ("GATE_UNAUTHORIZED_ACTION", "reject"),
            ("SESSION_LOOKUP_TIMEOUT_MS", "250"),
        ])
        .unwrap();

        assert_eq!(config.gate.protected.len(), 1);
        // blank falls back to the default list
        assert!(config.gate.public.matches("/sign-in"));
        assert_eq!(config.gate.redirects.sign_in, "https://accounts.example.com/sign-in");
        assert_eq!(config.gate.redirects.return_to_param.as_deref(), Some("redirect_url"));
        assert_eq!(config.gate.on_unauthorized, DenyAction::Reject);
        assert_eq!(
            config.session_store.settings.lookup_timeout,
            Duration::from_millis(250)
        );
    }

    #[test]
    fn invalid_gate_settings_fail_startup() {
        assert!(matches!(
            config_from(&[("GATE_SKIP_ROUTES", "/((?!_next).*)")]),
            Err(ConfigError::InvalidRoutes { key: "GATE_SKIP_ROUTES", .. })
        ));
        assert!(matches!(
            config_from(&[("GATE_PROTECTED_ROUTES", "/admin(.*) role=root")]),
            Err(ConfigError::InvalidRoutes { key: "GATE_PROTECTED_ROUTES", .. })
        ));
        assert!(matches!(
            config_from(&[("GATE_UNAUTHENTICATED_ACTION", "deny")]),
            Err(ConfigError::Invalid("GATE_UNAUTHENTICATED_ACTION"))
        ));
        assert!(matches!(
            config_from(&[("GATE_SIGN_IN_URL", "//evil.example")]),
            Err(ConfigError::Invalid("GATE_SIGN_IN_URL"))
        ));
        assert!(matches!(
            config_from(&[("GATE_UNAUTHORIZED_URL", "javascript:alert(1)")]),
            Err(ConfigError::Invalid("GATE_UNAUTHORIZED_URL"))
        ));
    }
}
