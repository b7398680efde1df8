//! HTTP-level tests: the full router (pages, /api/v1, gate, transport layers)
//! driven with `oneshot`, sessions served from an in-memory session store.

use std::collections::HashMap;
use std::sync::Arc;

use admission_gate::app::build_router;
use admission_gate::config::Config;
use admission_gate::services::admission::AdmissionGate;
use admission_gate::services::cache::{CacheError, MemoryCache};
use admission_gate::services::identity::{
    CacheIdentityProvider, IdentityError, IdentityProvider, IdentityResult, SessionContext,
};
use admission_gate::state::AppState;
use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{HeaderMap, Request, Response, StatusCode, header};
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tower::ServiceExt;

fn config(pairs: &[(&str, &str)]) -> Config {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    Config::from_lookup(|key| map.get(key).cloned()).expect("valid test config")
}

async fn seeded_cache() -> MemoryCache {
    let cache = MemoryCache::new();
    let records = [
        (
            "tok_admin",
            json!({
                "id": "sess_admin",
                "user_id": "user_admin",
                "status": "active",
                "claims": { "metadata": { "role": "admin" } }
            }),
        ),
        (
            "tok_member",
            json!({
                "id": "sess_member",
                "user_id": "user_member",
                "status": "active",
                "claims": { "metadata": { "role": "moderator" } },
                "permissions": ["invoices:create"]
            }),
        ),
        (
            "tok_shouty",
            json!({
                "id": "sess_shouty",
                "user_id": "user_shouty",
                "status": "active",
                "claims": { "metadata": { "role": "Admin" } }
            }),
        ),
        (
            "tok_pending",
            json!({
                "id": "sess_pending",
                "user_id": "user_pending",
                "status": "pending",
                "tasks": ["choose-organization"]
            }),
        ),
        (
            "tok_expired",
            json!({
                "id": "sess_expired",
                "user_id": "user_expired",
                "status": "active",
                "expires_at": "2001-01-01T00:00:00Z"
            }),
        ),
    ];
    for (token, record) in records {
        cache
            .insert(format!("session:{}", token), record.to_string())
            .await;
    }
    cache
}

async fn app(config: &Config) -> Router {
    let identity = CacheIdentityProvider::new(
        Arc::new(seeded_cache().await),
        config.session_store.settings.clone(),
    );
    app_with_identity(config, Arc::new(identity))
}

fn app_with_identity(config: &Config, identity: Arc<dyn IdentityProvider>) -> Router {
    let gate = Arc::new(AdmissionGate::new(config.gate.clone()));
    build_router(AppState::new(gate, identity), config)
}

async fn get(app: &Router, uri: &str, token: Option<&str>) -> Response<Body> {
    let mut req = Request::builder().uri(uri);
    if let Some(token) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    app.clone()
        .oneshot(req.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

fn location(resp: &Response<Body>) -> Option<&str> {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
}

async fn body_json(resp: Response<Body>) -> Value {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).expect("json body")
}

async fn body_text(resp: Response<Body>) -> String {
    let bytes = resp.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

#[tokio::test]
async fn admin_without_session_redirects_to_root() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/admin/users", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));
}

#[tokio::test]
async fn admin_with_other_role_redirects_to_root() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/admin/users", Some("tok_member")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));
}

#[tokio::test]
async fn admin_with_admin_role_is_served() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/admin/users", Some("tok_admin")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("admin dashboard"));
}

#[tokio::test]
async fn pending_session_is_sent_to_session_tasks() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/dashboard", Some("tok_pending")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/session-tasks"));

    let resp = get(&app, "/session-tasks", Some("tok_pending")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("<li>choose-organization</li>"));
}

#[tokio::test]
async fn static_assets_pass_through_without_session() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/favicon.ico", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert!(location(&resp).is_none());

    // skipped by the gate; the handler itself still wants a session
    let resp = get(&app, "/admin/logo.png", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert!(location(&resp).is_none());
}

#[tokio::test]
async fn expired_session_counts_as_signed_out() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/dashboard", Some("tok_expired")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));
}

#[tokio::test]
async fn session_cookie_is_accepted() {
    let app = app(&config(&[])).await;
    let req = Request::builder()
        .uri("/dashboard")
        .header(header::COOKIE, "__session=tok_member")
        .body(Body::empty())
        .unwrap();
    let resp = app.oneshot(req).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Signed in as user_member"));
}

#[tokio::test]
async fn api_user_requires_a_signed_in_session() {
    let app = app(&config(&[])).await;

    let resp = get(&app, "/api/v1/user", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"]["code"], "UNAUTHORIZED");

    let resp = get(&app, "/api/v1/user", Some("tok_pending")).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = get(&app, "/api/v1/user", Some("tok_admin")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["user_id"], "user_admin");
    assert_eq!(body["session"]["id"], "sess_admin");
    assert_eq!(body["session"]["role"], "admin");
    assert_eq!(body["session"]["status"], "authenticated");
}

#[tokio::test]
async fn role_claim_must_match_exactly_everywhere() {
    let app = app(&config(&[])).await;

    let resp = get(&app, "/admin", Some("tok_shouty")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));

    let resp = get(&app, "/api/v1/user", Some("tok_shouty")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body = body_json(resp).await;
    assert_eq!(body["session"]["role"], Value::Null);
    assert_eq!(body["session"]["claims"]["metadata"]["role"], "Admin");
}

#[tokio::test]
async fn example_page_checks_permission() {
    let app = app(&config(&[])).await;

    let resp = get(&app, "/example", Some("tok_member")).await;
    assert!(body_text(resp).await.contains("Our Exclusive Content"));

    let resp = get(&app, "/example", Some("tok_admin")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert!(body_text(resp).await.contains("Only subscribers"));
}

#[tokio::test]
async fn reject_mode_answers_with_json_errors() {
    let app = app(&config(&[
        ("GATE_UNAUTHENTICATED_ACTION", "reject"),
        ("GATE_UNAUTHORIZED_ACTION", "reject"),
    ]))
    .await;

    let resp = get(&app, "/dashboard", None).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["error"]["code"], "UNAUTHORIZED");

    let resp = get(&app, "/admin", Some("tok_member")).await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["error"]["code"], "FORBIDDEN");
}

#[tokio::test]
async fn sign_in_redirect_can_carry_return_path() {
    let app = app(&config(&[
        ("GATE_SIGN_IN_URL", "/sign-in"),
        ("GATE_RETURN_TO_PARAM", "redirect_url"),
    ]))
    .await;

    let resp = get(&app, "/dashboard?tab=1", None).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/sign-in?redirect_url=%2Fdashboard%3Ftab%3D1"));
}

struct UnavailableIdentity;

#[async_trait]
impl IdentityProvider for UnavailableIdentity {
    fn provider_name(&self) -> &'static str {
        "unavailable"
    }

    async fn resolve_session(&self, _headers: &HeaderMap) -> IdentityResult<Option<SessionContext>> {
        Err(IdentityError::Backend(CacheError::BackendConnection(
            "connection refused".to_string(),
        )))
    }
}

#[tokio::test]
async fn identity_failure_fails_closed_on_protected_paths_only() {
    let config = config(&[]);
    let app = app_with_identity(&config, Arc::new(UnavailableIdentity));

    let resp = get(&app, "/dashboard", Some("tok_admin")).await;
    assert_eq!(resp.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location(&resp), Some("/"));

    let resp = get(&app, "/api/v1/health", Some("tok_admin")).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(body_json(resp).await, json!({ "status": "ok" }));

    let resp = get(&app, "/", None).await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn transport_layers_are_applied() {
    let app = app(&config(&[])).await;
    let resp = get(&app, "/", None).await;

    assert!(resp.headers().contains_key("x-request-id"));
    assert_eq!(
        resp.headers().get("x-content-type-options").unwrap(),
        "nosniff"
    );

    let resp = get(&app, "/nowhere", None).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(resp).await["error"]["code"], "NOT_FOUND");
}
