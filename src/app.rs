/*
 * Responsibility
 * - Config loading → dependency wiring → Router assembly
 * - Middleware order (outermost first): http → cors → security headers → admission
 * - axum::serve() with graceful shutdown
 */
use std::{panic, process, sync::Arc};

use anyhow::{Context, Result};
use axum::{Router, http::Uri};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;
use crate::error::AppError;
use crate::services::admission::AdmissionGate;
use crate::services::cache::{MemoryCache, ValkeyClient};
use crate::services::identity::{CacheIdentityProvider, IdentityProvider};
use crate::state::AppState;
use crate::{api, middleware, pages};

fn init_tracing() {
    // RUST_LOG wins when set, e.g. RUST_LOG=info,admission_gate=debug
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        tracing::error!(?info, "panic");

        // Development: crash loudly. Production: default hook, keep serving.
        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env().context("loading configuration")?;
    init_panic_hook(!config.app_env.is_production());

    tracing::info!(
        "starting admission gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config).await?;
    let app = build_router(state, &config);

    let listener = tokio::net::TcpListener::bind(config.addr)
        .await
        .with_context(|| format!("binding {}", config.addr))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("serving http")?;

    Ok(())
}

async fn build_state(config: &Config) -> Result<AppState> {
    let gate = Arc::new(AdmissionGate::new(config.gate.clone()));
    let settings = config.session_store.settings.clone();

    let identity: Arc<dyn IdentityProvider> = match config.session_store.url.as_deref() {
        Some(url) => {
            let client = ValkeyClient::connect(url)
                .await
                .context("connecting to session store")?;
            Arc::new(CacheIdentityProvider::new(Arc::new(client), settings))
        }
        None => {
            tracing::warn!("SESSION_STORE_URL not set; using an empty in-memory session store");
            Arc::new(CacheIdentityProvider::new(Arc::new(MemoryCache::new()), settings))
        }
    };

    let rules = gate.config();
    tracing::info!(
        skip_rules = rules.skip.patterns().len(),
        public_rules = rules.public.patterns().len(),
        protected_rules = rules.protected.len(),
        identity = identity.provider_name(),
        "admission gate ready"
    );

    Ok(AppState::new(gate, identity))
}

pub fn build_router(state: AppState, config: &Config) -> Router {
    let router = Router::new()
        .merge(pages::routes())
        .nest("/api/v1", api::v1::routes())
        .fallback(not_found);

    // the gate wraps routes and the fallback alike
    let router = middleware::admission::apply(router, state.clone()).with_state(state);

    let router = middleware::security_headers::apply(router);
    let router = middleware::cors::apply(router, config);
    middleware::http::apply(router, &config.http)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(uri.path().to_string())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "failed to listen for shutdown signal");
        return;
    }
    tracing::info!("shutdown signal received");
}
