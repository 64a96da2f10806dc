mod config;
mod errors;
mod identity;
mod lifecycle;
mod models;
mod routes;
mod social;
mod state;
mod store;
mod suggestions;
mod templates;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::lifecycle::LifecycleManager;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::local::LocalStore;
use crate::store::remote::RemoteClient;
use crate::suggestions::{CannedSuggester, RemoteSuggester, SuggestionProvider};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting JobTrail API v{}", env!("CARGO_PKG_VERSION"));

    // Remote row store client
    let remote = RemoteClient::new(
        config.remote_store_url.clone(),
        config.remote_store_key.clone(),
    );
    info!("Remote store client initialized ({})", config.remote_store_url);

    // Local fallback store
    let local = LocalStore::open(&config.local_store_dir)?;
    info!("Local fallback store at {}", config.local_store_dir);

    // The lifecycle manager owns both stores for application records
    let lifecycle = Arc::new(LifecycleManager::new(Arc::new(remote.clone()), local));

    // Suggestion provider (CannedSuggester by default — swap via SUGGESTIONS_URL)
    let suggester: Arc<dyn SuggestionProvider> = match &config.suggestions_url {
        Some(url) => {
            info!("Suggestions proxied to {url}");
            Arc::new(RemoteSuggester::new(url.clone()))
        }
        None => {
            info!("Suggestions served from the canned library");
            Arc::new(CannedSuggester)
        }
    };

    // Build app state
    let state = AppState {
        lifecycle,
        remote,
        suggester,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: tighten CORS in production

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
