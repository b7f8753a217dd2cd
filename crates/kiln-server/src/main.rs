mod config;

use std::sync::Arc;

use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use kiln_api::chat::ChatOrchestrator;
use kiln_api::provider::GoTrueAuth;
use kiln_api::{AppState, AppStateInner};
use kiln_db::{Database, RestStore, Store};
use kiln_generate::{EndpointChain, FallbackGenerator, Generator, HttpGenerator};

use crate::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    // Init logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kiln=debug,kiln_api=debug,kiln_db=debug,kiln_generate=debug,tower_http=debug".into()),
        )
        .init();

    let config = Config::from_env()?;
    let client = reqwest::Client::new();
    let backend_url = config.backend_url.as_str().trim_end_matches('/');

    let store: Arc<dyn Store> = match &config.db_path {
        Some(path) => {
            warn!("Using local store at {}; hosted row-level policies do not apply", path.display());
            Arc::new(Database::open(path)?)
        }
        None => Arc::new(RestStore::new(backend_url, &config.backend_key)),
    };

    let generator: Arc<dyn Generator> = match &config.generation_url {
        Some(url) => {
            info!(%url, "Chat replies come from the generation endpoint");
            Arc::new(HttpGenerator::new(client.clone(), url.clone(), config.ai_key.clone()))
        }
        None => {
            info!("No generation endpoint configured, chat replies use the fallback templates");
            Arc::new(FallbackGenerator)
        }
    };

    let proxy = EndpointChain::new(client.clone(), config.proxy_endpoints.clone());
    info!(endpoints = proxy.endpoints().len(), "Proxy chain ready");

    let state: AppState = Arc::new(AppStateInner {
        store,
        auth: Arc::new(GoTrueAuth::new(client, backend_url, &config.backend_key)),
        chat: ChatOrchestrator::new(generator),
        proxy,
        jwt_secret: config.jwt_secret.clone(),
        secure_cookies: config.secure_cookies,
    });

    let app = kiln_api::router(state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    info!("Kiln server listening on {}", config.addr);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();
    #[cfg(unix)]
    {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
                    _ = sigterm.recv() => info!("Received SIGTERM, shutting down..."),
                }
            }
            Err(e) => {
                warn!("Could not install SIGTERM handler: {}", e);
                ctrl_c.await.ok();
                info!("Received Ctrl+C, shutting down...");
            }
        }
    }
    #[cfg(not(unix))]
    {
        ctrl_c.await.ok();
        info!("Received Ctrl+C, shutting down...");
    }
}
