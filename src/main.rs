use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, fmt};

use carchat_rust::{
    config::Settings,
    routes::{self, AppState},
    search_api::{self, HttpSearchBackend},
    SearchSession,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file first. Ignore errors (e.g., file not found)
    dotenv::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "carchat_rust=info,tower_http=info".into()))
        .with(fmt::layer())
        .init();

    tracing::info!("Initializing car chat server...");

    let settings = match Settings::new() {
        Ok(s) => {
            tracing::info!("Configuration loaded successfully.");
            s
        }
        Err(e) => {
            tracing::error!("Failed to load configuration: {:#}", e);
            return Err(e);
        }
    };
    let settings = Arc::new(settings);

    let http_client = search_api::build_client(&settings).context("Failed to build shared reqwest client")?;
    let backend = HttpSearchBackend::new(http_client, &settings.search_api_url);
    tracing::info!("Search backend endpoint: {}", backend.endpoint());

    // One session for the lifetime of the process
    let session = Arc::new(SearchSession::new(Arc::new(backend), settings.page_window_size));

    let app_state = AppState {
        settings: Arc::clone(&settings),
        session,
    };
    let app = routes::create_router(app_state);

    let addr: SocketAddr = settings
        .server_address
        .parse()
        .with_context(|| format!("Invalid server address format: {}", settings.server_address))?;

    let listener = match TcpListener::bind(&addr).await {
        Ok(l) => {
            tracing::info!("Server listening on {}", addr);
            l
        }
        Err(e) => {
            tracing::error!("Failed to bind to address {}: {}", addr, e);
            return Err(e.into());
        }
    };

    axum::serve(listener, app.into_make_service()).await?;

    Ok(())
}
