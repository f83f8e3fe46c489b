use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info};

mod api;
mod arbitrage;
mod config;
mod dashboard;
mod db;
mod refresh;

use api::HttpApi;
use config::{Config, DEFAULT_API_URL};
use dashboard::AppState;
use db::Database;
use refresh::{DashboardState, RefreshController, SystemClock};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let db = Database::open(&config.database_path)?;
    info!("Settings database opened: {}", config.database_path);

    // CLI/env beats the stored value; a CLI value is remembered for next time
    let api_url = match &config.api_url {
        Some(url) => {
            let url = url.trim().to_string();
            db.set_api_url(&url)?;
            url
        }
        None => db
            .api_url()?
            .unwrap_or_else(|| DEFAULT_API_URL.to_string()),
    };
    info!("Using arbitrage API at {}", api_url);

    let mut state = DashboardState::new(api_url);
    if let Some(query) = &config.initial_query {
        state.sync_from_query(query);
        info!("Initial filters: ?{}", state.history.current());
    }

    let api = HttpApi::new(Duration::from_secs(config.request_timeout_secs))?;
    let controller = Arc::new(RefreshController::new(
        Arc::new(api),
        db,
        state,
        Arc::new(SystemClock),
    ));

    // Initial load plus the periodic refresh
    let scheduler = controller.start(Duration::from_secs(config.refresh_interval_secs));

    let app = dashboard::router(AppState {
        controller,
        card_stake: config.card_stake,
    });
    let addr: SocketAddr = config
        .dashboard_addr
        .parse()
        .with_context(|| format!("Invalid dashboard address {}", config.dashboard_addr))?;
    info!("Dashboard listening on http://{}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    // Run dashboard server (blocks until shutdown)
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.stop().await;
    info!("Dashboard shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("Received Ctrl+C, shutting down..."),
        _ = terminate => info!("Received SIGTERM, shutting down..."),
    }
}
