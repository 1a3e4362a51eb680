//! Database Metadata Explorer
//!
//! Connects to a PostgreSQL database, analyzes the structural dependencies of
//! a selected table (foreign keys in both directions, dependent views,
//! procedures and functions), finds similarly named tables, renders an ER
//! diagram and exports everything as a spreadsheet report.

mod analysis;
mod catalog;
mod config;
mod connection;
mod diagram;
mod error;
mod models;
mod report;
mod routes;
mod session;
mod state;

use crate::config::Settings;
use crate::diagram::KrokiRenderer;
use crate::routes::create_router;
use crate::state::{AppState, SharedState};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("Starting Database Metadata Explorer...");

    if rustls::crypto::ring::default_provider().install_default().is_err() {
        warn!("A TLS crypto provider was already installed");
    }

    let settings = Settings::load()?;
    info!("Configuration loaded successfully");

    let renderer = KrokiRenderer::new(&settings.diagram)?;
    info!("Diagram rendering via {}", settings.diagram.render_url);

    let state: SharedState = Arc::new(AppState::new(renderer));

    // Optional connect-on-start; a failure leaves the session disconnected
    if let Some(params) = settings.startup_connection.clone() {
        let mut session = state.session.lock().await;
        match session.connect(params).await {
            Ok(status) => info!("Startup connection ready: {} table(s)", status.table_count),
            Err(e) => error!("Startup connection failed: {}", e),
        }
    }

    let app = create_router(state.clone(), &settings);
    let addr = SocketAddr::from((settings.server.host, settings.server.port));

    info!("Server listening on http://{}", addr);
    info!("API Endpoints:");
    info!("   POST /api/session/connect     - Connect to a database");
    info!("   POST /api/session/disconnect  - Close the connection");
    info!("   POST /api/session/reconnect   - Reconnect with the last parameters");
    info!("   GET  /api/session/status      - Session status");
    info!("   GET  /api/tables?search=      - List and search tables");
    info!("   POST /api/analysis            - Analyze a table");
    info!("   GET  /api/analysis            - Last analysis");
    info!("   GET  /api/export/diagram.mmd  - Download Mermaid diagram");
    info!("   GET  /api/export/diagram.png  - Download rendered diagram");
    info!("   GET  /api/export/report.xlsx  - Download spreadsheet report");

    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    state.session.lock().await.disconnect();

    info!("Server shutdown complete");
    Ok(())
}

/// Initialize tracing with structured logging
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,db_metadata_explorer=debug,tower_http=debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_thread_ids(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

/// Graceful shutdown signal handler
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, initiating graceful shutdown...");
        },
        _ = terminate => {
            info!("Received terminate signal, initiating graceful shutdown...");
        },
    }
}
