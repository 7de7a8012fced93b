// Main entry point - Dependency injection and server setup
mod application;
mod domain;
mod error;
mod infrastructure;
mod presentation;

use std::{net::SocketAddr, sync::Arc};
use tracing_subscriber::EnvFilter;

use crate::application::dashboard_core::DashboardCore;
use crate::application::ports::StateStorage;
use crate::infrastructure::config::{StorageBackend, load_app_config};
use crate::infrastructure::mock_projects::MockProjectSource;
use crate::infrastructure::state_storage::{FileStateStorage, MemoryStateStorage};
use crate::presentation::app_state::AppState;
use crate::presentation::router::{router, shutdown_after};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    // Load configuration
    let config = load_app_config()?;

    // Create adapters (infrastructure layer)
    let storage: Arc<dyn StateStorage> = match config.storage.backend {
        StorageBackend::File => Arc::new(FileStateStorage::new(config.storage.dir.clone())),
        StorageBackend::Memory => {
            tracing::warn!("Using in-memory dashboard state, layout is lost on restart");
            Arc::new(MemoryStateStorage::new())
        }
    };
    let source = Arc::new(MockProjectSource::from_settings(&config.mock));

    // Create core (application layer)
    let core = Arc::new(DashboardCore::initialize(&config, storage, source));

    // Initial load runs in the background; the ticker stays idle until it lands
    let loader = core.clone();
    tokio::spawn(async move {
        if let Err(e) = loader.load_projects().await {
            tracing::error!(error = %e, "Initial project load failed");
        }
    });

    if config.features.real_time_updates {
        core.start_live_feed();
    }

    // Build router (presentation layer)
    let app = router(Arc::new(AppState { core: core.clone() }));

    // Start server
    let addr: SocketAddr = config.server.bind_addr.parse()?;
    tracing::info!(%addr, "Starting project dashboard service");

    axum::serve(tokio::net::TcpListener::bind(addr).await?, app)
        .with_graceful_shutdown(shutdown_after(ctrl_c(), core))
        .await?;

    Ok(())
}

async fn ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
}
