//! Startup orchestration.
//!
//! # Responsibilities
//! - Seed the store from the configured routes
//! - Open the store for the serving phase
//! - Bind the listener and begin accepting traffic
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - Writes finish before the listener binds, so serving never races a load
//! - Listeners start last (traffic only when ready)

use std::fmt;

use tokio::net::TcpListener;
use tokio::sync::broadcast;

use crate::config::RedirectConfig;
use crate::http::HttpServer;
use crate::routing::RouteTable;
use crate::store::{self, RouteStore, StoreError};

/// Error type for startup failures.
#[derive(Debug)]
pub enum StartupError {
    /// Seeding the store failed.
    Load(StoreError),
    /// Opening the store for serving failed.
    Open(StoreError),
    /// Binding the listener failed.
    Bind(std::io::Error),
    /// The server stopped with an I/O error.
    Serve(std::io::Error),
}

impl fmt::Display for StartupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StartupError::Load(e) => write!(f, "Failed to load routes: {}", e),
            StartupError::Open(e) => write!(f, "Failed to open store: {}", e),
            StartupError::Bind(e) => write!(f, "Failed to bind: {}", e),
            StartupError::Serve(e) => write!(f, "Server error: {}", e),
        }
    }
}

impl std::error::Error for StartupError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StartupError::Load(e) | StartupError::Open(e) => Some(e),
            StartupError::Bind(e) | StartupError::Serve(e) => Some(e),
        }
    }
}

/// Seed the store and build a server ready to accept connections.
pub fn prepare(config: RedirectConfig) -> Result<HttpServer, StartupError> {
    let table = RouteTable::from_config(&config.routes);

    store::load_entries(&config.store.path, table.entries()).map_err(StartupError::Load)?;
    let store = RouteStore::open(&config.store.path).map_err(StartupError::Open)?;

    tracing::info!(
        store = %config.store.path,
        routes = table.len(),
        "Route store ready"
    );

    Ok(HttpServer::new(config, store, table))
}

/// Prepare, bind and serve until `shutdown` fires.
pub async fn run(
    config: RedirectConfig,
    shutdown: broadcast::Receiver<()>,
) -> Result<(), StartupError> {
    let bind_address = config.listener.bind_address.clone();
    let server = prepare(config)?;

    let listener = TcpListener::bind(&bind_address)
        .await
        .map_err(StartupError::Bind)?;
    let local_addr = listener.local_addr().map_err(StartupError::Bind)?;

    tracing::info!(
        address = %local_addr,
        "Listening for connections"
    );

    server
        .run(listener, shutdown)
        .await
        .map_err(StartupError::Serve)
}
