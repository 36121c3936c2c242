//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the redirect service as its fallback
//! - Wire up middleware (tracing, timeout, request ID)
//! - Serve on a bound listener until shutdown is signalled

use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::RedirectConfig;
use crate::http::fallback::default_router;
use crate::http::redirect::Redirect;
use crate::http::request::{make_span, propagate_request_id_layer, set_request_id_layer};
use crate::routing::RouteTable;
use crate::store::RouteStore;

/// HTTP server for the redirect service.
pub struct HttpServer {
    router: Router,
    config: RedirectConfig,
}

impl HttpServer {
    /// Create a new HTTP server over an open store and the known route table.
    pub fn new(config: RedirectConfig, store: RouteStore, table: RouteTable) -> Self {
        let router = Self::build_router(&config, store, Arc::new(table));
        Self { router, config }
    }

    /// Build the Axum router with all middleware layers.
    ///
    /// Layers run outermost-last: request ids are set before the trace span
    /// is created, and propagated onto every response.
    #[allow(deprecated)]
    fn build_router(config: &RedirectConfig, store: RouteStore, table: Arc<RouteTable>) -> Router {
        Router::new()
            .fallback_service(Redirect::new(store, table, default_router()))
            .layer(TimeoutLayer::new(Duration::from_secs(
                config.timeouts.request_secs,
            )))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http().make_span_with(make_span))
            .layer(set_request_id_layer())
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            "HTTP server starting"
        );

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &RedirectConfig {
        &self.config
    }

    /// The assembled router, for in-process use.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
