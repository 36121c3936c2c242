//! Shared utilities for integration testing.

use std::net::SocketAddr;
use std::time::Duration;

use tempfile::TempDir;
use tokio::net::TcpListener;
use url_redirect::config::{RedirectConfig, RouteConfig};
use url_redirect::lifecycle::startup;
use url_redirect::Shutdown;

/// A running service bound to an ephemeral port with its own store file.
pub struct TestService {
    pub addr: SocketAddr,
    pub shutdown: Shutdown,
    // Keeps the store directory alive for the service lifetime.
    _dir: TempDir,
}

impl TestService {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Seed the store with `routes` and start serving.
pub async fn start_service(routes: Vec<RouteConfig>) -> TestService {
    let dir = tempfile::tempdir().unwrap();
    let mut config = RedirectConfig::default();
    config.store.path = dir.path().join("routes.db").display().to_string();
    config.routes = routes;

    let server = startup::prepare(config).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let receiver = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, receiver).await;
    });

    // Give the accept loop a moment to start.
    tokio::time::sleep(Duration::from_millis(50)).await;

    TestService {
        addr,
        shutdown,
        _dir: dir,
    }
}

/// Client that reports redirects instead of following them.
pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .no_proxy()
        .build()
        .unwrap()
}

pub fn seed_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/dbpathname", "https://google.com"),
        RouteConfig::new("/otherdbpath", "https://google.com/robots.txt"),
    ]
}
