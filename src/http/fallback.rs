//! Default responder used when no redirect applies.

use axum::routing::any;
use axum::Router;

pub const GREETING: &str = "Hello, world!\n";

/// Router that greets every path and method.
pub fn default_router() -> Router {
    Router::new().route("/", any(hello)).fallback(hello)
}

async fn hello() -> &'static str {
    GREETING
}
