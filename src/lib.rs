//! Store-backed HTTP redirect service library.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod store;

pub use config::schema::RedirectConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use routing::RouteTable;
pub use store::{load_entries, RouteStore, StoreError};
