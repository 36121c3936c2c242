//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID, trace span)
//!     → redirect.rs (store lookup, 302 or delegate)
//!     → fallback.rs (greeting)
//!     → Send to client
//! ```

pub mod fallback;
pub mod redirect;
pub mod request;
pub mod server;

pub use redirect::{Redirect, RedirectLayer};
pub use request::X_REQUEST_ID;
pub use server::HttpServer;
