//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! config file (TOML), optional
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → RedirectConfig (validated, immutable)
//!     → apply_overrides (CLI flags, validated again)
//!     → handed to store, routing and http at startup
//! ```
//!
//! # Design Decisions
//! - Config is immutable once loaded; route changes require a restart
//! - All fields have defaults, so running without a file serves the seed routes
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{apply_overrides, load_config, ConfigError};
pub use schema::ListenerConfig;
pub use schema::ObservabilityConfig;
pub use schema::RedirectConfig;
pub use schema::RouteConfig;
pub use schema::StoreConfig;
pub use schema::TimeoutConfig;
pub use validation::{validate_config, ValidationError};
