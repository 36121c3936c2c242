//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the redirect
//! service. All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the redirect service.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedirectConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Persistent store settings.
    pub store: StoreConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Path entries written into the store at startup.
    pub routes: Vec<RouteConfig>,
}

impl Default for RedirectConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            store: StoreConfig::default(),
            timeouts: TimeoutConfig::default(),
            observability: ObservabilityConfig::default(),
            routes: default_routes(),
        }
    }
}

fn default_routes() -> Vec<RouteConfig> {
    vec![
        RouteConfig::new("/dbpathname", "https://google.com"),
        RouteConfig::new("/otherdbpath", "https://google.com/robots.txt"),
    ]
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_string(),
        }
    }
}

/// Persistent store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the single-file database.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "urlspath.db".to_string(),
        }
    }
}

/// A single path entry: requests for `path` are sent to `destination`.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct RouteConfig {
    /// Request path to match exactly (e.g., "/docs").
    pub path: String,

    /// Absolute or relative URL placed in the `Location` header.
    pub destination: String,
}

impl RouteConfig {
    pub fn new(path: impl Into<String>, destination: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            destination: destination.into(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_seed_two_routes() {
        let config = RedirectConfig::default();
        assert_eq!(config.listener.bind_address, "0.0.0.0:8000");
        assert_eq!(config.store.path, "urlspath.db");
        assert_eq!(
            config.routes,
            vec![
                RouteConfig::new("/dbpathname", "https://google.com"),
                RouteConfig::new("/otherdbpath", "https://google.com/robots.txt"),
            ]
        );
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: RedirectConfig = toml::from_str(
            r#"
            [listener]
            bind_address = "127.0.0.1:9000"

            [[routes]]
            path = "/docs"
            destination = "https://docs.rs"
            "#,
        )
        .unwrap();

        assert_eq!(config.listener.bind_address, "127.0.0.1:9000");
        assert_eq!(config.store.path, "urlspath.db");
        assert_eq!(config.timeouts.request_secs, 30);
        assert_eq!(config.routes, vec![RouteConfig::new("/docs", "https://docs.rs")]);
    }
}
