//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, addresses parse)
//! - Check that every route path is an absolute URL path
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: RedirectConfig → Result<(), Vec<ValidationError>>
//! - Duplicate paths are accepted; the last entry wins

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::RedirectConfig;

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// `listener.bind_address` is not a socket address.
    InvalidBindAddress(String),
    /// `observability.metrics_address` is not a socket address.
    InvalidMetricsAddress(String),
    /// `store.path` is empty.
    EmptyStorePath,
    /// `timeouts.request_secs` is zero.
    ZeroRequestTimeout,
    /// Route path does not start with `/`.
    RelativeRoutePath(String),
    /// Route has no destination.
    EmptyDestination(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidBindAddress(addr) => {
                write!(f, "invalid bind address '{}'", addr)
            }
            ValidationError::InvalidMetricsAddress(addr) => {
                write!(f, "invalid metrics address '{}'", addr)
            }
            ValidationError::EmptyStorePath => write!(f, "store path must not be empty"),
            ValidationError::ZeroRequestTimeout => {
                write!(f, "request timeout must be greater than zero")
            }
            ValidationError::RelativeRoutePath(path) => {
                write!(f, "route path '{}' must start with '/'", path)
            }
            ValidationError::EmptyDestination(path) => {
                write!(f, "route '{}' has an empty destination", path)
            }
        }
    }
}

/// Check a parsed configuration, collecting every problem found.
pub fn validate_config(config: &RedirectConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidBindAddress(
            config.listener.bind_address.clone(),
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::InvalidMetricsAddress(
            config.observability.metrics_address.clone(),
        ));
    }

    if config.store.path.trim().is_empty() {
        errors.push(ValidationError::EmptyStorePath);
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::ZeroRequestTimeout);
    }

    for route in &config.routes {
        if !route.path.starts_with('/') {
            errors.push(ValidationError::RelativeRoutePath(route.path.clone()));
        }
        if route.destination.is_empty() {
            errors.push(ValidationError::EmptyDestination(route.path.clone()));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
