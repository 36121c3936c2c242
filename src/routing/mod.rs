//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     RouteConfig[] → table.rs (dedupe, last wins) → RouteTable
//!
//! Per request:
//!     RouteTable.known_paths()
//!     → store lookup (fresh values)
//!     → matcher.rs (exact path match)
//!     → Some(destination) | None (fallback)
//! ```
//!
//! # Design Decisions
//! - The set of known paths is fixed for the process lifetime
//! - Destinations are never served from memory

pub mod matcher;
pub mod table;

pub use matcher::resolve;
pub use table::RouteTable;
