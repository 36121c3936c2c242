//! In-memory route table.
//!
//! Holds the set of paths this process knows about. Destinations are kept only
//! so they can be written into the store at startup; request handling always
//! reads them back from the store.

use std::collections::BTreeMap;

use crate::config::RouteConfig;

#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    entries: BTreeMap<String, String>,
}

impl RouteTable {
    /// Build a table from configured routes. Later entries for the same path win.
    pub fn from_config(routes: &[RouteConfig]) -> Self {
        let mut entries = BTreeMap::new();
        for route in routes {
            if let Some(previous) = entries.insert(route.path.clone(), route.destination.clone()) {
                tracing::warn!(
                    path = %route.path,
                    previous = %previous,
                    destination = %route.destination,
                    "Duplicate route path, last entry wins"
                );
            }
        }
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Paths checked against every request.
    pub fn known_paths(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// Seed pairs to write into the store.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}
