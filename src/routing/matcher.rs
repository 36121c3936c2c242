//! Redirect decision.
//!
//! # Responsibilities
//! - Compare the request path with the values read from the store
//! - Decide between redirect and fallthrough
//!
//! # Design Decisions
//! - Path matching is exact and case-sensitive (no prefix, no trailing-slash folding)
//! - An empty destination means "no record" and never redirects
//! - Query strings are not part of the match; callers pass `Uri::path()`

use std::collections::HashMap;

/// Return the destination for `request_path`, if the store holds one.
pub fn resolve<'a>(lookup: &'a HashMap<String, String>, request_path: &str) -> Option<&'a str> {
    lookup
        .get(request_path)
        .map(String::as_str)
        .filter(|destination| !destination.is_empty())
}
