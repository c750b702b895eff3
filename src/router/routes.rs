//! Route table and navigation notifications.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

// ============================================================================
// Route
// ============================================================================

/// Mapping from a logical path to a content locator.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Route {
    /// Logical key, e.g. `/home`.
    pub path: String,
    /// Resource path relative to the document directory, e.g. `home.html`.
    pub content_locator: String,
}

// ============================================================================
// RouteTable
// ============================================================================

/// Path → locator table. Keys are unique; order is irrelevant.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    routes: FxHashMap<String, String>,
}

impl RouteTable {
    /// Creates an empty table.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces the route for `path`.
    ///
    /// Returns the previous locator, if any.
    pub fn insert(&mut self, path: impl Into<String>, locator: impl Into<String>) -> Option<String> {
        self.routes.insert(path.into(), locator.into())
    }

    /// Returns the locator registered for `path`.
    #[inline]
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&str> {
        self.routes.get(path).map(String::as_str)
    }

    /// Returns the number of routes.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Returns `true` if no route is registered.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Iterates over all routes.
    pub fn iter(&self) -> impl Iterator<Item = Route> + '_ {
        self.routes.iter().map(|(path, locator)| Route {
            path: path.clone(),
            content_locator: locator.clone(),
        })
    }

    /// Returns a copy of the underlying map.
    #[must_use]
    pub fn snapshot(&self) -> FxHashMap<String, String> {
        self.routes.clone()
    }
}

// ============================================================================
// RouteChanged
// ============================================================================

/// Broadcast after every successful render.
///
/// Serializes as `{ "path": ..., "htmlPath": ... }`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteChanged {
    /// Path that was navigated to.
    pub path: String,
    /// Locator that was rendered.
    #[serde(rename = "htmlPath")]
    pub content_locator: String,
}

// ============================================================================
// Tests
// ============================================================================
