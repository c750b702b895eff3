//! Page-initialization hooks.
//!
//! Loaded content cannot carry executable code. Instead an inline script
//! declares a hook by name and the router runs the matching registered
//! function after each render, once per declaration.
//!
//! ```ignore
//! router.hooks().register("init-home", |page| {
//!     page.globals.set("flag", 1);
//!     Ok(())
//! });
//! // home.html: <script data-hook="init-home"></script>
//! ```

// ============================================================================
// Imports
// ============================================================================

use std::any::Any;
use std::fmt;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::Arc;

use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use serde_json::Value;

use crate::error::{Error, Result};

use super::document::Surface;

// ============================================================================
// Types
// ============================================================================

/// A registered page hook.
pub type PageHook = Arc<dyn Fn(&PageContext<'_>) -> Result<()> + Send + Sync>;

// ============================================================================
// GlobalScope
// ============================================================================

/// Shared key/value scope visible to every hook across renders.
#[derive(Clone, Default)]
pub struct GlobalScope {
    values: Arc<RwLock<FxHashMap<String, Value>>>,
}

impl fmt::Debug for GlobalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.values.read().iter()).finish()
    }
}

impl GlobalScope {
    /// Creates an empty scope.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of the value under `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Value> {
        self.values.read().get(key).cloned()
    }

    /// Stores `value` under `key`, returning the previous value.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.write().insert(key.into(), value.into())
    }

    /// Removes `key`.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.values.write().remove(key)
    }

    /// Returns `true` if `key` is set.
    #[must_use]
    pub fn contains(&self, key: &str) -> bool {
        self.values.read().contains_key(key)
    }
}

// ============================================================================
// PageContext
// ============================================================================

/// What a hook sees when it runs.
pub struct PageContext<'a> {
    /// Route path being rendered.
    pub path: &'a str,
    /// Locator the content came from.
    pub content_locator: &'a str,
    /// Surface that received the content.
    pub surface: &'a dyn Surface,
    /// Shared global scope.
    pub globals: &'a GlobalScope,
    /// Zero-based position of the declaring script among the page's scripts.
    pub script_index: usize,
    /// Total scripts on the page.
    pub script_count: usize,
}

// ============================================================================
// HookRegistry
// ============================================================================

/// Named page hooks. Cloned handles share the same table.
#[derive(Clone, Default)]
pub struct HookRegistry {
    hooks: Arc<RwLock<FxHashMap<String, PageHook>>>,
}

impl fmt::Debug for HookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HookRegistry")
            .field("hooks", &self.names())
            .finish()
    }
}

impl HookRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) the hook `name`.
    pub fn register<F>(&self, name: impl Into<String>, hook: F)
    where
        F: Fn(&PageContext<'_>) -> Result<()> + Send + Sync + 'static,
    {
        self.hooks.write().insert(name.into(), Arc::new(hook));
    }

    /// Removes the hook `name`.
    pub fn unregister(&self, name: &str) -> bool {
        self.hooks.write().remove(name).is_some()
    }

    /// Returns `true` if `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.hooks.read().contains_key(name)
    }

    /// Registered hook names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.hooks.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Runs the hook `name`.
    ///
    /// The table lock is released before the hook runs, so hooks may
    /// register or remove hooks.
    ///
    /// A panicking hook is contained and reported as
    /// [`Error::HookFailed`].
    ///
    /// # Errors
    ///
    /// [`Error::HookNotFound`] if `name` is not registered,
    /// [`Error::HookFailed`] if the hook panics, otherwise whatever the hook
    /// returns.
    pub fn run(&self, name: &str, page: &PageContext<'_>) -> Result<()> {
        let hook = self
            .hooks
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::HookNotFound {
                name: name.to_string(),
            })?;

        catch_unwind(AssertUnwindSafe(|| hook(page)))
            .unwrap_or_else(|payload| Err(Error::hook_failed(name, panic_message(&*payload))))
    }
}

/// Best-effort text of a panic payload.
fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "hook panicked".to_string()
    }
}

// ============================================================================
// Tests
// ============================================================================
