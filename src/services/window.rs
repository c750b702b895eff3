//! Native window management on the host.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::bridge::Bridge;
use crate::error::Result;
use crate::protocol::Operation;

use super::call;

// ============================================================================
// Constants
// ============================================================================

/// Title used when none is given.
const DEFAULT_TITLE: &str = "New Window";

/// Width used when none is given.
const DEFAULT_WIDTH: u32 = 800;

/// Height used when none is given.
const DEFAULT_HEIGHT: u32 = 600;

// ============================================================================
// WindowOptions
// ============================================================================

/// Options for [`WindowService::spawn_window`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WindowOptions {
    /// Window title.
    pub title: Option<String>,
    /// Width in pixels.
    pub width: Option<u32>,
    /// Height in pixels.
    pub height: Option<u32>,
}

impl WindowOptions {
    /// Creates options with all defaults.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the title.
    #[inline]
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Sets the window size in pixels.
    #[inline]
    #[must_use]
    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = Some(width);
        self.height = Some(height);
        self
    }
}

/// Host acknowledgement of a spawned window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SpawnedWindow {
    /// Whether the window opened.
    pub success: bool,
    /// Content locator loaded in the window.
    pub html_path: String,
    /// Window title.
    pub title: String,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

// ============================================================================
// WindowService
// ============================================================================

/// Window control through the host.
#[derive(Debug, Clone)]
pub struct WindowService {
    bridge: Bridge,
}

impl WindowService {
    /// Creates a window service over `bridge`.
    #[inline]
    #[must_use]
    pub fn new(bridge: Bridge) -> Self {
        Self { bridge }
    }

    /// Opens a new native window showing `locator` (`SPAWN_WINDOW`).
    pub async fn spawn_window(&self, locator: &str, options: WindowOptions) -> Result<SpawnedWindow> {
        call(&self.bridge, Operation::SpawnWindow, spawn_payload(locator, options)).await
    }
}

fn spawn_payload(locator: &str, options: WindowOptions) -> serde_json::Value {
    json!({
        "htmlPath": locator,
        "title": options.title.unwrap_or_else(|| DEFAULT_TITLE.to_string()),
        "width": options.width.unwrap_or(DEFAULT_WIDTH),
        "height": options.height.unwrap_or(DEFAULT_HEIGHT),
    })
}

// ============================================================================
// Tests
// ============================================================================
