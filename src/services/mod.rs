//! Typed host service adapters.
//!
//! Each method issues exactly one bridge request with a fixed operation
//! name and decodes the response payload. Host-side failures arrive as
//! [`Error::HostReported`](crate::Error::HostReported).
//!
//! | Service | Methods |
//! |---------|---------|
//! | [`FileService`] | `load_html`, `read_file`, `write_file`, `list_directory` |
//! | [`WindowService`] | `spawn_window` |
//! | [`AppService`] | `get_init_data`, `get_app_info` |
//!
//! [`ServiceReadiness`] lets the shell announce when the file service is
//! usable, so late consumers can await it instead of polling.

// ============================================================================
// Imports
// ============================================================================

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::bridge::Bridge;
use crate::error::Result;
use crate::protocol::Operation;

// ============================================================================
// Submodules
// ============================================================================

mod app;
mod file;
mod readiness;
mod window;

// ============================================================================
// Re-exports
// ============================================================================

pub use app::AppService;
pub use file::{DirEntry, FileContent, FileService, HtmlResource, WriteResult};
pub use readiness::ServiceReadiness;
pub use window::{SpawnedWindow, WindowOptions, WindowService};

// ============================================================================
// Helpers
// ============================================================================

/// Sends one request and decodes its payload.
pub(crate) async fn call<T: DeserializeOwned>(
    bridge: &Bridge,
    operation: Operation,
    payload: Value,
) -> Result<T> {
    let response = bridge.send(operation, payload).await?;
    let payload = response.into_payload()?;
    Ok(serde_json::from_value(payload)?)
}

// ============================================================================
// Tests
// ============================================================================
