//! Fragment router.
//!
//! Maps logical paths to content locators and swaps the fetched content
//! into a single rendering surface.
//!
//! # Content Acquisition
//!
//! | Tier | Source | Falls through on |
//! |------|--------|------------------|
//! | Primary | `{document dir}/{locator}` | non-2xx or network error |
//! | Alternate | locator without its leading `/`, resolved against the location | non-2xx or network error |
//! | Host | [`FileService::load_html`](crate::services::FileService::load_html) | never; failure renders an error notice |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `content` | Body isolation and script extraction |
//! | `document` | Rendering surface abstraction |
//! | `engine` | [`Router`] and the navigation state machine |
//! | `fetch` | Direct content fetching |
//! | `hooks` | Named page-initialization hooks |
//! | `routes` | Route table and change notifications |

// ============================================================================
// Submodules
// ============================================================================

/// Body isolation and script extraction.
pub mod content;

/// Rendering surface abstraction.
pub mod document;

/// Router and navigation state machine.
pub mod engine;

/// Direct content fetching.
pub mod fetch;

/// Named page-initialization hooks.
pub mod hooks;

/// Route table and change notifications.
pub mod routes;

// ============================================================================
// Re-exports
// ============================================================================

pub use content::{PreparedPage, ScriptElement};
pub use document::{
    ContainerTarget, Document, MemoryDocument, MemorySurface, ReplaceMode, Surface,
};
pub use engine::{
    ContentSource, NavigationOutcome, NavigationPhase, Router, RouterBuilder, RouterOptions,
};
pub use fetch::{ContentFetcher, FetchResponse, HttpFetcher};
pub use hooks::{GlobalScope, HookRegistry, PageContext, PageHook};
pub use routes::{Route, RouteChanged, RouteTable};
