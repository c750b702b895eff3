//! JWB bridge - host bridge and fragment router for embedded web front-ends.
//!
//! This library lets a front-end running inside a native shell talk to
//! that shell over a one-way, string-serialized channel, and swap page
//! fragments into a single rendering surface.
//!
//! # Architecture
//!
//! The bridge follows a request/response model over a message channel:
//!
//! - **Local end (Rust)**: Sends `JWB/1.0` envelopes, correlates responses
//! - **Host (native shell)**: Executes operations, answers by request ID
//!
//! Key design principles:
//!
//! - Every request carries a fresh UUID; responses may arrive in any order
//! - The pending registry is injected and survives bridge re-initialization
//! - The outbound channel is an explicit capability, never an ambient global
//! - Page scripts are replayed as named hooks, never evaluated
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use jwb_bridge::{Bridge, FileService, MemoryDocument, Result, Router, ServiceReadiness};
//! use tokio::sync::mpsc;
//!
//! #[tokio::main]
//! async fn main() -> Result<()> {
//!     // The shell hands us a channel to write envelopes into
//!     let (host_tx, _host_rx) = mpsc::unbounded_channel::<String>();
//!     let bridge = Bridge::builder().channel(Arc::new(host_tx)).build()?;
//!
//!     let services = ServiceReadiness::ready(FileService::new(bridge.clone()));
//!     let document = MemoryDocument::new("file:///opt/app/index.html");
//!     document.add_element("app");
//!
//!     let router = Router::builder()
//!         .document(document)
//!         .services(services)
//!         .build()?;
//!
//!     router.register("/home", "home.html");
//!     router.set_container("app");
//!     router.navigate("/home").await;
//!
//!     Ok(())
//! }
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`bridge`] | Request correlation: [`Bridge`], [`PendingRegistry`] |
//! | [`error`] | Error types and [`Result`] alias |
//! | [`identifiers`] | Type-safe ID wrappers |
//! | [`protocol`] | `JWB/1.0` message types |
//! | [`router`] | Fragment router: [`Router`] |
//! | [`services`] | Typed host service adapters |
//! | [`transport`] | WebSocket link to an out-of-process host |

// ============================================================================
// Modules
// ============================================================================

/// Request correlation over the host channel.
///
/// - [`Bridge`] - Sends envelopes, routes responses and events
/// - [`PendingRegistry`] - Outstanding requests by ID
/// - [`OutboundChannel`] - Capability to write to the host
pub mod bridge;

/// Error types and result aliases.
///
/// All fallible operations return [`Result<T>`] which uses [`Error`].
pub mod error;

/// Type-safe identifiers for bridge entities.
pub mod identifiers;

/// `JWB/1.0` protocol message types.
pub mod protocol;

/// Fragment router.
///
/// Use [`Router::builder()`] to create a configured router.
pub mod router;

/// Typed host service adapters.
pub mod services;

/// WebSocket transport layer.
pub mod transport;

// ============================================================================
// Re-exports
// ============================================================================

// Bridge types
pub use bridge::{Bridge, BridgeBuilder, OutboundChannel, PendingRegistry, PendingResponse};

// Error types
pub use error::{Error, Result};

// Identifier types
pub use identifiers::RequestId;

// Protocol types
pub use protocol::{Envelope, HostEvent, Operation, RawMessage, ResponseEnvelope, ResponseStatus};

// Router types
pub use router::{
    ContainerTarget, ContentFetcher, ContentSource, Document, GlobalScope, HookRegistry,
    HttpFetcher, MemoryDocument, MemorySurface, NavigationOutcome, PageContext, RouteChanged,
    Router, RouterBuilder, RouterOptions, Surface,
};

// Service types
pub use services::{
    AppService, DirEntry, FileContent, FileService, HtmlResource, ServiceReadiness, SpawnedWindow,
    WindowOptions, WindowService, WriteResult,
};

// Transport types
pub use transport::{HostLink, HostServer};
