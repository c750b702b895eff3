//! JWB/1.0 message types.
//!
//! This module defines the message format for communication between the
//! embedded front-end (local end) and the native shell (host).
//!
//! # Protocol Overview
//!
//! | Message Type | Direction | Purpose |
//! |--------------|-----------|---------|
//! | `Envelope` | Local → Host | Operation request |
//! | `ResponseEnvelope` | Host → Local | Operation result, matched by `id` |
//! | `HostEvent` | Host → Local | Uncorrelated notification |
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `envelope` | Envelope, response and raw inbound types |
//! | `event` | Host events |
//! | `operation` | Operation names |

// ============================================================================
// Submodules
// ============================================================================

/// Envelope and response message types.
pub mod envelope;

/// Host event messages.
pub mod event;

/// Operation names.
pub mod operation;

// ============================================================================
// Re-exports
// ============================================================================

pub use envelope::{Envelope, PROTOCOL_TAG, RawMessage, ResponseEnvelope, ResponseStatus};
pub use event::HostEvent;
pub use operation::Operation;
