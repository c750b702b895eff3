//! Bridge protocol core.
//!
//! Correlates asynchronous request/response pairs across a one-way,
//! string-serialized channel to the host.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────┐   Envelope (JSON text)   ┌─────────────────┐
//! │  Bridge              │─────────────────────────►│  Native host    │
//! │  → PendingRegistry   │                          │                 │
//! │  ← handle_response   │◄─────────────────────────│                 │
//! │  ← handle_event      │   Response / Event       │                 │
//! └──────────────────────┘                          └─────────────────┘
//! ```
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `channel` | Outbound channel capability |
//! | `core` | Send and inbound dispatch |
//! | `registry` | Pending request registry |

// ============================================================================
// Submodules
// ============================================================================

/// Outbound channel capability.
pub mod channel;

/// Send and inbound dispatch.
pub mod core;

/// Pending request registry.
pub mod registry;

// ============================================================================
// Re-exports
// ============================================================================

pub use self::core::{Bridge, BridgeBuilder, PendingResponse};
pub use channel::OutboundChannel;
pub use registry::PendingRegistry;
