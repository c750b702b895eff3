//! WebSocket transport to an out-of-process host.
//!
//! Used when the host shell runs in a separate process instead of
//! embedding the front-end and calling into it directly.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────┐                              ┌─────────────────┐
//! │  Bridge (Rust)  │                              │  Native host    │
//! │                 │         WebSocket            │                 │
//! │  HostServer     │◄────────────────────────────►│  WebSocket      │
//! │  → HostLink     │      localhost:PORT          │  client         │
//! └─────────────────┘                              └─────────────────┘
//! ```
//!
//! # Connection Lifecycle
//!
//! 1. `HostServer::bind` - Bind to localhost with random port
//! 2. Launch the host with the WebSocket URL
//! 3. `HostServer::accept` - Wait for the host and attach the link
//! 4. `HostLink` - Carries envelopes out, responses and events in
//! 5. `HostLink::shutdown` - Close the socket
//!
//! # Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | `connection` | Host link and event loop |
//! | `server` | WebSocket server binding and acceptance |

// ============================================================================
// Submodules
// ============================================================================

/// Host link and event loop.
pub mod connection;

/// WebSocket server the host connects to.
pub mod server;

// ============================================================================
// Re-exports
// ============================================================================

pub use connection::HostLink;
pub use server::HostServer;
