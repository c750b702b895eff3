//! Error types for the JWB bridge and router.
//!
//! This module defines all error types used throughout the crate.
//!
//! # Usage
//!
//! All fallible operations return [`Result<T>`] which uses [`Error`]:
//!
//! ```ignore
//! use jwb_bridge::{Error, Result, Operation};
//!
//! async fn example(bridge: &Bridge) -> Result<()> {
//!     let response = bridge.send(Operation::GetAppInfo, Value::Null).await?;
//!     println!("{}", response.payload);
//!     Ok(())
//! }
//! ```
//!
//! # Error Categories
//!
//! | Category | Variants |
//! |----------|----------|
//! | Protocol | [`Error::ChannelUnavailable`], [`Error::ChannelNotFunctional`], [`Error::SendFailed`], [`Error::HostReported`], [`Error::ParseFailure`], [`Error::DuplicateRequest`], [`Error::RequestTimeout`], [`Error::ChannelClosed`] |
//! | Navigation | [`Error::RouteNotFound`], [`Error::SurfaceNotConfigured`], [`Error::ContentFetchFailed`], [`Error::HostServiceUnavailable`], [`Error::HostFallbackFailed`] |
//! | Page hooks | [`Error::HookNotFound`], [`Error::HookFailed`] |
//! | Transport | [`Error::Connection`], [`Error::ConnectionTimeout`] |
//! | Configuration | [`Error::Config`] |
//! | External | [`Error::Io`], [`Error::Json`], [`Error::Url`], [`Error::Http`], [`Error::WebSocket`] |

// ============================================================================
// Imports
// ============================================================================

use std::io::Error as IoError;
use std::result::Result as StdResult;

use thiserror::Error;
use tokio_tungstenite::tungstenite::Error as WsError;

use crate::identifiers::RequestId;

// ============================================================================
// Result Alias
// ============================================================================

/// Result type alias using crate [`enum@Error`].
pub type Result<T> = StdResult<T, Error>;

// ============================================================================
// Constants
// ============================================================================

/// Message used when the host reports an error without a message.
pub(crate) const UNKNOWN_HOST_ERROR: &str = "Unknown error";

// ============================================================================
// Error Enum
// ============================================================================

/// Main error type for the crate.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Protocol Errors
    // ========================================================================
    /// No outbound channel to the host is attached.
    #[error("Host bridge is not available")]
    ChannelUnavailable,

    /// The outbound channel exists but cannot accept writes.
    #[error("Host bridge is not functional")]
    ChannelNotFunctional,

    /// Serializing or writing an envelope failed.
    #[error("Failed to send message: {message}")]
    SendFailed {
        /// Description of the underlying failure.
        message: String,
    },

    /// The host answered with `status = ERROR`.
    #[error("Host reported error: {message}")]
    HostReported {
        /// Machine-readable error code, when the host supplies one.
        code: Option<String>,
        /// Human-readable message.
        message: String,
    },

    /// An inbound message could not be parsed.
    ///
    /// Only used for diagnostics; never delivered to a caller.
    #[error("Failed to parse inbound message: {message}")]
    ParseFailure {
        /// Parser diagnostic.
        message: String,
    },

    /// A pending entry already exists for this request ID.
    #[error("Duplicate pending request: {request_id}")]
    DuplicateRequest {
        /// The conflicting request ID.
        request_id: RequestId,
    },

    /// The caller-imposed wait for a response elapsed.
    #[error("Request {request_id} timed out after {timeout_ms}ms")]
    RequestTimeout {
        /// The request ID that timed out.
        request_id: RequestId,
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    /// The pending entry was dropped without being completed.
    #[error("Channel closed")]
    ChannelClosed,

    // ========================================================================
    // Navigation Errors
    // ========================================================================
    /// No route is registered for the path.
    #[error("Route not found: {path}")]
    RouteNotFound {
        /// The requested path.
        path: String,
    },

    /// `navigate` was called before a container was set.
    #[error("Container not set. Call Router::set_container() first")]
    SurfaceNotConfigured,

    /// Both the primary and the alternate fetch failed.
    #[error("Failed to load {locator}: {reason}")]
    ContentFetchFailed {
        /// Content locator being loaded.
        locator: String,
        /// HTTP status of the last attempt, if one completed.
        status: Option<u16>,
        /// Description of the last failure.
        reason: String,
    },

    /// The host file service never became ready.
    #[error("Host file service not available after {timeout_ms}ms")]
    HostServiceUnavailable {
        /// Milliseconds waited.
        timeout_ms: u64,
    },

    /// Loading through the host failed after the fetch tiers were exhausted.
    #[error("{fetch}. Host fallback also failed: {cause}")]
    HostFallbackFailed {
        /// Content locator being loaded.
        locator: String,
        /// The fetch failure that triggered the fallback.
        fetch: Box<Error>,
        /// The host-side failure.
        cause: Box<Error>,
    },

    // ========================================================================
    // Page Hook Errors
    // ========================================================================
    /// Loaded content declared a hook that is not registered.
    #[error("Page hook not registered: {name}")]
    HookNotFound {
        /// Declared hook name.
        name: String,
    },

    /// A page hook returned an error.
    #[error("Page hook {name} failed: {message}")]
    HookFailed {
        /// Hook name.
        name: String,
        /// Failure description.
        message: String,
    },

    // ========================================================================
    // Transport Errors
    // ========================================================================
    /// WebSocket connection failed.
    #[error("Connection failed: {message}")]
    Connection {
        /// Description of the connection error.
        message: String,
    },

    /// The host did not connect in time.
    #[error("Connection timeout after {timeout_ms}ms")]
    ConnectionTimeout {
        /// Milliseconds waited before timeout.
        timeout_ms: u64,
    },

    // ========================================================================
    // Configuration Errors
    // ========================================================================
    /// Invalid configuration.
    #[error("Configuration error: {message}")]
    Config {
        /// Description of the configuration error.
        message: String,
    },

    // ========================================================================
    // External Errors
    // ========================================================================
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] IoError),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parse error.
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),

    /// HTTP client error.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] WsError),
}

// ============================================================================
// Error Constructors
// ============================================================================

impl Error {
    /// Creates a send failure error.
    #[inline]
    pub fn send_failed(message: impl Into<String>) -> Self {
        Self::SendFailed {
            message: message.into(),
        }
    }

    /// Creates a host-reported error.
    #[inline]
    pub fn host_reported(code: Option<String>, message: impl Into<String>) -> Self {
        Self::HostReported {
            code,
            message: message.into(),
        }
    }

    /// Creates a parse failure error.
    #[inline]
    pub fn parse_failure(message: impl Into<String>) -> Self {
        Self::ParseFailure {
            message: message.into(),
        }
    }

    /// Creates a request timeout error.
    #[inline]
    pub fn request_timeout(request_id: RequestId, timeout_ms: u64) -> Self {
        Self::RequestTimeout {
            request_id,
            timeout_ms,
        }
    }

    /// Creates a route not found error.
    #[inline]
    pub fn route_not_found(path: impl Into<String>) -> Self {
        Self::RouteNotFound { path: path.into() }
    }

    /// Creates a content fetch failure.
    #[inline]
    pub fn content_fetch_failed(
        locator: impl Into<String>,
        status: Option<u16>,
        reason: impl Into<String>,
    ) -> Self {
        Self::ContentFetchFailed {
            locator: locator.into(),
            status,
            reason: reason.into(),
        }
    }

    /// Creates a host fallback failure.
    #[inline]
    pub fn host_fallback_failed(locator: impl Into<String>, fetch: Error, cause: Error) -> Self {
        Self::HostFallbackFailed {
            locator: locator.into(),
            fetch: Box::new(fetch),
            cause: Box::new(cause),
        }
    }

    /// Creates a hook failure error.
    #[inline]
    pub fn hook_failed(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::HookFailed {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a connection error.
    #[inline]
    pub fn connection(message: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
        }
    }

    /// Creates a connection timeout error.
    #[inline]
    pub fn connection_timeout(timeout_ms: u64) -> Self {
        Self::ConnectionTimeout { timeout_ms }
    }

    /// Creates a configuration error.
    #[inline]
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }
}

// ============================================================================
// Error Predicates
// ============================================================================

impl Error {
    /// Returns `true` for errors surfaced to callers of `send`.
    #[inline]
    #[must_use]
    pub fn is_protocol_error(&self) -> bool {
        matches!(
            self,
            Self::ChannelUnavailable
                | Self::ChannelNotFunctional
                | Self::SendFailed { .. }
                | Self::HostReported { .. }
                | Self::ParseFailure { .. }
                | Self::DuplicateRequest { .. }
                | Self::RequestTimeout { .. }
                | Self::ChannelClosed
        )
    }

    /// Returns `true` for errors raised while navigating.
    #[inline]
    #[must_use]
    pub fn is_navigation_error(&self) -> bool {
        matches!(
            self,
            Self::RouteNotFound { .. }
                | Self::SurfaceNotConfigured
                | Self::ContentFetchFailed { .. }
                | Self::HostServiceUnavailable { .. }
                | Self::HostFallbackFailed { .. }
        )
    }

    /// Returns `true` if this is a timeout error.
    #[inline]
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(
            self,
            Self::RequestTimeout { .. }
                | Self::ConnectionTimeout { .. }
                | Self::HostServiceUnavailable { .. }
        )
    }
}

// ============================================================================
// Tests
// ============================================================================
