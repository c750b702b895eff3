//! Outbound envelopes and inbound responses.
//!
//! # Format
//!
//! Outbound (local → host):
//!
//! ```json
//! {
//!   "protocol": "JWB/1.0",
//!   "id": "uuid",
//!   "type": "READ_FILE",
//!   "payload": { "path": "notes.txt" }
//! }
//! ```
//!
//! Inbound (host → local):
//!
//! ```json
//! { "id": "uuid", "status": "OK", "payload": { ... } }
//! { "id": "uuid", "status": "ERROR", "payload": { "code": "...", "message": "..." } }
//! ```

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, Result, UNKNOWN_HOST_ERROR};
use crate::identifiers::RequestId;

use super::Operation;

// ============================================================================
// Constants
// ============================================================================

/// Fixed protocol tag carried by every outbound envelope.
pub const PROTOCOL_TAG: &str = "JWB/1.0";

// ============================================================================
// Envelope
// ============================================================================

/// A request from local end to the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Envelope {
    /// Always [`PROTOCOL_TAG`].
    pub protocol: String,

    /// Unique identifier for request/response correlation.
    pub id: RequestId,

    /// Operation name.
    #[serde(rename = "type")]
    pub operation: Operation,

    /// Operation-specific data.
    pub payload: Value,
}

impl Envelope {
    /// Creates a new envelope with a freshly generated ID.
    #[inline]
    #[must_use]
    pub fn new(operation: Operation, payload: Value) -> Self {
        Self {
            protocol: PROTOCOL_TAG.to_string(),
            id: RequestId::generate(),
            operation,
            payload,
        }
    }

    /// Serializes the envelope to its wire text.
    pub fn to_wire(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

// ============================================================================
// ResponseStatus
// ============================================================================

/// Response status discriminator.
///
/// Only `"ERROR"` marks a failure; any other value the host sends
/// (`"OK"`, `"SUCCESS"`) counts as success.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String")]
pub enum ResponseStatus {
    /// Successful response.
    #[serde(rename = "OK")]
    Ok,
    /// Error response.
    #[serde(rename = "ERROR")]
    Error,
}

impl From<String> for ResponseStatus {
    fn from(value: String) -> Self {
        if value == "ERROR" {
            Self::Error
        } else {
            Self::Ok
        }
    }
}

// ============================================================================
// ResponseEnvelope
// ============================================================================

/// A response from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResponseEnvelope {
    /// Matches the envelope `id`.
    pub id: RequestId,

    /// Outcome.
    pub status: ResponseStatus,

    /// Result data, or `{code, message}` on error.
    #[serde(default)]
    pub payload: Value,
}

impl ResponseEnvelope {
    /// Creates a success response.
    #[must_use]
    pub fn ok(id: RequestId, payload: Value) -> Self {
        Self {
            id,
            status: ResponseStatus::Ok,
            payload,
        }
    }

    /// Creates an error response in the host's `{code, message}` shape.
    #[must_use]
    pub fn error(id: RequestId, code: &str, message: &str) -> Self {
        Self {
            id,
            status: ResponseStatus::Error,
            payload: serde_json::json!({ "code": code, "message": message }),
        }
    }

    /// Returns `true` if this is an error response.
    #[inline]
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.status == ResponseStatus::Error
    }

    /// Builds the error a caller receives for an `ERROR` response.
    #[must_use]
    pub fn to_error(&self) -> Error {
        let message = self
            .payload
            .get("message")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(UNKNOWN_HOST_ERROR);
        let code = self
            .payload
            .get("code")
            .and_then(Value::as_str)
            .map(str::to_string);
        Error::host_reported(code, message)
    }

    /// Extracts the payload, returning the host error for `ERROR` responses.
    pub fn into_payload(self) -> Result<Value> {
        match self.status {
            ResponseStatus::Ok => Ok(self.payload),
            ResponseStatus::Error => Err(self.to_error()),
        }
    }
}

// ============================================================================
// RawMessage
// ============================================================================

/// An inbound message as delivered by the host: either already structured
/// or serialized text still requiring a parse.
#[derive(Debug, Clone, PartialEq)]
pub enum RawMessage {
    /// Serialized JSON text.
    Text(String),
    /// Pre-parsed JSON.
    Structured(Value),
    /// An already decoded response.
    Response(ResponseEnvelope),
}

impl RawMessage {
    /// Parses the message into a JSON value.
    pub fn into_value(self) -> Result<Value> {
        match self {
            Self::Text(text) => serde_json::from_str(&text)
                .map_err(|e| Error::parse_failure(e.to_string())),
            Self::Structured(value) => Ok(value),
            Self::Response(response) => {
                serde_json::to_value(response).map_err(|e| Error::parse_failure(e.to_string()))
            }
        }
    }

    /// Parses the message into a response envelope.
    pub fn into_response(self) -> Result<ResponseEnvelope> {
        if let Self::Response(response) = self {
            return Ok(response);
        }
        let value = self.into_value()?;
        serde_json::from_value(value).map_err(|e| Error::parse_failure(e.to_string()))
    }
}

impl From<&str> for RawMessage {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for RawMessage {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<Value> for RawMessage {
    fn from(value: Value) -> Self {
        Self::Structured(value)
    }
}

impl From<ResponseEnvelope> for RawMessage {
    fn from(response: ResponseEnvelope) -> Self {
        Self::Response(response)
    }
}

// ============================================================================
// Tests
// ============================================================================
