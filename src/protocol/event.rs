//! Host event notifications.
//!
//! Events are fire-and-forget messages pushed by the host. Unlike
//! responses they carry no correlation ID and expect no reply.

// ============================================================================
// Imports
// ============================================================================

use serde::{Deserialize, Serialize};
use serde_json::Value;

// ============================================================================
// HostEvent
// ============================================================================

/// An uncorrelated notification from the host.
///
/// The body is kept as raw JSON; the conventional shape is
/// `{ "type": "...", ... }` but nothing is enforced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HostEvent(pub Value);

impl HostEvent {
    /// Returns the conventional `type` field, if present.
    #[inline]
    #[must_use]
    pub fn kind(&self) -> Option<&str> {
        self.0.get("type").and_then(Value::as_str)
    }

    /// Returns the raw event body.
    #[inline]
    #[must_use]
    pub fn body(&self) -> &Value {
        &self.0
    }
}

impl From<Value> for HostEvent {
    fn from(value: Value) -> Self {
        Self(value)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind() {
        let event = HostEvent::from(json!({ "type": "window-focused", "windowId": 2 }));
        assert_eq!(event.kind(), Some("window-focused"));
        assert_eq!(event.body()["windowId"], 2);
    }

    #[test]
    fn test_kind_missing() {
        assert_eq!(HostEvent::from(json!([1, 2])).kind(), None);
    }
}
