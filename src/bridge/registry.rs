//! Pending request registry.
//!
//! Maps request IDs to the completion side of a oneshot channel. Each
//! entry is removed before it is completed, so a response can never be
//! delivered twice.
//!
//! The registry is created once per process and shared by every
//! [`Bridge`](super::Bridge) built from it; rebuilding the bridge keeps
//! earlier requests resolvable.

// ============================================================================
// Imports
// ============================================================================

use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use tokio::sync::oneshot;
use tracing::{debug, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::ResponseEnvelope;

// ============================================================================
// Types
// ============================================================================

/// Completion half handed to the registry.
type Completion = oneshot::Sender<Result<ResponseEnvelope>>;

/// Receiving half returned to the caller of [`PendingRegistry::register`].
pub type CompletionReceiver = oneshot::Receiver<Result<ResponseEnvelope>>;

// ============================================================================
// PendingRegistry
// ============================================================================

/// Process-wide table of outstanding requests.
#[derive(Default)]
pub struct PendingRegistry {
    entries: Mutex<FxHashMap<RequestId, Completion>>,
}

impl fmt::Debug for PendingRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingRegistry")
            .field("pending", &self.len())
            .finish()
    }
}

impl PendingRegistry {
    /// Creates an empty registry.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty registry behind an `Arc`, ready to be shared.
    #[inline]
    #[must_use]
    pub fn shared() -> Arc<Self> {
        Arc::new(Self::new())
    }

    /// Registers a pending entry for `id`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::DuplicateRequest`] if an entry for `id` exists.
    pub fn register(&self, id: RequestId) -> Result<CompletionReceiver> {
        let mut entries = self.entries.lock();
        match entries.entry(id) {
            Entry::Occupied(_) => Err(Error::DuplicateRequest { request_id: id }),
            Entry::Vacant(slot) => {
                let (tx, rx) = oneshot::channel();
                slot.insert(tx);
                trace!(request_id = %id, "Pending entry registered");
                Ok(rx)
            }
        }
    }

    /// Completes the entry matching `response.id` with the response.
    ///
    /// Returns `false` for orphans (no matching entry); those are logged
    /// and discarded.
    pub fn resolve(&self, response: ResponseEnvelope) -> bool {
        let id = response.id;
        self.complete(id, Ok(response))
    }

    /// Completes the entry for `id` with an error.
    ///
    /// Returns `false` for orphans.
    pub fn reject(&self, id: RequestId, error: Error) -> bool {
        self.complete(id, Err(error))
    }

    /// Drops the entry for `id` without completing it.
    pub fn remove(&self, id: &RequestId) -> bool {
        self.entries.lock().remove(id).is_some()
    }

    /// Returns `true` if an entry for `id` is outstanding.
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &RequestId) -> bool {
        self.entries.lock().contains_key(id)
    }

    /// Returns the number of outstanding entries.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns `true` if nothing is outstanding.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    fn complete(&self, id: RequestId, outcome: Result<ResponseEnvelope>) -> bool {
        // Lock released before the sender runs.
        let entry = self.entries.lock().remove(&id);

        let Some(tx) = entry else {
            warn!(request_id = %id, "Orphan response (no pending request)");
            return false;
        };

        if tx.send(outcome).is_err() {
            debug!(request_id = %id, "Caller stopped waiting before completion");
        }
        true
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn test_register_then_resolve() {
        let registry = PendingRegistry::new();
        let id = RequestId::generate();
        let rx = registry.register(id).expect("register");

        assert!(registry.contains(&id));
        assert!(registry.resolve(ResponseEnvelope::ok(id, json!({ "n": 1 }))));
        assert!(registry.is_empty());

        let response = rx.await.expect("completed").expect("ok");
        assert_eq!(response.payload["n"], 1);
    }

    #[tokio::test]
    async fn test_reject_delivers_error() {
        let registry = PendingRegistry::new();
        let id = RequestId::generate();
        let rx = registry.register(id).expect("register");

        assert!(registry.reject(id, Error::host_reported(None, "boom")));
        let outcome = rx.await.expect("completed");
        assert!(matches!(outcome, Err(Error::HostReported { .. })));
    }

    #[test]
    fn test_duplicate_register_fails() {
        let registry = PendingRegistry::new();
        let id = RequestId::generate();
        let _rx = registry.register(id).expect("register");

        let err = registry.register(id).unwrap_err();
        assert!(matches!(err, Error::DuplicateRequest { request_id } if request_id == id));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_orphan_is_discarded() {
        let registry = PendingRegistry::new();
        let other = RequestId::generate();
        let _rx = registry.register(other).expect("register");

        let orphan = ResponseEnvelope::ok(RequestId::generate(), json!(null));
        assert!(!registry.resolve(orphan));
        assert!(!registry.reject(RequestId::generate(), Error::ChannelClosed));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_entry_resolved_at_most_once() {
        let registry = PendingRegistry::new();
        let id = RequestId::generate();
        let _rx = registry.register(id).expect("register");

        assert!(registry.resolve(ResponseEnvelope::ok(id, json!(1))));
        assert!(!registry.resolve(ResponseEnvelope::ok(id, json!(2))));
    }

    #[test]
    fn test_resolve_after_caller_dropped() {
        let registry = PendingRegistry::new();
        let id = RequestId::generate();
        drop(registry.register(id).expect("register"));

        assert!(registry.resolve(ResponseEnvelope::ok(id, json!(null))));
        assert!(registry.is_empty());
    }
}
