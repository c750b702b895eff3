//! Bridge protocol core.
//!
//! Builds outbound envelopes, writes them to the injected channel and
//! demultiplexes inbound responses back to the [`PendingRegistry`].
//!
//! # Request Lifecycle
//!
//! 1. Channel checks (synchronous, before any await)
//! 2. Fresh [`RequestId`], envelope built and registered
//! 3. Envelope serialized and written; on failure the entry is removed
//! 4. Caller awaits [`PendingResponse`] until the host answers
//!
//! No timeout applies unless one is configured: a request stays pending
//! until the host delivers a matching response.

// ============================================================================
// Imports
// ============================================================================

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;

use parking_lot::RwLock;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::timeout;
use tracing::{debug, error, trace, warn};

use crate::error::{Error, Result};
use crate::identifiers::RequestId;
use crate::protocol::{Envelope, HostEvent, Operation, RawMessage, ResponseEnvelope};

use super::channel::OutboundChannel;
use super::registry::{CompletionReceiver, PendingRegistry};

// ============================================================================
// Constants
// ============================================================================

/// Default capacity of the host event broadcast.
const DEFAULT_EVENT_CAPACITY: usize = 64;

// ============================================================================
// PendingResponse
// ============================================================================

/// Handle to an in-flight request.
///
/// Resolves to the host's [`ResponseEnvelope`], or to the error the host
/// reported.
#[must_use = "a pending response does nothing unless awaited"]
pub struct PendingResponse {
    id: RequestId,
    receiver: CompletionReceiver,
}

impl PendingResponse {
    /// Returns the correlation ID of the request.
    #[inline]
    #[must_use]
    pub fn id(&self) -> RequestId {
        self.id
    }
}

impl fmt::Debug for PendingResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PendingResponse")
            .field("id", &self.id)
            .finish_non_exhaustive()
    }
}

impl Future for PendingResponse {
    type Output = Result<ResponseEnvelope>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        match Pin::new(&mut self.receiver).poll(cx) {
            Poll::Ready(Ok(outcome)) => Poll::Ready(outcome),
            Poll::Ready(Err(_)) => Poll::Ready(Err(Error::ChannelClosed)),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// Bridge
// ============================================================================

/// Shared state behind a [`Bridge`] handle.
struct BridgeInner {
    /// Outstanding requests (shared across re-initializations).
    registry: Arc<PendingRegistry>,
    /// Outbound channel to the host, if attached.
    channel: RwLock<Option<Arc<dyn OutboundChannel>>>,
    /// Host event fan-out.
    events: broadcast::Sender<HostEvent>,
    /// Optional bound applied by [`Bridge::send`].
    request_timeout: Option<Duration>,
}

/// JWB/1.0 protocol endpoint.
///
/// Cheap to clone; all clones share the same registry and channel.
///
/// # Example
///
/// ```ignore
/// let registry = PendingRegistry::shared();
/// let bridge = Bridge::builder()
///     .registry(Arc::clone(&registry))
///     .channel(host_channel)
///     .build()?;
///
/// let response = bridge.send(Operation::GetAppInfo, Value::Null).await?;
/// ```
#[derive(Clone)]
pub struct Bridge {
    inner: Arc<BridgeInner>,
}

impl fmt::Debug for Bridge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bridge")
            .field("pending", &self.inner.registry.len())
            .field("channel_attached", &self.has_channel())
            .field("request_timeout", &self.inner.request_timeout)
            .finish()
    }
}

impl Bridge {
    /// Creates a builder for configuring a bridge.
    #[inline]
    #[must_use]
    pub fn builder() -> BridgeBuilder {
        BridgeBuilder::new()
    }

    /// Returns the registry backing this bridge.
    ///
    /// Pass it to [`BridgeBuilder::registry`] to re-initialize the bridge
    /// without losing in-flight requests.
    #[inline]
    #[must_use]
    pub fn registry(&self) -> Arc<PendingRegistry> {
        Arc::clone(&self.inner.registry)
    }

    /// Attaches (or replaces) the outbound channel.
    pub fn attach_channel(&self, channel: Arc<dyn OutboundChannel>) {
        *self.inner.channel.write() = Some(channel);
        debug!("Outbound channel attached");
    }

    /// Detaches the outbound channel; subsequent sends fail with
    /// [`Error::ChannelUnavailable`].
    pub fn detach_channel(&self) {
        *self.inner.channel.write() = None;
        debug!("Outbound channel detached");
    }

    /// Returns `true` if an outbound channel is attached.
    #[must_use]
    pub fn has_channel(&self) -> bool {
        self.inner.channel.read().is_some()
    }

    /// Returns the number of outstanding requests.
    #[inline]
    #[must_use]
    pub fn pending_count(&self) -> usize {
        self.inner.registry.len()
    }

    /// Subscribes to host events.
    #[must_use]
    pub fn subscribe_events(&self) -> broadcast::Receiver<HostEvent> {
        self.inner.events.subscribe()
    }
}

// ============================================================================
// Bridge - Outbound
// ============================================================================

impl Bridge {
    /// Writes a request to the host and returns a handle to its response.
    ///
    /// All checks and the write happen before this returns.
    ///
    /// # Errors
    ///
    /// - [`Error::ChannelUnavailable`] if no channel is attached
    /// - [`Error::ChannelNotFunctional`] if the channel cannot write
    /// - [`Error::SendFailed`] if serialization or the write fails
    pub fn dispatch(&self, operation: Operation, payload: Value) -> Result<PendingResponse> {
        let channel = self
            .inner
            .channel
            .read()
            .clone()
            .ok_or(Error::ChannelUnavailable)?;

        if !channel.is_functional() {
            return Err(Error::ChannelNotFunctional);
        }

        let envelope = Envelope::new(operation, payload);
        let id = envelope.id;
        let receiver = self.inner.registry.register(id)?;

        let written = envelope
            .to_wire()
            .and_then(|wire| channel.post_message(&wire));

        if let Err(e) = written {
            self.inner.registry.remove(&id);
            warn!(request_id = %id, %operation, error = %e, "Failed to send envelope");
            return Err(match e {
                Error::SendFailed { .. } => e,
                other => Error::send_failed(other.to_string()),
            });
        }

        trace!(request_id = %id, %operation, "Envelope sent");
        Ok(PendingResponse { id, receiver })
    }

    /// Sends a request and waits for the host's response.
    ///
    /// Waits indefinitely unless the bridge was built with a request
    /// timeout.
    ///
    /// # Errors
    ///
    /// Everything [`dispatch`](Self::dispatch) returns, plus
    /// [`Error::HostReported`] for `ERROR` responses and
    /// [`Error::RequestTimeout`] if a configured timeout elapses.
    pub async fn send(&self, operation: Operation, payload: Value) -> Result<ResponseEnvelope> {
        let pending = self.dispatch(operation, payload)?;

        match self.inner.request_timeout {
            Some(limit) => self.wait_bounded(pending, limit).await,
            None => pending.await,
        }
    }

    /// Sends a request and waits at most `limit` for the response.
    ///
    /// On timeout the pending entry is removed, so a late response is
    /// treated as an orphan.
    pub async fn send_with_timeout(
        &self,
        operation: Operation,
        payload: Value,
        limit: Duration,
    ) -> Result<ResponseEnvelope> {
        let pending = self.dispatch(operation, payload)?;
        self.wait_bounded(pending, limit).await
    }

    async fn wait_bounded(
        &self,
        pending: PendingResponse,
        limit: Duration,
    ) -> Result<ResponseEnvelope> {
        let id = pending.id();
        match timeout(limit, pending).await {
            Ok(outcome) => outcome,
            Err(_) => {
                self.inner.registry.remove(&id);
                warn!(request_id = %id, timeout_ms = limit.as_millis() as u64, "Request timed out");
                Err(Error::request_timeout(id, limit.as_millis() as u64))
            }
        }
    }
}

// ============================================================================
// Bridge - Inbound
// ============================================================================

impl Bridge {
    /// Routes a host response to its pending request.
    ///
    /// Accepts serialized text or pre-parsed JSON. Never fails: malformed
    /// messages and orphans are logged and dropped. A response whose `id`
    /// is not a request ID (the host's `"global"` error replies) is an
    /// orphan. Returns `true` if a pending request was completed.
    pub fn handle_response(&self, raw: impl Into<RawMessage>) -> bool {
        let value = match raw.into() {
            RawMessage::Response(response) => return self.complete(response),
            other => match other.into_value() {
                Ok(value) => value,
                Err(e) => {
                    error!(error = %e, "Dropping unparseable response");
                    return false;
                }
            },
        };

        if let Some(id) = value.get("id").and_then(Value::as_str) {
            if id.parse::<RequestId>().is_err() {
                warn!(id, status = ?value.get("status"), "Dropping response for unknown request");
                return false;
            }
        }

        match serde_json::from_value::<ResponseEnvelope>(value) {
            Ok(response) => self.complete(response),
            Err(e) => {
                error!(error = %e, "Dropping unparseable response");
                false
            }
        }
    }

    fn complete(&self, response: ResponseEnvelope) -> bool {
        trace!(request_id = %response.id, status = ?response.status, "Response received");

        if response.is_error() {
            let error = response.to_error();
            self.inner.registry.reject(response.id, error)
        } else {
            self.inner.registry.resolve(response)
        }
    }

    /// Broadcasts a host event to subscribers.
    pub fn handle_event(&self, event: impl Into<HostEvent>) {
        let event = event.into();
        trace!(kind = ?event.kind(), "Host event received");

        if self.inner.events.send(event).is_err() {
            debug!("Host event dropped (no subscribers)");
        }
    }

    /// Routes a message from a stream carrying both responses and events.
    ///
    /// Objects with both `id` and `status` are responses; anything else is
    /// an event.
    pub fn handle_inbound(&self, raw: impl Into<RawMessage>) {
        let value = match raw.into().into_value() {
            Ok(value) => value,
            Err(e) => {
                error!(error = %e, "Dropping unparseable inbound message");
                return;
            }
        };

        if value.get("id").is_some() && value.get("status").is_some() {
            self.handle_response(value);
        } else {
            self.handle_event(value);
        }
    }
}

// ============================================================================
// BridgeBuilder
// ============================================================================

/// Builder for a [`Bridge`].
pub struct BridgeBuilder {
    /// Shared registry; a fresh one is created if unset.
    registry: Option<Arc<PendingRegistry>>,
    /// Outbound channel; may be attached later.
    channel: Option<Arc<dyn OutboundChannel>>,
    /// Bound applied by [`Bridge::send`].
    request_timeout: Option<Duration>,
    /// Host event broadcast capacity.
    event_capacity: usize,
}

impl Default for BridgeBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BridgeBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeBuilder")
            .field("registry", &self.registry)
            .field("channel", &self.channel.is_some())
            .field("request_timeout", &self.request_timeout)
            .field("event_capacity", &self.event_capacity)
            .finish()
    }
}

impl BridgeBuilder {
    /// Creates a builder with defaults: fresh registry, no channel, no
    /// timeout.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: None,
            channel: None,
            request_timeout: None,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        }
    }

    /// Uses an existing registry.
    #[inline]
    #[must_use]
    pub fn registry(mut self, registry: Arc<PendingRegistry>) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Sets the outbound channel.
    #[inline]
    #[must_use]
    pub fn channel(mut self, channel: Arc<dyn OutboundChannel>) -> Self {
        self.channel = Some(channel);
        self
    }

    /// Bounds every [`Bridge::send`] by `limit`.
    #[inline]
    #[must_use]
    pub fn request_timeout(mut self, limit: Duration) -> Self {
        self.request_timeout = Some(limit);
        self
    }

    /// Sets the host event broadcast capacity.
    #[inline]
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Builds the bridge.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] if the event capacity or request timeout is zero.
    pub fn build(self) -> Result<Bridge> {
        if self.event_capacity == 0 {
            return Err(Error::config("event capacity must be greater than zero"));
        }
        if self.request_timeout.is_some_and(|t| t.is_zero()) {
            return Err(Error::config("request timeout must be greater than zero"));
        }

        let (events, _) = broadcast::channel(self.event_capacity);

        Ok(Bridge {
            inner: Arc::new(BridgeInner {
                registry: self.registry.unwrap_or_else(PendingRegistry::shared),
                channel: RwLock::new(self.channel),
                events,
                request_timeout: self.request_timeout,
            }),
        })
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use parking_lot::Mutex;
    use serde_json::json;

    use crate::protocol::ResponseStatus;

    /// Records every write; can be switched to failing or non-functional.
    #[derive(Default)]
    struct RecordingChannel {
        sent: Mutex<Vec<String>>,
        broken: bool,
        failing: bool,
    }

    impl RecordingChannel {
        fn envelopes(&self) -> Vec<Envelope> {
            self.sent
                .lock()
                .iter()
                .map(|s| serde_json::from_str(s).expect("envelope"))
                .collect()
        }
    }

    impl OutboundChannel for RecordingChannel {
        fn post_message(&self, message: &str) -> Result<()> {
            if self.failing {
                return Err(Error::connection("pipe closed"));
            }
            self.sent.lock().push(message.to_string());
            Ok(())
        }

        fn is_functional(&self) -> bool {
            !self.broken
        }
    }

    fn bridge_with(channel: &Arc<RecordingChannel>) -> Bridge {
        Bridge::builder()
            .channel(Arc::clone(channel) as Arc<dyn OutboundChannel>)
            .build()
            .expect("build")
    }

    #[test]
    fn test_no_channel_fails_synchronously() {
        let bridge = Bridge::builder().build().expect("build");
        let err = bridge.dispatch(Operation::InitApp, Value::Null).unwrap_err();
        assert!(matches!(err, Error::ChannelUnavailable));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_non_functional_channel() {
        let channel = Arc::new(RecordingChannel {
            broken: true,
            ..Default::default()
        });
        let bridge = bridge_with(&channel);
        let err = bridge.dispatch(Operation::InitApp, Value::Null).unwrap_err();
        assert!(matches!(err, Error::ChannelNotFunctional));
        assert!(channel.sent.lock().is_empty());
    }

    #[test]
    fn test_write_failure_removes_entry() {
        let channel = Arc::new(RecordingChannel {
            failing: true,
            ..Default::default()
        });
        let bridge = bridge_with(&channel);
        let err = bridge.dispatch(Operation::ReadFile, json!({ "path": "x" })).unwrap_err();

        assert!(matches!(err, Error::SendFailed { ref message } if message.contains("pipe closed")));
        assert_eq!(bridge.pending_count(), 0);
    }

    #[test]
    fn test_dispatch_writes_envelope() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);
        let pending = bridge
            .dispatch(Operation::LoadHtml, json!("home.html"))
            .expect("dispatch");

        let sent = channel.envelopes();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].protocol, "JWB/1.0");
        assert_eq!(sent[0].id, pending.id());
        assert_eq!(sent[0].operation, Operation::LoadHtml);
        assert_eq!(sent[0].payload, json!("home.html"));
        assert_eq!(bridge.pending_count(), 1);
    }

    #[test]
    fn test_pending_until_response_arrives() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);
        let pending = bridge.dispatch(Operation::GetAppInfo, Value::Null).expect("dispatch");
        let id = pending.id();

        let mut task = tokio_test::task::spawn(pending);
        tokio_test::assert_pending!(task.poll());

        assert!(bridge.handle_response(ResponseEnvelope::ok(id, json!({ "name": "demo" }))));
        assert!(task.is_woken());

        let response = tokio_test::assert_ready_ok!(task.poll());
        assert_eq!(response.payload["name"], "demo");
    }

    #[tokio::test]
    async fn test_out_of_order_responses_match_ids() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);

        let first = bridge.dispatch(Operation::ReadFile, json!({ "path": "a" })).expect("a");
        let second = bridge.dispatch(Operation::ReadFile, json!({ "path": "b" })).expect("b");
        let (first_id, second_id) = (first.id(), second.id());

        // Answer in reverse order, as text and as structured JSON.
        let reply_b = json!({ "id": second_id.to_string(), "status": "OK", "payload": "B" });
        let reply_a = json!({ "id": first_id.to_string(), "status": "SUCCESS", "payload": "A" });
        assert!(bridge.handle_response(reply_b.to_string()));
        assert!(bridge.handle_response(reply_a));

        let a = first.await.expect("a resolved");
        let b = second.await.expect("b resolved");
        assert_eq!((a.id, a.payload), (first_id, json!("A")));
        assert_eq!((b.id, b.payload), (second_id, json!("B")));
        assert_eq!(b.status, ResponseStatus::Ok);
    }

    #[tokio::test]
    async fn test_error_status_rejects_with_message() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);
        let pending = bridge.dispatch(Operation::ReadFile, json!({ "path": "x" })).expect("send");

        bridge.handle_response(json!({
            "id": pending.id().to_string(),
            "status": "ERROR",
            "payload": { "code": "FILE_READ_ERROR", "message": "denied" }
        }));

        let err = pending.await.unwrap_err();
        assert!(matches!(err, Error::HostReported { ref message, .. } if message == "denied"));
    }

    #[test]
    fn test_orphan_and_garbage_are_absorbed() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);
        let _pending = bridge.dispatch(Operation::InitApp, Value::Null).expect("send");

        let orphan = json!({ "id": RequestId::generate().to_string(), "status": "OK", "payload": 1 });
        assert!(!bridge.handle_response(orphan));
        assert!(!bridge.handle_response("{{{ not json"));
        assert_eq!(bridge.pending_count(), 1);
    }

    #[test]
    fn test_global_error_reply_is_an_orphan() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);
        let _pending = bridge.dispatch(Operation::InitApp, Value::Null).expect("send");

        let global = json!({
            "id": "global",
            "status": "ERROR",
            "payload": { "code": "INTERNAL_ERROR", "message": "boom" }
        });
        assert!(!bridge.handle_response(global.clone()));
        assert!(!bridge.handle_response(global.to_string()));
        assert_eq!(bridge.pending_count(), 1);
    }

    #[tokio::test]
    async fn test_reinitialized_bridge_resolves_earlier_requests() {
        let channel = Arc::new(RecordingChannel::default());
        let first = bridge_with(&channel);
        let pending = first.dispatch(Operation::InitApp, Value::Null).expect("send");

        let second = Bridge::builder()
            .registry(first.registry())
            .channel(Arc::clone(&channel) as Arc<dyn OutboundChannel>)
            .build()
            .expect("rebuild");
        drop(first);

        assert_eq!(second.pending_count(), 1);
        assert!(second.handle_response(ResponseEnvelope::ok(pending.id(), json!("ready"))));
        assert_eq!(pending.await.expect("resolved").payload, json!("ready"));
    }

    #[tokio::test]
    async fn test_send_with_timeout_removes_entry() {
        let channel = Arc::new(RecordingChannel::default());
        let bridge = bridge_with(&channel);

        let err = bridge
            .send_with_timeout(Operation::GetAppInfo, Value::Null, Duration::from_millis(20))
            .await
            .unwrap_err();

        assert!(err.is_timeout());
        assert_eq!(bridge.pending_count(), 0);
    }

    #[tokio::test]
    async fn test_events_are_broadcast() {
        let bridge = Bridge::builder().build().expect("build");
        let mut rx = bridge.subscribe_events();

        bridge.handle_inbound(r#"{"type":"theme-changed","dark":true}"#);

        let event = rx.recv().await.expect("event");
        assert_eq!(event.kind(), Some("theme-changed"));
    }

    #[test]
    fn test_event_without_subscribers_is_fine() {
        let bridge = Bridge::builder().build().expect("build");
        bridge.handle_event(json!({ "type": "noop" }));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = Bridge::builder().event_capacity(0).build().unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
