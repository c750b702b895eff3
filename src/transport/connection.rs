//! WebSocket link to an out-of-process host.
//!
//! A [`HostLink`] is an [`OutboundChannel`] whose writes go out as
//! WebSocket text frames. Every inbound text frame is handed to
//! [`Bridge::handle_inbound`], which tells responses from events.
//!
//! # Event Loop
//!
//! The link spawns a tokio task that handles:
//!
//! - Outgoing envelopes queued by [`OutboundChannel::post_message`]
//! - Incoming responses and events from the host
//! - Orderly shutdown on close, error or [`HostLink::shutdown`]

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::mpsc;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, error, trace, warn};

use crate::bridge::{Bridge, OutboundChannel};
use crate::error::{Error, Result};

// ============================================================================
// LinkCommand
// ============================================================================

/// Internal commands for the event loop.
enum LinkCommand {
    /// Write one serialized envelope.
    Send(String),
    /// Close the socket and stop.
    Shutdown,
}

// ============================================================================
// HostLink
// ============================================================================

/// Live WebSocket connection to the host.
///
/// Cheap to clone; clones share the same socket. Dropping a handle does
/// not close the link, call [`shutdown`](Self::shutdown).
#[derive(Clone)]
pub struct HostLink {
    command_tx: mpsc::UnboundedSender<LinkCommand>,
    open: Arc<AtomicBool>,
}

impl std::fmt::Debug for HostLink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostLink")
            .field("open", &self.is_open())
            .finish()
    }
}

impl HostLink {
    /// Wraps an established WebSocket and spawns its event loop.
    ///
    /// Inbound frames are routed into `bridge`.
    pub fn spawn<S>(ws_stream: WebSocketStream<S>, bridge: Bridge) -> Self
    where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (command_tx, command_rx) = mpsc::unbounded_channel();
        let open = Arc::new(AtomicBool::new(true));

        tokio::spawn(Self::run_event_loop(
            ws_stream,
            command_rx,
            bridge,
            Arc::clone(&open),
        ));

        Self { command_tx, open }
    }

    /// Returns `true` until the socket closes.
    #[inline]
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::Acquire) && !self.command_tx.is_closed()
    }

    /// Closes the link.
    pub fn shutdown(&self) {
        let _ = self.command_tx.send(LinkCommand::Shutdown);
    }

    /// Event loop that handles WebSocket I/O.
    async fn run_event_loop<S>(
        ws_stream: WebSocketStream<S>,
        mut command_rx: mpsc::UnboundedReceiver<LinkCommand>,
        bridge: Bridge,
        open: Arc<AtomicBool>,
    ) where
        S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
    {
        let (mut ws_write, mut ws_read) = ws_stream.split();

        loop {
            tokio::select! {
                message = ws_read.next() => {
                    match message {
                        Some(Ok(Message::Text(text))) => {
                            trace!(len = text.len(), "Frame received");
                            bridge.handle_inbound(text.as_str());
                        }

                        Some(Ok(Message::Close(_))) => {
                            debug!("WebSocket closed by host");
                            break;
                        }

                        Some(Err(e)) => {
                            error!(error = %e, "WebSocket error");
                            break;
                        }

                        None => {
                            debug!("WebSocket stream ended");
                            break;
                        }

                        // Ignore Binary, Ping, Pong
                        _ => {}
                    }
                }

                command = command_rx.recv() => {
                    match command {
                        Some(LinkCommand::Send(frame)) => {
                            if let Err(e) = ws_write.send(Message::Text(frame.into())).await {
                                warn!(error = %e, "Failed to write frame");
                                break;
                            }
                            trace!("Frame sent");
                        }

                        Some(LinkCommand::Shutdown) => {
                            debug!("Shutdown requested");
                            let _ = ws_write.close().await;
                            break;
                        }

                        None => {
                            debug!("All link handles dropped");
                            break;
                        }
                    }
                }
            }
        }

        open.store(false, Ordering::Release);

        let pending = bridge.pending_count();
        if pending > 0 {
            warn!(pending, "Link closed with requests outstanding");
        }

        debug!("Event loop terminated");
    }
}

impl OutboundChannel for HostLink {
    fn post_message(&self, message: &str) -> Result<()> {
        if !self.is_open() {
            return Err(Error::send_failed("host link closed"));
        }
        self.command_tx
            .send(LinkCommand::Send(message.to_string()))
            .map_err(|_| Error::send_failed("host link closed"))
    }

    fn is_functional(&self) -> bool {
        self.is_open()
    }
}

// ============================================================================
// Tests
// ============================================================================
