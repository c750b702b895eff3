//! WebSocket server the host connects to.
//!
//! # Connection Flow
//!
//! 1. Bind to `localhost:0` (random port)
//! 2. Hand [`HostServer::ws_url`] to the host process
//! 3. The host connects and the socket is upgraded
//! 4. The resulting [`HostLink`] is attached to the bridge as its channel

// ============================================================================
// Imports
// ============================================================================

use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;
use tokio::time::timeout;
use tracing::{debug, info};

use crate::bridge::Bridge;
use crate::error::{Error, Result};

use super::HostLink;

// ============================================================================
// Constants
// ============================================================================

/// Default wait for the host to connect.
const DEFAULT_ACCEPT_TIMEOUT: Duration = Duration::from_secs(30);

// ============================================================================
// HostServer
// ============================================================================

/// A WebSocket server that is bound but not yet connected.
///
/// # Example
///
/// ```ignore
/// use std::net::{IpAddr, Ipv4Addr};
/// use jwb_bridge::transport::HostServer;
///
/// let server = HostServer::bind(IpAddr::V4(Ipv4Addr::LOCALHOST), 0).await?;
/// let ws_url = server.ws_url();
///
/// // Launch the host with ws_url...
///
/// let link = server.accept(bridge.clone()).await?;
/// ```
#[derive(Debug)]
pub struct HostServer {
    listener: TcpListener,
    local_addr: SocketAddr,
    accept_timeout: Duration,
}

impl HostServer {
    /// Binds to `ip:port`. Use port 0 for a random port.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if binding fails.
    pub async fn bind(ip: IpAddr, port: u16) -> Result<Self> {
        let listener = TcpListener::bind(SocketAddr::new(ip, port)).await?;
        let local_addr = listener.local_addr()?;

        debug!(%local_addr, "WebSocket server bound");

        Ok(Self {
            listener,
            local_addr,
            accept_timeout: DEFAULT_ACCEPT_TIMEOUT,
        })
    }

    /// Sets how long [`accept`](Self::accept) waits for the host.
    #[inline]
    #[must_use]
    pub fn with_accept_timeout(mut self, limit: Duration) -> Self {
        self.accept_timeout = limit;
        self
    }

    /// Returns the bound port.
    #[inline]
    #[must_use]
    pub fn port(&self) -> u16 {
        self.local_addr.port()
    }

    /// Returns the bound socket address.
    #[inline]
    #[must_use]
    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Returns the WebSocket URL for this server.
    #[inline]
    #[must_use]
    pub fn ws_url(&self) -> String {
        format!("ws://{}", self.local_addr)
    }

    /// Accepts the host connection and attaches it to `bridge`.
    ///
    /// # Errors
    ///
    /// - [`Error::ConnectionTimeout`] if the host does not connect in time
    /// - [`Error::Connection`] if the WebSocket upgrade fails
    pub async fn accept(self, bridge: Bridge) -> Result<HostLink> {
        let timeout_ms = self.accept_timeout.as_millis() as u64;
        let (stream, addr) = timeout(self.accept_timeout, self.listener.accept())
            .await
            .map_err(|_| Error::connection_timeout(timeout_ms))??;

        debug!(?addr, "TCP connection accepted");

        let ws_stream = tokio_tungstenite::accept_async(stream)
            .await
            .map_err(|e| Error::connection(format!("WebSocket upgrade failed: {e}")))?;

        info!(port = self.local_addr.port(), "Host connected");

        let link = HostLink::spawn(ws_stream, bridge.clone());
        bridge.attach_channel(Arc::new(link.clone()));
        Ok(link)
    }
}

// ============================================================================
// Tests
// ============================================================================
