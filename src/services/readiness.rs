//! One-shot readiness signal for the host file service.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::time::timeout;
use tracing::debug;

use crate::error::{Error, Result};

use super::FileService;

/// Publishes the [`FileService`] once the host side is usable.
///
/// Consumers await [`wait`](Self::wait) with a bound instead of polling.
/// Cloned handles share the same signal.
#[derive(Clone)]
pub struct ServiceReadiness {
    tx: Arc<watch::Sender<Option<FileService>>>,
}

impl Default for ServiceReadiness {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ServiceReadiness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceReadiness")
            .field("ready", &self.is_ready())
            .finish()
    }
}

impl ServiceReadiness {
    /// Creates an unsignalled readiness handle.
    #[must_use]
    pub fn new() -> Self {
        let (tx, _) = watch::channel(None);
        Self { tx: Arc::new(tx) }
    }

    /// Creates a handle that is already ready.
    #[must_use]
    pub fn ready(service: FileService) -> Self {
        let readiness = Self::new();
        readiness.publish(service);
        readiness
    }

    /// Marks the service as ready and wakes all waiters.
    pub fn publish(&self, service: FileService) {
        self.tx.send_replace(Some(service));
        debug!("File service published");
    }

    /// Returns `true` once a service was published.
    #[inline]
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.tx.borrow().is_some()
    }

    /// Returns the published service, if any.
    #[must_use]
    pub fn current(&self) -> Option<FileService> {
        self.tx.borrow().clone()
    }

    /// Waits up to `limit` for the service.
    ///
    /// # Errors
    ///
    /// [`Error::HostServiceUnavailable`] if nothing is published in time.
    pub async fn wait(&self, limit: Duration) -> Result<FileService> {
        let unavailable = || Error::HostServiceUnavailable {
            timeout_ms: limit.as_millis() as u64,
        };

        let mut rx = self.tx.subscribe();
        match timeout(limit, rx.wait_for(Option::is_some)).await {
            Ok(Ok(ready)) => ready.clone().ok_or_else(unavailable),
            Ok(Err(_)) | Err(_) => Err(unavailable()),
        }
    }
}
