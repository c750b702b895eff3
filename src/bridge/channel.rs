//! Outbound channel capability.
//!
//! The bridge never reaches for an ambient host object; the shell hands it
//! an [`OutboundChannel`] explicitly. Anything that can accept a string
//! (a WebView `postMessage`, a WebSocket sink, a test double) qualifies.

// ============================================================================
// Imports
// ============================================================================

use tokio::sync::mpsc;

use crate::error::{Error, Result};

// ============================================================================
// OutboundChannel
// ============================================================================

/// One-way, string-serialized channel to the host.
pub trait OutboundChannel: Send + Sync {
    /// Writes one serialized envelope.
    ///
    /// # Errors
    ///
    /// Implementations return an error when the write cannot be performed.
    fn post_message(&self, message: &str) -> Result<()>;

    /// Returns `false` if the channel exists but cannot currently write.
    fn is_functional(&self) -> bool {
        true
    }
}

impl OutboundChannel for mpsc::UnboundedSender<String> {
    fn post_message(&self, message: &str) -> Result<()> {
        self.send(message.to_string())
            .map_err(|_| Error::send_failed("outbound queue closed"))
    }

    fn is_functional(&self) -> bool {
        !self.is_closed()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unbounded_sender_channel() {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        assert!(tx.is_functional());

        tx.post_message("hello").expect("write");
        assert_eq!(rx.try_recv().expect("queued"), "hello");

        drop(rx);
        assert!(!tx.is_functional());
        assert!(matches!(
            tx.post_message("late"),
            Err(Error::SendFailed { .. })
        ));
    }
}
