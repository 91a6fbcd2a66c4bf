//! Graceful shutdown handling
//!
//! One-way shutdown flag that can be polled once per cycle or awaited
//! while sleeping.

use std::sync::Arc;
use tokio::sync::watch;

/// Shutdown signal shared between the heartbeat loop and its owner
///
/// Once triggered it stays triggered. Clones observe the same flag.
pub struct ShutdownSignal {
    sender: Arc<watch::Sender<bool>>,
}

impl ShutdownSignal {
    /// Create a new, untriggered shutdown signal
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Trigger shutdown
    ///
    /// Returns true on the first call, false if it was already triggered.
    pub fn trigger(&self) -> bool {
        !self.sender.send_replace(true)
    }

    /// Check whether shutdown has been triggered
    pub fn is_triggered(&self) -> bool {
        *self.sender.borrow()
    }

    /// Wait until shutdown is triggered
    pub async fn wait(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so this only returns once set.
        let _ = receiver.wait_for(|triggered| *triggered).await;
    }
}

impl Clone for ShutdownSignal {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::new()
    }
}
