//! Process-wide termination flag

use std::sync::Arc;
use tokio::sync::watch;

/// Cooperative stop request shared by the signal handler, the scanner and
/// every worker. Once requested it stays requested.
#[derive(Debug, Clone)]
pub struct Termination {
    tx: Arc<watch::Sender<bool>>,
}

impl Termination {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx: Arc::new(tx) }
    }

    /// Ask everything to stop. Safe to call any number of times.
    pub fn request(&self) {
        self.tx.send_replace(true);
    }

    pub fn is_requested(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolves once termination has been requested
    pub async fn requested(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in self, so the channel cannot close under us
        let _ = rx.wait_for(|stop| *stop).await;
    }
}

impl Default for Termination {
    fn default() -> Self {
        Self::new()
    }
}
