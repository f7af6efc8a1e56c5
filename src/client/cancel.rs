//! Per-call cancellation.
//!
//! A [`CancelToken`] lets a caller abandon an in-flight call whose result has
//! been superseded, for example a list query re-issued on every keystroke of a
//! filter box.
//!
//! ```
//! use console_client::client::CancelToken;
//!
//! let token = CancelToken::new();
//! let child = token.clone();
//! token.cancel();
//! assert!(child.is_cancelled());
//! ```

use std::sync::Arc;
use tokio::sync::watch;

/// Cloneable cancellation flag; every clone observes the same state.
#[derive(Debug, Clone)]
pub struct CancelToken {
    tx: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// A fresh, uncancelled token.
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        CancelToken { tx: Arc::new(tx) }
    }

    /// Cancel every call racing this token.
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }

    /// Whether [`cancel`](Self::cancel) has been called.
    pub fn is_cancelled(&self) -> bool {
        *self.tx.borrow()
    }

    /// Resolve once the token is cancelled.
    pub async fn cancelled(&self) {
        let mut rx = self.tx.subscribe();
        // The sender lives in `self`, so the channel cannot close while we wait.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}
