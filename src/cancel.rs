//! Cancellation signal shared between a caller and its in-flight calls.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;

/// Cloneable cancellation signal.
///
/// Every clone observes the same signal. A fresh `Cancellation` (or
/// `Cancellation::default()`) never fires unless [`cancel`](Self::cancel) is
/// called, so it can be passed to calls that only need the configured
/// request timeout.
#[derive(Debug, Clone)]
pub struct Cancellation {
    signal: Arc<watch::Sender<bool>>,
    timeout: Option<Duration>,
}

impl Default for Cancellation {
    fn default() -> Self {
        Self::new()
    }
}

impl Cancellation {
    pub fn new() -> Self {
        let (signal, _) = watch::channel(false);
        Self {
            signal: Arc::new(signal),
            timeout: None,
        }
    }

    /// Request a per-call timeout. The configured request timeout still
    /// applies when it is shorter.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Fire the signal. Idempotent.
    pub fn cancel(&self) {
        self.signal.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.signal.borrow()
    }

    /// Resolves once the signal fires.
    pub async fn cancelled(&self) {
        let mut rx = self.signal.subscribe();
        // The sender lives as long as `self`, so this only returns once cancelled.
        let _ = rx.wait_for(|cancelled| *cancelled).await;
    }

    /// Effective deadline for a call given the configured upper bound.
    pub(crate) fn deadline(&self, request_timeout: Duration) -> Duration {
        match self.timeout {
            Some(timeout) => timeout.min(request_timeout),
            None => request_timeout,
        }
    }
}
