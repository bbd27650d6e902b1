//! A minimal cancellation signal threaded through every upstream call and
//! the gas monitor's tick loop.
//!
//! Shape: a shared running flag checked between timer ticks, raced
//! against the timer in a `tokio::select!`. Built on a `tokio::sync::watch`
//! channel rather than a bare `AtomicBool` so in-flight upstream requests
//! can `select!` against cancellation instead of only observing it
//! between ticks.

use tokio::sync::watch;

/// Cheaply cloneable; every clone observes the same cancellation signal.
#[derive(Clone)]
pub struct CancellationToken {
    tx: watch::Sender<bool>,
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self { tx, rx }
    }

    /// Signal cancellation to every clone of this token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    pub fn is_canceled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once `cancel()` has been called on this token or any clone
    /// of it. Safe to `select!` against a future performing I/O.
    pub async fn canceled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Sender half dropped: no further cancellation possible,
                // but also no further progress on this channel; treat as
                // "never" rather than spin.
                std::future::pending::<()>().await;
            }
        }
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
