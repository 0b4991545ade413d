//! # Deadlines and Cancellation
//!
//! Every network suspension point runs under [`with_deadline`]. The owning
//! [`CancelToken`] can end the wait before the deadline does, and a hung
//! provider call never leaves the game stuck in a loading state.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Why an operation did not complete.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeadlineError {
    /// The deadline passed.
    #[error("timed out")]
    TimedOut,
    /// The owner cancelled.
    #[error("cancelled")]
    Cancelled,
}

/// Shared cancellation flag. Clones observe the same flag.
#[derive(Clone, Debug)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
}

impl CancelToken {
    /// Creates an un-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
        }
    }

    /// Fires the token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    /// True once [`Self::cancel`] was called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        *self.sender.borrow()
    }

    /// Completes when the token fires.
    pub async fn cancelled(&self) {
        let mut receiver = self.sender.subscribe();
        // The sender lives as long as `self`, so `changed` cannot fail here.
        while !*receiver.borrow_and_update() {
            if receiver.changed().await.is_err() {
                return;
            }
        }
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

/// Runs `operation` until it completes, `limit` passes, or `cancel` fires.
///
/// # Errors
///
/// [`DeadlineError::TimedOut`] or [`DeadlineError::Cancelled`].
pub async fn with_deadline<F>(
    operation: F,
    limit: Duration,
    cancel: &CancelToken,
) -> Result<F::Output, DeadlineError>
where
    F: Future,
{
    if cancel.is_cancelled() {
        return Err(DeadlineError::Cancelled);
    }
    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(DeadlineError::Cancelled),
        outcome = tokio::time::timeout(limit, operation) => {
            outcome.map_err(|_| DeadlineError::TimedOut)
        }
    }
}
