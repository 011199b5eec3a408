use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use crossbeam::channel::{self, Receiver, Sender};

use crate::error::{ClientError, Result};

/// Cooperative cancellation with an optional deadline.
///
/// Clones share the cancellation state. [`CancelToken::with_timeout`] and
/// [`CancelToken::with_deadline`] derive a token that is cancelled together
/// with its parent but carries its own (earlier) deadline.
///
/// [`CancelToken::done`] is a channel that disconnects on cancellation, so a
/// blocking wait can include it in a `crossbeam::select!`.
#[derive(Clone)]
pub struct CancelToken {
    shared: Arc<Shared>,
    deadline: Option<Instant>,
}

struct Shared {
    cancelled: AtomicBool,
    trigger: Mutex<Option<Sender<()>>>,
    done: Receiver<()>,
}

impl CancelToken {
    pub fn new() -> Self {
        let (trigger, done) = channel::bounded(0);
        Self {
            shared: Arc::new(Shared {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                done,
            }),
            deadline: None,
        }
    }

    /// Derive a token that also expires at `deadline`.
    pub fn with_deadline(&self, deadline: Instant) -> Self {
        let deadline = match self.deadline {
            Some(existing) if existing < deadline => existing,
            _ => deadline,
        };
        Self {
            shared: Arc::clone(&self.shared),
            deadline: Some(deadline),
        }
    }

    /// Derive a token that also expires after `timeout`.
    pub fn with_timeout(&self, timeout: Duration) -> Self {
        self.with_deadline(Instant::now() + timeout)
    }

    /// Cancel this token and every clone of it. Idempotent.
    pub fn cancel(&self) {
        if !self.shared.cancelled.swap(true, Ordering::AcqRel) {
            // Dropping the only sender disconnects `done`.
            self.shared
                .trigger
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take();
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.shared.cancelled.load(Ordering::Acquire)
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    pub fn is_expired(&self) -> bool {
        self.deadline.is_some_and(|d| Instant::now() >= d)
    }

    /// `Err(Cancelled)` or `Err(DeadlineExceeded)` once the token has fired.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            return Err(ClientError::Cancelled);
        }
        if self.is_expired() {
            return Err(ClientError::DeadlineExceeded);
        }
        Ok(())
    }

    /// Becomes ready (disconnected) when the token is cancelled.
    pub fn done(&self) -> &Receiver<()> {
        &self.shared.done
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .field("deadline", &self.deadline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_token_passes_check() {
        let token = CancelToken::new();
        assert!(token.check().is_ok());
        assert!(token.deadline().is_none());
    }

    #[test]
    fn cancel_reaches_clones_and_children() {
        let token = CancelToken::new();
        let clone = token.clone();
        let child = token.with_timeout(Duration::from_secs(60));

        clone.cancel();

        assert!(token.is_cancelled());
        assert!(matches!(child.check(), Err(ClientError::Cancelled)));
    }

    #[test]
    fn done_disconnects_on_cancel() {
        let token = CancelToken::new();
        assert!(token.done().try_recv().is_err());

        let waiter = {
            let token = token.clone();
            std::thread::spawn(move || token.done().recv().is_err())
        };
        token.cancel();
        token.cancel();

        assert!(waiter.join().unwrap());
    }

    #[test]
    fn expired_deadline_is_reported() {
        let token = CancelToken::new().with_deadline(Instant::now());
        assert!(matches!(token.check(), Err(ClientError::DeadlineExceeded)));
    }

    #[test]
    fn child_keeps_earlier_parent_deadline() {
        let parent = CancelToken::new().with_timeout(Duration::from_millis(10));
        let child = parent.with_timeout(Duration::from_secs(60));
        assert_eq!(child.deadline(), parent.deadline());
    }
}
