//! Cooperative cancellation signal shared between a subscription's
//! registry entry and its stream thread.

use crossbeam_channel::{bounded, select, Receiver, Sender};
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

struct CancelInner {
    cancelled: AtomicBool,
    /// Dropped on cancel, which disconnects `signal` and wakes every waiter.
    trigger: Mutex<Option<Sender<()>>>,
    signal: Receiver<()>,
}

/// A cloneable cancellation token.
///
/// All clones observe the same state. Cancelling is idempotent.
#[derive(Clone)]
pub struct CancelToken {
    inner: Arc<CancelInner>,
}

impl CancelToken {
    /// Create a token in the not-cancelled state.
    pub fn new() -> Self {
        let (trigger, signal) = bounded(0);
        Self {
            inner: Arc::new(CancelInner {
                cancelled: AtomicBool::new(false),
                trigger: Mutex::new(Some(trigger)),
                signal,
            }),
        }
    }

    /// Signal cancellation. Returns true if this call performed the
    /// transition, false if the token was already cancelled.
    pub fn cancel(&self) -> bool {
        if self.inner.cancelled.swap(true, Ordering::SeqCst) {
            return false;
        }
        self.inner.trigger.lock().take();
        true
    }

    /// Check whether cancellation has been signalled.
    pub fn is_cancelled(&self) -> bool {
        self.inner.cancelled.load(Ordering::SeqCst)
    }

    /// Block until cancelled or `timeout` elapses.
    ///
    /// Returns true if the token is cancelled. When cancellation and the
    /// timeout race, cancellation wins.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        if self.is_cancelled() {
            return true;
        }
        select! {
            recv(self.inner.signal) -> _ => true,
            default(timeout) => self.is_cancelled(),
        }
    }

    /// Block until cancelled.
    pub fn wait(&self) {
        // Nothing is ever sent, so this only returns on disconnect.
        let _ = self.inner.signal.recv();
    }
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for CancelToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CancelToken")
            .field("cancelled", &self.is_cancelled())
            .finish()
    }
}
