//! Cooperative one-shot cancellation.
//!
//! A [`StopSource`] owns the unstopped-to-stopped transition; a [`StopToken`]
//! is a read-only observer of the shared flag. The transition happens at most
//! once, enforced by compare-and-set, and mutation is not reachable through
//! the token.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::Notify;

type StopCallback = Box<dyn FnOnce() + Send>;

struct Shared {
    stopped: AtomicBool,
    notify: Notify,
    /// Single callback slot; the latest registration wins.
    callback: Mutex<Option<StopCallback>>,
}

/// Requests cooperative cancellation. Cloning yields another handle to the
/// same underlying flag.
#[derive(Clone)]
pub struct StopSource {
    shared: Arc<Shared>,
}

impl StopSource {
    #[must_use]
    pub fn new() -> Self {
        Self {
            shared: Arc::new(Shared {
                stopped: AtomicBool::new(false),
                notify: Notify::new(),
                callback: Mutex::new(None),
            }),
        }
    }

    /// Returns a read-only observer of this source's flag.
    #[must_use]
    pub fn token(&self) -> StopToken {
        StopToken {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Requests stop. The first call wins and returns `true`; requesting stop
    /// when already stopped is a no-op returning `false`.
    pub fn request_stop(&self) -> bool {
        if self
            .shared
            .stopped
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return false;
        }

        let callback = self.shared.callback.lock().take();
        if let Some(callback) = callback {
            callback();
        }
        self.shared.notify.notify_waiters();
        true
    }

    /// Whether stop has been requested.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }
}

impl Default for StopSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Read-only observer of a [`StopSource`].
#[derive(Clone)]
pub struct StopToken {
    shared: Arc<Shared>,
}

impl StopToken {
    /// Whether stop has been requested. Work observes this at its own
    /// cooperative checkpoints.
    #[must_use]
    pub fn is_stop_requested(&self) -> bool {
        self.shared.stopped.load(Ordering::Acquire)
    }

    /// Registers a callback invoked at most once when stop is requested,
    /// immediately if stop was already requested. A later registration
    /// replaces an earlier pending one.
    pub fn on_stop(&self, callback: impl FnOnce() + Send + 'static) {
        if self.is_stop_requested() {
            callback();
            return;
        }

        {
            let mut slot = self.shared.callback.lock();
            // Re-check under the lock: request_stop() takes the slot after
            // flipping the flag, so a registration landing here is observed.
            if !self.is_stop_requested() {
                *slot = Some(Box::new(callback));
                return;
            }
        }
        // Stop won the race and already drained the (then-empty) slot.
        callback();
    }

    /// Waits until stop is requested. Returns immediately if it already was.
    pub async fn stopped(&self) {
        while !self.is_stop_requested() {
            let notified = self.shared.notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();
            if self.is_stop_requested() {
                return;
            }
            notified.await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicU32;
    use std::time::Duration;

    use super::*;

    #[test]
    fn transition_happens_at_most_once() {
        let source = StopSource::new();
        assert!(!source.is_stop_requested());
        assert!(source.request_stop());
        assert!(!source.request_stop());
        assert!(source.is_stop_requested());
    }

    #[test]
    fn token_observes_the_shared_flag() {
        let source = StopSource::new();
        let token = source.token();
        assert!(!token.is_stop_requested());
        source.request_stop();
        assert!(token.is_stop_requested());
    }

    #[test]
    fn clones_share_the_flag() {
        let source = StopSource::new();
        let clone = source.clone();
        clone.request_stop();
        assert!(source.is_stop_requested());
    }

    #[test]
    fn callback_fires_once_on_stop() {
        let count = Arc::new(AtomicU32::new(0));
        let source = StopSource::new();
        let token = source.token();

        let seen = Arc::clone(&count);
        token.on_stop(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });

        source.request_stop();
        source.request_stop();
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn callback_fires_immediately_when_already_stopped() {
        let count = Arc::new(AtomicU32::new(0));
        let source = StopSource::new();
        source.request_stop();

        let seen = Arc::clone(&count);
        source.token().on_stop(move || {
            seen.fetch_add(1, Ordering::SeqCst);
        });
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn stopped_wakes_async_waiters() {
        let source = StopSource::new();
        let token = source.token();

        let waiter = tokio::spawn(async move {
            token.stopped().await;
        });

        tokio::time::sleep(Duration::from_millis(10)).await;
        source.request_stop();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should wake after stop")
            .unwrap();
    }

    #[tokio::test]
    async fn stopped_returns_immediately_when_already_stopped() {
        let source = StopSource::new();
        source.request_stop();
        // Must not hang.
        source.token().stopped().await;
    }
}
