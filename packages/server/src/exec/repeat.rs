//! Fixed-interval repetition with race-free stop.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{oneshot, Notify};

/// Repeats an action at a fixed interval until stopped.
///
/// `stop()` uses a two-phase handshake: it sets the stopping flag and then
/// waits for the scheduler loop to acknowledge. The loop checks the flag in
/// its scheduled slot, before invoking the action, so either the pending slot
/// observes the flag and terminates, or it has already committed to one more
/// invocation which finishes before the acknowledgement. After `stop()`
/// resolves, no further invocation of the action will begin.
///
/// The repeater is reusable: `start()` after `stop()` resets the flag and
/// schedules anew.
pub struct Repeater {
    stopping: Arc<AtomicBool>,
    wake: Arc<Notify>,
    done: Option<oneshot::Receiver<()>>,
}

impl Repeater {
    #[must_use]
    pub fn new() -> Self {
        Self {
            stopping: Arc::new(AtomicBool::new(false)),
            wake: Arc::new(Notify::new()),
            done: None,
        }
    }

    /// Starts repeating `action` every `interval`. The first invocation
    /// happens one interval after the call, not immediately.
    ///
    /// Must be called from within a tokio runtime. Restarting an already
    /// running repeater is a programming error; call [`stop`](Self::stop)
    /// first.
    pub fn start<F>(&mut self, interval: Duration, mut action: F)
    where
        F: FnMut() + Send + 'static,
    {
        self.stopping.store(false, Ordering::Release);
        // Fresh wake channel per run so a permit left over from a previous
        // stop() cannot trigger an early first invocation.
        self.wake = Arc::new(Notify::new());
        let (done_tx, done_rx) = oneshot::channel();
        self.done = Some(done_rx);

        let stopping = Arc::clone(&self.stopping);
        let wake = Arc::clone(&self.wake);
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    () = tokio::time::sleep(interval) => {}
                    () = wake.notified() => {}
                }
                if stopping.load(Ordering::Acquire) {
                    let _ = done_tx.send(());
                    return;
                }
                action();
            }
        });
    }

    /// Stops repeating. Resolves once the scheduler loop has acknowledged the
    /// flag; this waits out at most the in-flight invocation's slot, never an
    /// unbounded amount of future work. Safe to call when not started.
    pub async fn stop(&mut self) {
        self.stopping.store(true, Ordering::Release);
        // notify_one stores a permit, so the loop wakes promptly even if it
        // is not parked on notified() at this instant.
        self.wake.notify_one();
        if let Some(done) = self.done.take() {
            let _ = done.await;
        }
    }
}

impl Default for Repeater {
    fn default() -> Self {
        Self::new()
    }
}
