//! Single-shot executor-bound alarm.

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::oneshot;

const STATE_IDLE: u8 = 0;
const STATE_ARMED: u8 = 1;
const STATE_FIRED: u8 = 2;
const STATE_CANCELLED: u8 = 3;

/// Lifecycle of a [`Timer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerState {
    /// Constructed but not armed.
    Idle,
    /// Counting down; neither expiry nor cancellation has resolved it yet.
    Armed,
    /// Expired and ran its callback with `was_cancelled = false`.
    Fired,
    /// Cancelled and ran its callback with `was_cancelled = true`.
    Cancelled,
}

/// A single-shot alarm bound to a runtime.
///
/// Armed with a duration and a callback `FnOnce(was_cancelled: bool)`. The
/// callback runs exactly once per arming: on expiry with `false`, or on
/// cancellation with `true`. Which of the two wins is decided by a
/// compare-and-set from the Armed state, so expiry racing a cancel resolves
/// to exactly one invocation.
///
/// Dropping an armed timer cancels it, so a timer never outlives its owner.
pub struct Timer {
    state: Arc<AtomicU8>,
    cancel: Option<oneshot::Sender<()>>,
}

impl Timer {
    /// Creates an idle timer.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(STATE_IDLE)),
            cancel: None,
        }
    }

    /// Arms the timer on the given runtime. A previous arming, if any, is
    /// cancelled first.
    pub fn arm(
        &mut self,
        handle: &Handle,
        after: Duration,
        callback: impl FnOnce(bool) + Send + 'static,
    ) {
        self.cancel();

        let state = Arc::new(AtomicU8::new(STATE_ARMED));
        let (cancel_tx, cancel_rx) = oneshot::channel::<()>();

        let task_state = Arc::clone(&state);
        handle.spawn(async move {
            let was_cancelled = tokio::select! {
                () = tokio::time::sleep(after) => false,
                _ = cancel_rx => true,
            };
            let next = if was_cancelled { STATE_CANCELLED } else { STATE_FIRED };
            if task_state
                .compare_exchange(STATE_ARMED, next, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                callback(was_cancelled);
            }
        });

        self.state = state;
        self.cancel = Some(cancel_tx);
    }

    /// Requests cancellation. The callback runs with `was_cancelled = true`
    /// unless the timer has already fired. Idempotent.
    pub fn cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            // Send fails only if the alarm task already resolved.
            let _ = cancel.send(());
        }
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> TimerState {
        match self.state.load(Ordering::Acquire) {
            STATE_ARMED => TimerState::Armed,
            STATE_FIRED => TimerState::Fired,
            STATE_CANCELLED => TimerState::Cancelled,
            _ => TimerState::Idle,
        }
    }
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        self.cancel();
    }
}
