//! Semaphore-bounded work queue with whitelist bypass.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::{json, Value};
use tokio::sync::Semaphore;

use crate::exec::Repeater;

/// Admission-controlled entry point for units of work.
///
/// A fixed number of slots bounds queued-plus-running work; a slot is held
/// until the work completes. When no slot is free the submission is declined
/// immediately rather than queued behind the limit. Whitelisted submissions
/// bypass the limit entirely.
pub struct WorkQueue {
    slots: Arc<Semaphore>,
    depth: Arc<AtomicU64>,
    max_size: usize,
}

impl WorkQueue {
    #[must_use]
    pub fn new(max_size: usize) -> Self {
        Self {
            slots: Arc::new(Semaphore::new(max_size)),
            depth: Arc::new(AtomicU64::new(0)),
            max_size,
        }
    }

    /// Submits a unit of work. Returns `false` when the queue declines the
    /// submission; callers must treat that as backpressure, not as a
    /// transient glitch to retry in a loop.
    ///
    /// Must be called from within a tokio runtime.
    pub fn post<F>(&self, work: F, is_whitelisted: bool) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let permit = if is_whitelisted {
            None
        } else {
            match Arc::clone(&self.slots).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    tracing::warn!(max_queue_size = self.max_size, "work queue full, rejecting submission");
                    metrics::counter!("work_queue_rejected_total").increment(1);
                    return false;
                }
            }
        };

        let depth = Arc::clone(&self.depth);
        depth.fetch_add(1, Ordering::Relaxed);
        let accepted_at = Instant::now();

        tokio::spawn(async move {
            metrics::histogram!("work_queue_wait_seconds")
                .record(accepted_at.elapsed().as_secs_f64());
            work.await;
            depth.fetch_sub(1, Ordering::Relaxed);
            drop(permit);
        });
        true
    }

    /// Current number of accepted-but-unfinished units of work.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.depth.load(Ordering::Relaxed)
    }

    /// Snapshot for operator surfaces.
    #[must_use]
    pub fn report(&self) -> Value {
        json!({
            "queued": self.size(),
            "max_queue_size": self.max_size,
        })
    }

    /// Starts periodic depth reporting on the given repeater.
    pub fn start_depth_reporting(&self, repeater: &mut Repeater, interval: Duration) {
        let depth = Arc::clone(&self.depth);
        repeater.start(interval, move || {
            #[allow(clippy::cast_precision_loss)]
            metrics::gauge!("work_queue_depth").set(depth.load(Ordering::Relaxed) as f64);
        });
    }
}
