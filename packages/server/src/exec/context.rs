//! Execution contexts: submit units of work with optional cancellation and
//! timeout, and observe their outcome through a uniform handle.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use super::stop::{StopSource, StopToken};
use super::timer::Timer;

/// Context-level failure of a submitted unit of work. Carries no value from
/// the work itself; the work either never ran or did not run to completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ExecError {
    /// The executor was shut down before the work completed.
    #[error("executor shut down before the work completed")]
    Shutdown,
    /// The work panicked; the panic was contained at the context boundary.
    #[error("the submitted work panicked")]
    Panicked,
}

enum Inner<T> {
    Task(JoinHandle<T>),
    Serial(oneshot::Receiver<T>),
}

/// Handle to a submitted unit of work: resolves to the work's value or to a
/// context failure. Failures surface as values, never as panics.
pub struct Outcome<T> {
    inner: Inner<T>,
}

impl<T> Outcome<T> {
    /// Waits for the work to resolve.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] when the executor was torn down before the work
    /// completed or the work panicked.
    pub async fn wait(self) -> Result<T, ExecError> {
        match self.inner {
            Inner::Task(handle) => handle.await.map_err(|e| {
                if e.is_panic() {
                    ExecError::Panicked
                } else {
                    ExecError::Shutdown
                }
            }),
            Inner::Serial(rx) => rx.await.map_err(|_| ExecError::Shutdown),
        }
    }
}

/// An [`Outcome`] that additionally exposes the stop source used for the
/// submission, letting the caller request early cancellation after the fact.
pub struct StoppableOutcome<T> {
    outcome: Outcome<T>,
    stop: StopSource,
}

impl<T> StoppableOutcome<T> {
    /// Requests cooperative cancellation of the submitted work.
    pub fn request_stop(&self) -> bool {
        self.stop.request_stop()
    }

    /// The stop source driving this submission.
    #[must_use]
    pub fn stop_source(&self) -> &StopSource {
        &self.stop
    }

    /// Waits for the work to resolve. A stopped action still resolves with
    /// whatever value it returned at its cancellation checkpoint.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] when the executor was torn down before the work
    /// completed or the work panicked.
    pub async fn wait(self) -> Result<T, ExecError> {
        self.outcome.wait().await
    }
}

/// Binds work submission to a runtime.
///
/// Each submission creates at most one [`Timer`] and one [`StopSource`];
/// both are resolved when the outcome is produced (completion cancels a
/// still-armed timeout timer).
#[derive(Debug, Clone)]
pub struct ExecutionContext {
    handle: Handle,
}

impl ExecutionContext {
    /// Creates a context bound to the given runtime handle.
    #[must_use]
    pub fn new(handle: Handle) -> Self {
        Self { handle }
    }

    /// Creates a context bound to the ambient runtime.
    ///
    /// # Panics
    ///
    /// Panics outside a tokio runtime, like [`Handle::current`].
    #[must_use]
    pub fn current() -> Self {
        Self::new(Handle::current())
    }

    /// Submits a plain action.
    pub fn run<F, Fut, T>(&self, action: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        Outcome {
            inner: Inner::Task(self.handle.spawn(async move { action().await })),
        }
    }

    /// Submits a plain action with a timeout timer armed alongside it.
    ///
    /// The action has no stop token to observe, so the expired timer cannot
    /// abort work that is already running; it only resolves the timeout
    /// infrastructure. Use [`run_stoppable`](Self::run_stoppable) when the
    /// work can cooperate.
    pub fn run_with_timeout<F, Fut, T>(&self, timeout: Duration, action: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let handle = self.handle.clone();
        Outcome {
            inner: Inner::Task(self.handle.spawn(async move {
                // The stop source has no observer here; expiry resolves the
                // timer but cannot reach into the running action.
                let timer_source = StopSource::new();
                let mut timer = Timer::new();
                timer.arm(&handle, timeout, move |was_cancelled| {
                    if !was_cancelled {
                        timer_source.request_stop();
                    }
                });

                let value = action().await;
                timer.cancel();
                value
            })),
        }
    }

    /// Submits a cancellation-aware action. The action receives a
    /// [`StopToken`] and is expected to observe it at its own cooperative
    /// checkpoints; the framework never preempts it. If `timeout` is given,
    /// a timer requests stop on expiry.
    pub fn run_stoppable<F, Fut, T>(
        &self,
        timeout: Option<Duration>,
        action: F,
    ) -> StoppableOutcome<T>
    where
        F: FnOnce(StopToken) -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let source = StopSource::new();
        let token = source.token();
        let timer_source = source.clone();
        let handle = self.handle.clone();

        let task = self.handle.spawn(async move {
            let mut timer = Timer::new();
            if let Some(after) = timeout {
                timer.arm(&handle, after, move |was_cancelled| {
                    if !was_cancelled {
                        timer_source.request_stop();
                    }
                });
            }

            let value = action(token).await;
            timer.cancel();
            value
        });

        StoppableOutcome {
            outcome: Outcome {
                inner: Inner::Task(task),
            },
            stop: source,
        }
    }

    /// Creates a serialized lane on this context: submissions to the strand
    /// run strictly in submission order and never overlap.
    #[must_use]
    pub fn strand(&self) -> Strand {
        Strand::new(&self.handle)
    }
}

type SerialJob = Pin<Box<dyn Future<Output = ()> + Send>>;

/// A serialized lane: a FIFO driver task awaits each submitted job to
/// completion before starting the next one. Across different strands there
/// is no ordering guarantee.
#[derive(Clone)]
pub struct Strand {
    jobs: mpsc::UnboundedSender<SerialJob>,
}

impl Strand {
    fn new(handle: &Handle) -> Self {
        let (jobs, mut rx) = mpsc::unbounded_channel::<SerialJob>();
        handle.spawn(async move {
            while let Some(job) = rx.recv().await {
                job.await;
            }
        });
        Self { jobs }
    }

    /// Submits an action to the lane.
    pub fn run<F, Fut, T>(&self, action: F) -> Outcome<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (tx, rx) = oneshot::channel();
        let job: SerialJob = Box::pin(async move {
            let value = action().await;
            // Receiver may have been dropped; the work still ran.
            let _ = tx.send(value);
        });
        // If the driver is gone the receiver resolves to Shutdown.
        let _ = self.jobs.send(job);
        Outcome {
            inner: Inner::Serial(rx),
        }
    }
}
