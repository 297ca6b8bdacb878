//! Stoppable, timeout-capable asynchronous execution framework.
//!
//! Every scheduled or cancellable unit of work in the server is built on
//! these pieces:
//!
//! - [`StopSource`] / [`StopToken`]: cooperative one-shot cancellation
//! - [`Timer`]: single-shot executor-bound alarm
//! - [`ExecutionContext`]: submit work with optional cancellation and timeout,
//!   wrapping the result in an [`Outcome`]
//! - [`Repeater`]: fixed-interval repetition with race-free stop
//!
//! Cancellation is cooperative, never preemptive: a timeout requests stop on
//! the work's token, and the work observes the token at its own checkpoints.

pub mod context;
pub mod repeat;
pub mod stop;
pub mod timer;

pub use context::{ExecError, ExecutionContext, Outcome, StoppableOutcome, Strand};
pub use repeat::Repeater;
pub use stop::{StopSource, StopToken};
pub use timer::{Timer, TimerState};
