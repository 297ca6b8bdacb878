//! Quill server: request dispatch for a ledger-data RPC server.
//!
//! Two layers live here:
//!
//! 1. **Execution framework** (`exec`): stoppable, timeout-capable units of
//!    work on a shared runtime, plus a periodic repeater with race-free stop.
//! 2. **Dispatch engine** (`rpc`): classifies a parsed call as
//!    local-vs-forwarded, applies admission control, executes the matched
//!    handler, and reports telemetry.
//!
//! The storage backend, the upstream forwarding client, the transport, and
//! concrete handlers are external collaborators consumed through the traits
//! in `backend` and `rpc`.

pub mod backend;
pub mod cache;
pub mod config;
pub mod exec;
pub mod rpc;
pub mod telemetry;

pub use backend::Backend;
pub use config::ServerConfig;
pub use exec::{ExecutionContext, Outcome, Repeater, StopSource, StopToken, StoppableOutcome};
pub use rpc::engine::RpcEngine;
