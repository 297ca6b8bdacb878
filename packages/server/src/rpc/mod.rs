//! RPC dispatch: forwarding decision, admission control, handler execution,
//! failure mapping, and telemetry.
//!
//! The pipeline per call:
//!
//! 1. **Forwarding test** (`engine`): local-only check, forward-set,
//!    current/closed-ledger inspection, `account_info` queue flag
//! 2. **Busy gate** (`backend::Backend::is_too_busy`, local path only)
//! 3. **Handler lookup** (`registry`)
//! 4. **Admin resolution** (`admin`)
//! 5. **Execution** and **failure mapping** (`engine`, `error`)
//! 6. **Telemetry** (`counters`)

pub mod admin;
pub mod context;
pub mod counters;
pub mod engine;
pub mod error;
pub mod forward;
pub mod queue;
pub mod registry;

pub use admin::{AdminVerifier, DosGuard, IpAdminVerifier, NeverAdminVerifier};
pub use context::{HandlerContext, RequestContext, Session};
pub use counters::Counters;
pub use engine::RpcEngine;
pub use error::HandlerError;
pub use forward::{is_forward_command, Forwarder, LedgerIndexInspector, LedgerSpecInspector};
pub use queue::WorkQueue;
pub use registry::{Handler, HandlerRegistry};
