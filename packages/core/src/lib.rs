//! Quill core: shared RPC data model (statuses, warnings, pagination cursors).

pub mod cursor;
pub mod status;
pub mod types;

pub use cursor::{AccountCursor, CursorParseError};
pub use status::{ErrorCode, Status, Warning, WarningCode};
pub use types::{
    MaybeError, RpcResult, API_VERSION_DEFAULT, API_VERSION_MAX, API_VERSION_MIN,
};
