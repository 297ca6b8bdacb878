//! Handler failure kinds and their mapping to wire statuses.

use quill_core::{ErrorCode, Status};

/// Failure kinds a handler can report. The engine maps these to wire
/// statuses at the dispatch boundary; nothing propagates past it.
#[derive(Debug, thiserror::Error)]
pub enum HandlerError {
    /// A domain status the handler already resolved itself.
    #[error("{0}")]
    Status(Status),
    /// Request parameters failed validation inside the handler.
    #[error("invalid parameters: {0}")]
    InvalidParams(String),
    /// The requested account does not exist.
    #[error("account not found: {0}")]
    AccountNotFound(String),
    /// The backend did not answer in time.
    #[error("backend timed out")]
    BackendTimeout,
    /// Any other unexpected failure.
    #[error("internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<Status> for HandlerError {
    fn from(status: Status) -> Self {
        Self::Status(status)
    }
}

impl HandlerError {
    /// Maps the failure kind to the status reported to the client. Clause
    /// order is part of the contract: the first matching kind wins.
    #[must_use]
    pub fn into_status(self) -> Status {
        match self {
            Self::Status(status) => status,
            Self::InvalidParams(message) => {
                Status::with_message(ErrorCode::InvalidParams, message)
            }
            Self::AccountNotFound(message) => {
                Status::with_message(ErrorCode::AccountNotFound, message)
            }
            Self::BackendTimeout => Status::new(ErrorCode::TooBusy),
            Self::Internal(_) => Status::new(ErrorCode::Internal),
        }
    }
}
