//! Wire-level statuses and warnings returned to clients.
//!
//! Numeric codes and token strings are part of the client-facing contract and
//! must stay stable across releases.

use std::fmt;

use serde_json::{json, Value};

/// Error codes reportable to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCode {
    /// The server (or its backend) is saturated and cannot take the request.
    TooBusy,
    /// The server is not yet ready to serve requests.
    NotReady,
    /// The requested account does not exist in the queried ledger.
    AccountNotFound,
    /// The requested ledger could not be found.
    LedgerNotFound,
    /// Request parameters failed validation.
    InvalidParams,
    /// The method name is not known to this server.
    UnknownCommand,
    /// The supplied pagination marker is malformed or stale.
    BadMarker,
    /// The request should have been forwarded upstream but forwarding failed.
    FailedToForward,
    /// Unexpected server-side failure.
    Internal,
}

impl ErrorCode {
    /// Stable numeric code for the wire format.
    #[must_use]
    pub fn code(self) -> u32 {
        match self {
            Self::TooBusy => 9,
            Self::NotReady => 13,
            Self::AccountNotFound => 19,
            Self::LedgerNotFound => 21,
            Self::InvalidParams => 31,
            Self::UnknownCommand => 32,
            Self::BadMarker => 41,
            Self::FailedToForward => 90,
            Self::Internal => 73,
        }
    }

    /// Stable token string for the wire format.
    #[must_use]
    pub fn token(self) -> &'static str {
        match self {
            Self::TooBusy => "tooBusy",
            Self::NotReady => "notReady",
            Self::AccountNotFound => "actNotFound",
            Self::LedgerNotFound => "lgrNotFound",
            Self::InvalidParams => "invalidParams",
            Self::UnknownCommand => "unknownCmd",
            Self::BadMarker => "badMarker",
            Self::FailedToForward => "failedToForward",
            Self::Internal => "internal",
        }
    }

    /// Default human-readable message used when a status carries no detail.
    #[must_use]
    pub fn default_message(self) -> &'static str {
        match self {
            Self::TooBusy => "The server is too busy to help you now.",
            Self::NotReady => "Not ready to handle this request.",
            Self::AccountNotFound => "Account not found.",
            Self::LedgerNotFound => "Ledger not found.",
            Self::InvalidParams => "Invalid parameters.",
            Self::UnknownCommand => "Unknown method.",
            Self::BadMarker => "Unacceptable marker.",
            Self::FailedToForward => "Failed to forward request to the upstream node.",
            Self::Internal => "Internal error.",
        }
    }
}

/// An error status returned to the client: a code plus optional detail.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    pub code: ErrorCode,
    pub message: Option<String>,
}

impl Status {
    /// Creates a status carrying the code's default message.
    #[must_use]
    pub fn new(code: ErrorCode) -> Self {
        Self { code, message: None }
    }

    /// Creates a status with a specific human-readable message.
    #[must_use]
    pub fn with_message(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: Some(message.into()),
        }
    }

    /// The message reported to the client.
    #[must_use]
    pub fn message(&self) -> &str {
        self.message
            .as_deref()
            .unwrap_or_else(|| self.code.default_message())
    }

    /// Renders the status as the wire-format JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "error": self.code.token(),
            "error_code": self.code.code(),
            "error_message": self.message(),
        })
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.code.token(), self.message())
    }
}

impl From<ErrorCode> for Status {
    fn from(code: ErrorCode) -> Self {
        Self::new(code)
    }
}

/// Warning identifiers attached to otherwise successful responses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningCode {
    /// Response was served by a read-only ledger-data server.
    ReadOnlyServer,
    /// The requested API version is outdated.
    OutdatedApiVersion,
    /// The client is approaching its rate limit.
    RateLimit,
}

impl WarningCode {
    /// Stable numeric identifier for the wire format.
    #[must_use]
    pub fn id(self) -> u32 {
        match self {
            Self::ReadOnlyServer => 2001,
            Self::OutdatedApiVersion => 2002,
            Self::RateLimit => 2003,
        }
    }
}

/// A single warning entry carried alongside a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Warning {
    pub code: WarningCode,
    pub message: String,
}

impl Warning {
    #[must_use]
    pub fn new(code: WarningCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Renders the warning as the wire-format JSON object.
    #[must_use]
    pub fn to_json(&self) -> Value {
        json!({
            "id": self.code.id(),
            "message": self.message,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_defaults_to_the_code_message() {
        let status = Status::new(ErrorCode::TooBusy);
        assert_eq!(status.message(), "The server is too busy to help you now.");
    }

    #[test]
    fn status_detail_overrides_the_default_message() {
        let status = Status::with_message(ErrorCode::InvalidParams, "missing field 'account'");
        assert_eq!(status.message(), "missing field 'account'");
    }

    #[test]
    fn status_json_carries_token_code_and_message() {
        let status = Status::with_message(ErrorCode::AccountNotFound, "no such account");
        let json = status.to_json();
        assert_eq!(json["error"], "actNotFound");
        assert_eq!(json["error_code"], 19);
        assert_eq!(json["error_message"], "no such account");
    }

    #[test]
    fn error_codes_are_distinct() {
        let all = [
            ErrorCode::TooBusy,
            ErrorCode::NotReady,
            ErrorCode::AccountNotFound,
            ErrorCode::LedgerNotFound,
            ErrorCode::InvalidParams,
            ErrorCode::UnknownCommand,
            ErrorCode::BadMarker,
            ErrorCode::FailedToForward,
            ErrorCode::Internal,
        ];
        let codes: std::collections::HashSet<u32> = all.iter().map(|c| c.code()).collect();
        let tokens: std::collections::HashSet<&str> = all.iter().map(|c| c.token()).collect();
        assert_eq!(codes.len(), all.len());
        assert_eq!(tokens.len(), all.len());
    }

    #[test]
    fn warning_json_carries_id_and_message() {
        let warning = Warning::new(WarningCode::ReadOnlyServer, "served from history");
        let json = warning.to_json();
        assert_eq!(json["id"], 2001);
        assert_eq!(json["message"], "served from history");
    }
}
