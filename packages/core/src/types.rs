//! Shared result types flowing between dispatch and the transport layer.

use serde_json::{Map, Value};

use crate::status::{Status, Warning};

/// Lowest API version clients may request.
pub const API_VERSION_MIN: u32 = 1;
/// Highest API version this server understands.
pub const API_VERSION_MAX: u32 = 2;
/// Version assumed when a request does not specify one.
pub const API_VERSION_DEFAULT: u32 = 1;

/// Handler-facing shorthand: either a value or an error status.
pub type MaybeError<T> = Result<T, Status>;

/// The final result out of the dispatch engine, consumed by the transport
/// layer: either an error status or a successful response object, plus an
/// ordered sequence of warnings.
#[derive(Debug, Clone, PartialEq)]
pub struct RpcResult {
    pub response: Result<Map<String, Value>, Status>,
    pub warnings: Vec<Warning>,
}

impl RpcResult {
    /// Builds a successful result from a response object.
    #[must_use]
    pub fn from_object(response: Map<String, Value>) -> Self {
        Self {
            response: Ok(response),
            warnings: Vec::new(),
        }
    }

    /// Builds an error result from a status.
    #[must_use]
    pub fn from_status(status: Status) -> Self {
        Self {
            response: Err(status),
            warnings: Vec::new(),
        }
    }

    /// Appends a warning entry, preserving insertion order.
    #[must_use]
    pub fn with_warning(mut self, warning: Warning) -> Self {
        self.warnings.push(warning);
        self
    }

    /// Whether this result carries a successful response.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.response.is_ok()
    }
}

impl From<Status> for RpcResult {
    fn from(status: Status) -> Self {
        Self::from_status(status)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::status::{ErrorCode, WarningCode};

    #[test]
    fn object_result_is_success() {
        let mut response = Map::new();
        response.insert("validated".into(), json!(true));
        let result = RpcResult::from_object(response);
        assert!(result.is_success());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn status_result_is_not_success() {
        let result = RpcResult::from_status(Status::new(ErrorCode::UnknownCommand));
        assert!(!result.is_success());
        assert_eq!(
            result.response.unwrap_err().code,
            ErrorCode::UnknownCommand
        );
    }

    #[test]
    fn api_version_constants_are_ordered() {
        assert!(API_VERSION_MIN <= API_VERSION_DEFAULT);
        assert!(API_VERSION_DEFAULT <= API_VERSION_MAX);
    }

    #[test]
    fn maybe_error_carries_either_a_value_or_a_status() {
        let ok: MaybeError<u32> = Ok(7);
        let err: MaybeError<u32> = Err(Status::new(ErrorCode::NotReady));
        assert_eq!(ok.unwrap(), 7);
        assert_eq!(err.unwrap_err().code, ErrorCode::NotReady);
    }

    #[test]
    fn warnings_preserve_insertion_order() {
        let result = RpcResult::from_object(Map::new())
            .with_warning(Warning::new(WarningCode::ReadOnlyServer, "first"))
            .with_warning(Warning::new(WarningCode::RateLimit, "second"));
        assert_eq!(result.warnings[0].message, "first");
        assert_eq!(result.warnings[1].message, "second");
    }
}
