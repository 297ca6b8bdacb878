//! Per-call request context and the handler-facing execution context.

use std::sync::Weak;

use serde_json::Value;

/// Boundary trait for the transport connection a call arrived on.
///
/// Dispatch holds only a weak reference: processing a request must never keep
/// a closed connection alive.
pub trait Session: Send + Sync {
    /// Stable identifier of the connection, for logging and feed bookkeeping.
    fn session_id(&self) -> u64;
}

/// Everything dispatch needs to know about one parsed client call. Owned
/// exclusively by the unit of work processing the call.
#[derive(Clone)]
pub struct RequestContext {
    /// Method name as received from the client.
    pub method: String,
    /// Request parameters (a JSON object for well-formed requests).
    pub params: Value,
    /// Originating connection, if the transport exposes one.
    pub session: Option<Weak<dyn Session>>,
    /// Source address of the client.
    pub client_ip: String,
    /// Requested API version; zero means unset.
    pub api_version: u32,
}

impl RequestContext {
    /// Creates a context with no session and an unset API version.
    #[must_use]
    pub fn new(method: impl Into<String>, params: Value, client_ip: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            params,
            session: None,
            client_ip: client_ip.into(),
            api_version: 0,
        }
    }
}

/// Execution context handed to the matched handler, derived per call by the
/// engine (admin flag resolved through the configured verifier).
#[derive(Clone)]
pub struct HandlerContext {
    pub session: Option<Weak<dyn Session>>,
    pub is_admin: bool,
    pub client_ip: String,
    pub api_version: u32,
}
