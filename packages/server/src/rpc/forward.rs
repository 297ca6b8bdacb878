//! Upstream forwarding boundary and the forward-set decision helpers.

use async_trait::async_trait;
use serde_json::{Map, Value};

/// Methods always routed to the upstream node regardless of parameters:
/// anything that submits transactions or reads open-ledger state this server
/// does not track.
const FORWARD_COMMANDS: [&str; 9] = [
    "submit",
    "submit_multisigned",
    "fee",
    "ledger_closed",
    "ledger_current",
    "ripple_path_find",
    "manifest",
    "channel_authorize",
    "channel_verify",
];

/// Whether the method belongs to the fixed forward-set.
#[must_use]
pub fn is_forward_command(method: &str) -> bool {
    FORWARD_COMMANDS.contains(&method)
}

/// Transport client that relays a request to the upstream node.
#[async_trait]
pub trait Forwarder: Send + Sync {
    /// Forwards the request (already augmented with its `command` field) and
    /// returns the upstream response object. `None` signals forwarding
    /// failure.
    async fn forward(
        &self,
        request: &Map<String, Value>,
        client_ip: &str,
    ) -> Option<Map<String, Value>>;
}

/// Decides whether request parameters address the upstream node's open or
/// just-closed ledger rather than a validated one this server stores.
pub trait LedgerSpecInspector: Send + Sync {
    fn specifies_current_or_closed(&self, params: &Value) -> bool;
}

/// Default inspector for the conventional parameter shape: a `ledger_index`
/// field holding the literal `"current"` or `"closed"`.
pub struct LedgerIndexInspector;

impl LedgerSpecInspector for LedgerIndexInspector {
    fn specifies_current_or_closed(&self, params: &Value) -> bool {
        matches!(
            params.get("ledger_index").and_then(Value::as_str),
            Some("current" | "closed")
        )
    }
}
