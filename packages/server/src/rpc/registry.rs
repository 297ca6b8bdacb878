//! Handler registry: method name to handler lookup, with a local-only marker
//! for methods that must never be forwarded upstream.

use std::sync::Arc;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::Value;

use super::context::HandlerContext;
use super::error::HandlerError;

/// A single RPC method implementation.
///
/// Handlers run inside the calling unit of work; they suspend at their own
/// I/O boundaries and report failures through [`HandlerError`], never by
/// panicking.
#[async_trait]
pub trait Handler: Send + Sync {
    /// Processes the request parameters and produces the response value.
    ///
    /// # Errors
    ///
    /// Returns the failure kind mapped to a wire status by the engine.
    async fn process(&self, params: Value, ctx: &HandlerContext)
        -> Result<Value, HandlerError>;
}

struct Entry {
    handler: Arc<dyn Handler>,
    local_only: bool,
}

/// Lookup table of registered handlers. Population happens at composition
/// time; lookups are lock-free afterwards.
#[derive(Default)]
pub struct HandlerRegistry {
    handlers: DashMap<String, Entry>,
}

impl HandlerRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self {
            handlers: DashMap::new(),
        }
    }

    /// Registers a handler that may still be forwarded when the request asks
    /// for upstream state.
    pub fn register(&self, method: impl Into<String>, handler: impl Handler + 'static) {
        self.handlers.insert(
            method.into(),
            Entry {
                handler: Arc::new(handler),
                local_only: false,
            },
        );
    }

    /// Registers a handler served exclusively by this server; the forwarding
    /// test short-circuits to false for it.
    pub fn register_local_only(
        &self,
        method: impl Into<String>,
        handler: impl Handler + 'static,
    ) {
        self.handlers.insert(
            method.into(),
            Entry {
                handler: Arc::new(handler),
                local_only: true,
            },
        );
    }

    /// Looks up the handler for a method.
    #[must_use]
    pub fn get_handler(&self, method: &str) -> Option<Arc<dyn Handler>> {
        self.handlers
            .get(method)
            .map(|entry| Arc::clone(&entry.handler))
    }

    /// Whether the method is registered.
    #[must_use]
    pub fn contains(&self, method: &str) -> bool {
        self.handlers.contains_key(method)
    }

    /// Whether the method is marked local-only. Unregistered methods are not.
    #[must_use]
    pub fn is_local_only(&self, method: &str) -> bool {
        self.handlers
            .get(method)
            .is_some_and(|entry| entry.local_only)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    struct EchoHandler;

    #[async_trait]
    impl Handler for EchoHandler {
        async fn process(
            &self,
            params: Value,
            _ctx: &HandlerContext,
        ) -> Result<Value, HandlerError> {
            Ok(json!({ "echo": params }))
        }
    }

    fn ctx() -> HandlerContext {
        HandlerContext {
            session: None,
            is_admin: false,
            client_ip: "127.0.0.1".into(),
            api_version: 1,
        }
    }

    #[tokio::test]
    async fn registered_handler_is_found_and_runs() {
        let registry = HandlerRegistry::new();
        registry.register("server_info", EchoHandler);

        assert!(registry.contains("server_info"));
        let handler = registry.get_handler("server_info").unwrap();
        let out = handler.process(json!({"a": 1}), &ctx()).await.unwrap();
        assert_eq!(out["echo"]["a"], 1);
    }

    #[test]
    fn unregistered_method_is_absent() {
        let registry = HandlerRegistry::new();
        assert!(!registry.contains("bogus_method"));
        assert!(registry.get_handler("bogus_method").is_none());
        assert!(!registry.is_local_only("bogus_method"));
    }

    #[test]
    fn local_only_marker_is_tracked_per_method() {
        let registry = HandlerRegistry::new();
        registry.register("account_tx", EchoHandler);
        registry.register_local_only("ledger_diff", EchoHandler);

        assert!(!registry.is_local_only("account_tx"));
        assert!(registry.is_local_only("ledger_diff"));
    }
}
