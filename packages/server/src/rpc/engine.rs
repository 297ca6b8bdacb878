//! The RPC dispatch engine: forward-vs-local classification, admission
//! control, handler execution, and failure mapping.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};

use quill_core::{ErrorCode, RpcResult, Status};

use super::admin::{AdminVerifier, DosGuard};
use super::context::{HandlerContext, RequestContext};
use super::counters::Counters;
use super::error::HandlerError;
use super::forward::{is_forward_command, Forwarder, LedgerSpecInspector};
use super::queue::WorkQueue;
use super::registry::HandlerRegistry;
use crate::backend::Backend;

/// Ties the RPC machinery together. Holds shared references to its
/// collaborators; all of them are owned by the composition root and outlive
/// the engine.
pub struct RpcEngine {
    backend: Arc<dyn Backend>,
    forwarder: Arc<dyn Forwarder>,
    dos_guard: Arc<dyn DosGuard>,
    work_queue: Arc<WorkQueue>,
    counters: Arc<Counters>,
    registry: Arc<HandlerRegistry>,
    admin_verifier: Arc<dyn AdminVerifier>,
    ledger_spec: Arc<dyn LedgerSpecInspector>,
}

impl RpcEngine {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        forwarder: Arc<dyn Forwarder>,
        dos_guard: Arc<dyn DosGuard>,
        work_queue: Arc<WorkQueue>,
        counters: Arc<Counters>,
        registry: Arc<HandlerRegistry>,
        admin_verifier: Arc<dyn AdminVerifier>,
        ledger_spec: Arc<dyn LedgerSpecInspector>,
    ) -> Self {
        Self {
            backend,
            forwarder,
            dos_guard,
            work_queue,
            counters,
            registry,
            admin_verifier,
            ledger_spec,
        }
    }

    /// Main request processor routine. Runs entirely on the calling unit of
    /// work; every failure is mapped to a status here, nothing propagates.
    pub async fn build_response(&self, ctx: &RequestContext) -> RpcResult {
        if self.should_forward(ctx) {
            let mut to_forward = ctx.params.as_object().cloned().unwrap_or_default();
            to_forward.insert("command".to_string(), json!(ctx.method));

            let forwarded = self.forwarder.forward(&to_forward, &ctx.client_ip).await;
            self.notify_forwarded(&ctx.method);

            return match forwarded {
                Some(payload) => RpcResult::from_object(payload),
                None => {
                    tracing::warn!(method = %ctx.method, "failed to forward request upstream");
                    RpcResult::from_status(Status::new(ErrorCode::FailedToForward))
                }
            };
        }

        if self.backend.is_too_busy() {
            tracing::error!("backend is too busy, rejecting request");
            return RpcResult::from_status(Status::new(ErrorCode::TooBusy));
        }

        let Some(handler) = self.registry.get_handler(&ctx.method) else {
            return RpcResult::from_status(Status::new(ErrorCode::UnknownCommand));
        };

        tracing::debug!(method = %ctx.method, "start executing rpc");
        let handler_ctx = HandlerContext {
            session: ctx.session.clone(),
            is_admin: self.admin_verifier.is_admin(&ctx.client_ip),
            client_ip: ctx.client_ip.clone(),
            api_version: ctx.api_version,
        };
        let outcome = handler.process(ctx.params.clone(), &handler_ctx).await;
        tracing::debug!(method = %ctx.method, "finish executing rpc");

        match outcome {
            Ok(Value::Object(response)) => RpcResult::from_object(response),
            Ok(_) => {
                tracing::error!(method = %ctx.method, "handler produced a non-object response");
                RpcResult::from_status(Status::new(ErrorCode::Internal))
            }
            Err(err) => {
                match &err {
                    HandlerError::BackendTimeout => {
                        tracing::error!(method = %ctx.method, "backend timed out");
                    }
                    HandlerError::Internal(source) => {
                        tracing::error!(method = %ctx.method, error = %source, "unexpected handler failure");
                    }
                    _ => {}
                }
                RpcResult::from_status(err.into_status())
            }
        }
    }

    /// Schedules request processing onto the shared work queue. `false`
    /// means the queue declined the submission (backpressure).
    pub fn post<F>(&self, work: F, client_ip: &str) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.work_queue
            .post(work, self.dos_guard.is_whitelisted(client_ip))
    }

    /// Records a completed method execution and its duration.
    pub fn notify_complete(&self, method: &str, duration: Duration) {
        if self.valid_handler(method) {
            self.counters.rpc_complete(method, duration);
        }
    }

    /// Records a failed method execution.
    pub fn notify_errored(&self, method: &str) {
        if self.valid_handler(method) {
            self.counters.rpc_errored(method);
        }
    }

    /// Records a method execution forwarded to the upstream node.
    pub fn notify_forwarded(&self, method: &str) {
        if self.valid_handler(method) {
            self.counters.rpc_forwarded(method);
        }
    }

    /// Whether the name is safe to use as a metrics label: a registered
    /// handler or a forward-set member. Anything else would let spoofed
    /// method names grow the sink without bound.
    #[must_use]
    pub fn valid_handler(&self, method: &str) -> bool {
        self.registry.contains(method) || is_forward_command(method)
    }

    fn should_forward(&self, ctx: &RequestContext) -> bool {
        // Local-only wins over everything else, including forward-set
        // membership.
        if self.registry.is_local_only(&ctx.method) {
            return false;
        }
        if is_forward_command(&ctx.method) {
            return true;
        }
        if self.ledger_spec.specifies_current_or_closed(&ctx.params) {
            return true;
        }
        if ctx.method == "account_info"
            && ctx.params.get("queue").and_then(Value::as_bool) == Some(true)
        {
            return true;
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};

    use async_trait::async_trait;
    use parking_lot::Mutex;
    use serde_json::Map;

    use super::*;
    use crate::rpc::admin::NeverAdminVerifier;
    use crate::rpc::forward::LedgerIndexInspector;
    use crate::rpc::registry::Handler;

    const FORWARD_SET: [&str; 9] = [
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

    struct StaticBackend {
        busy: AtomicBool,
    }

    impl StaticBackend {
        fn idle() -> Self {
            Self {
                busy: AtomicBool::new(false),
            }
        }

        fn busy() -> Self {
            Self {
                busy: AtomicBool::new(true),
            }
        }
    }

    impl Backend for StaticBackend {
        fn is_too_busy(&self) -> bool {
            self.busy.load(Ordering::Relaxed)
        }
    }

    /// Records every forwarded request and replies with a canned payload.
    struct RecordingForwarder {
        requests: Mutex<Vec<Map<String, Value>>>,
        fail: bool,
    }

    impl RecordingForwarder {
        fn replying() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                requests: Mutex::new(Vec::new()),
                fail: true,
            }
        }

        fn request_count(&self) -> usize {
            self.requests.lock().len()
        }
    }

    #[async_trait]
    impl Forwarder for RecordingForwarder {
        async fn forward(
            &self,
            request: &Map<String, Value>,
            _client_ip: &str,
        ) -> Option<Map<String, Value>> {
            self.requests.lock().push(request.clone());
            if self.fail {
                None
            } else {
                let mut payload = Map::new();
                payload.insert("forwarded".to_string(), json!(true));
                Some(payload)
            }
        }
    }

    struct OpenDosGuard;

    impl DosGuard for OpenDosGuard {
        fn is_whitelisted(&self, _client_ip: &str) -> bool {
            false
        }
    }

    struct CountingHandler {
        invocations: Arc<AtomicU32>,
        reply: Value,
    }

    impl CountingHandler {
        fn replying(invocations: Arc<AtomicU32>, reply: Value) -> Self {
            Self { invocations, reply }
        }
    }

    #[async_trait]
    impl Handler for CountingHandler {
        async fn process(
            &self,
            _params: Value,
            _ctx: &HandlerContext,
        ) -> Result<Value, HandlerError> {
            self.invocations.fetch_add(1, Ordering::SeqCst);
            Ok(self.reply.clone())
        }
    }

    struct FailingHandler {
        error: fn() -> HandlerError,
    }

    #[async_trait]
    impl Handler for FailingHandler {
        async fn process(
            &self,
            _params: Value,
            _ctx: &HandlerContext,
        ) -> Result<Value, HandlerError> {
            Err((self.error)())
        }
    }

    struct Fixture {
        engine: RpcEngine,
        forwarder: Arc<RecordingForwarder>,
        registry: Arc<HandlerRegistry>,
        counters: Arc<Counters>,
        invocations: Arc<AtomicU32>,
    }

    fn fixture(backend: StaticBackend, forwarder: RecordingForwarder) -> Fixture {
        let forwarder = Arc::new(forwarder);
        let registry = Arc::new(HandlerRegistry::new());
        let counters = Arc::new(Counters::new());
        let engine = RpcEngine::new(
            Arc::new(backend),
            Arc::clone(&forwarder) as Arc<dyn Forwarder>,
            Arc::new(OpenDosGuard),
            Arc::new(WorkQueue::new(16)),
            Arc::clone(&counters),
            Arc::clone(&registry),
            Arc::new(NeverAdminVerifier),
            Arc::new(LedgerIndexInspector),
        );
        Fixture {
            engine,
            forwarder,
            registry,
            counters,
            invocations: Arc::new(AtomicU32::new(0)),
        }
    }

    fn request(method: &str, params: Value) -> RequestContext {
        RequestContext::new(method, params, "203.0.113.5")
    }

    fn error_code(result: &RpcResult) -> ErrorCode {
        result.response.as_ref().unwrap_err().code
    }

    #[tokio::test]
    async fn forward_set_methods_forward_regardless_of_params() {
        for method in FORWARD_SET {
            // A busy backend proves the forward path never consults the
            // busy gate or the handler table.
            let fx = fixture(StaticBackend::busy(), RecordingForwarder::replying());
            let result = fx
                .engine
                .build_response(&request(method, json!({"ledger_index": "validated"})))
                .await;
            assert!(result.is_success(), "{method} should forward");
            assert_eq!(result.response.unwrap()["forwarded"], true);
            assert_eq!(fx.forwarder.request_count(), 1);
        }
    }

    #[tokio::test]
    async fn forwarded_request_carries_the_method_as_command() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        fx.engine
            .build_response(&request("submit", json!({"tx_blob": "DEADBEEF"})))
            .await;

        let seen = fx.forwarder.requests.lock();
        assert_eq!(seen[0]["command"], "submit");
        assert_eq!(seen[0]["tx_blob"], "DEADBEEF");
    }

    #[tokio::test]
    async fn account_info_forwards_only_on_a_true_queue_flag() {
        for (params, expect_forward) in [
            (json!({"queue": true}), true),
            (json!({"queue": false}), false),
            (json!({}), false),
        ] {
            let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
            let result = fx
                .engine
                .build_response(&request("account_info", params))
                .await;
            if expect_forward {
                assert!(result.is_success());
                assert_eq!(fx.forwarder.request_count(), 1);
            } else {
                // Not registered in this fixture, so the local path reports
                // an unknown command; forwarding must not have happened.
                assert_eq!(error_code(&result), ErrorCode::UnknownCommand);
                assert_eq!(fx.forwarder.request_count(), 0);
            }
        }
    }

    #[tokio::test]
    async fn current_or_closed_ledger_spec_forwards() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        let result = fx
            .engine
            .build_response(&request("ledger_data", json!({"ledger_index": "current"})))
            .await;
        assert!(result.is_success());
        assert_eq!(fx.forwarder.request_count(), 1);
    }

    #[tokio::test]
    async fn local_only_short_circuits_the_forward_set() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        // A method that would otherwise always forward, registered as served
        // locally only.
        fx.registry.register_local_only(
            "submit",
            CountingHandler::replying(Arc::clone(&fx.invocations), json!({"queued": false})),
        );

        let result = fx.engine.build_response(&request("submit", json!({}))).await;

        assert_eq!(fx.forwarder.request_count(), 0);
        assert_eq!(fx.invocations.load(Ordering::SeqCst), 1);
        assert_eq!(result.response.unwrap()["queued"], false);
    }

    #[tokio::test]
    async fn busy_backend_rejects_local_work_before_handler_lookup() {
        let fx = fixture(StaticBackend::busy(), RecordingForwarder::replying());
        fx.registry.register(
            "account_tx",
            CountingHandler::replying(Arc::clone(&fx.invocations), json!({})),
        );

        let result = fx
            .engine
            .build_response(&request("account_tx", json!({})))
            .await;

        assert_eq!(error_code(&result), ErrorCode::TooBusy);
        assert_eq!(fx.invocations.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn busy_backend_does_not_block_forwarding() {
        let fx = fixture(StaticBackend::busy(), RecordingForwarder::replying());
        let result = fx
            .engine
            .build_response(&request("account_info", json!({"queue": true})))
            .await;
        assert!(result.is_success());
        assert_eq!(fx.forwarder.request_count(), 1);
    }

    #[tokio::test]
    async fn unknown_method_reports_unknown_command() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        let result = fx
            .engine
            .build_response(&request("bogus_method", json!({})))
            .await;
        assert_eq!(error_code(&result), ErrorCode::UnknownCommand);
    }

    #[tokio::test]
    async fn forwarder_failure_reports_failed_to_forward() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::failing());
        let result = fx.engine.build_response(&request("fee", json!({}))).await;
        assert_eq!(error_code(&result), ErrorCode::FailedToForward);
        // The forwarding attempt is still counted.
        assert!(fx.counters.has_entry("fee"));
    }

    #[tokio::test]
    async fn handler_failures_map_to_statuses_in_clause_order() {
        let cases: [(fn() -> HandlerError, ErrorCode); 4] = [
            (
                || HandlerError::InvalidParams("missing account".into()),
                ErrorCode::InvalidParams,
            ),
            (
                || HandlerError::AccountNotFound("rXYZ".into()),
                ErrorCode::AccountNotFound,
            ),
            (|| HandlerError::BackendTimeout, ErrorCode::TooBusy),
            (
                || HandlerError::from(anyhow::anyhow!("corrupt index")),
                ErrorCode::Internal,
            ),
        ];

        for (error, expected) in cases {
            let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
            fx.registry.register("account_objects", FailingHandler { error });

            let result = fx
                .engine
                .build_response(&request("account_objects", json!({})))
                .await;
            assert_eq!(error_code(&result), expected);
        }
    }

    #[tokio::test]
    async fn handler_reported_status_passes_through() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        fx.registry.register(
            "ledger_entry",
            FailingHandler {
                error: || Status::new(ErrorCode::LedgerNotFound).into(),
            },
        );

        let result = fx
            .engine
            .build_response(&request("ledger_entry", json!({})))
            .await;
        assert_eq!(error_code(&result), ErrorCode::LedgerNotFound);
    }

    #[tokio::test]
    async fn non_object_handler_value_is_an_internal_error() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        fx.registry.register(
            "ledger_range",
            CountingHandler::replying(Arc::clone(&fx.invocations), json!([1, 2, 3])),
        );

        let result = fx
            .engine
            .build_response(&request("ledger_range", json!({})))
            .await;
        assert_eq!(error_code(&result), ErrorCode::Internal);
    }

    #[tokio::test]
    async fn admin_flag_is_resolved_through_the_verifier() {
        struct AdminProbe {
            saw_admin: Arc<AtomicBool>,
        }

        #[async_trait]
        impl Handler for AdminProbe {
            async fn process(
                &self,
                _params: Value,
                ctx: &HandlerContext,
            ) -> Result<Value, HandlerError> {
                self.saw_admin.store(ctx.is_admin, Ordering::SeqCst);
                Ok(json!({}))
            }
        }

        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        let saw_admin = Arc::new(AtomicBool::new(true));
        fx.registry.register(
            "server_info",
            AdminProbe {
                saw_admin: Arc::clone(&saw_admin),
            },
        );

        fx.engine
            .build_response(&request("server_info", json!({})))
            .await;
        // NeverAdminVerifier is wired into the fixture.
        assert!(!saw_admin.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn valid_handler_guards_the_metrics_sink() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        fx.registry.register(
            "account_tx",
            CountingHandler::replying(Arc::clone(&fx.invocations), json!({})),
        );

        // Forward-set member: valid even though unregistered.
        assert!(fx.engine.valid_handler("submit"));
        assert!(fx.engine.valid_handler("account_tx"));
        assert!(!fx.engine.valid_handler("unregistered_method"));

        fx.engine.notify_errored("unregistered_method");
        assert!(!fx.counters.has_entry("unregistered_method"));

        fx.engine.notify_complete("account_tx", Duration::from_micros(15));
        assert!(fx.counters.has_entry("account_tx"));
    }

    #[tokio::test]
    async fn post_hands_work_to_the_queue() {
        let fx = fixture(StaticBackend::idle(), RecordingForwarder::replying());
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        assert!(fx.engine.post(
            async move {
                flag.store(true, Ordering::SeqCst);
            },
            "203.0.113.5",
        ));

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(ran.load(Ordering::SeqCst));
    }
}
