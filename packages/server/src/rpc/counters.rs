//! Per-method RPC telemetry sink.
//!
//! Keeps its own tallies for operator reports and mirrors them to the
//! `metrics` facade for whatever exporter the embedding binary installs.
//! Callers are expected to gate recording on a known method name; see
//! `RpcEngine::valid_handler`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use dashmap::DashMap;
use serde_json::{json, Value};

#[derive(Default)]
struct MethodInfo {
    completed: AtomicU64,
    errored: AtomicU64,
    forwarded: AtomicU64,
    duration_us: AtomicU64,
}

/// Concurrent per-method tallies of RPC outcomes.
#[derive(Default)]
pub struct Counters {
    methods: DashMap<String, MethodInfo>,
}

impl Counters {
    #[must_use]
    pub fn new() -> Self {
        Self {
            methods: DashMap::new(),
        }
    }

    /// Records a successfully executed method and how long it took.
    pub fn rpc_complete(&self, method: &str, duration: Duration) {
        let entry = self.methods.entry(method.to_string()).or_default();
        entry.completed.fetch_add(1, Ordering::Relaxed);
        #[allow(clippy::cast_possible_truncation)]
        entry
            .duration_us
            .fetch_add(duration.as_micros() as u64, Ordering::Relaxed);

        metrics::counter!("rpc_completed_total", "method" => method.to_string()).increment(1);
        metrics::histogram!("rpc_duration_seconds", "method" => method.to_string())
            .record(duration.as_secs_f64());
    }

    /// Records a method whose execution failed.
    pub fn rpc_errored(&self, method: &str) {
        let entry = self.methods.entry(method.to_string()).or_default();
        entry.errored.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rpc_errored_total", "method" => method.to_string()).increment(1);
    }

    /// Records a method whose execution was forwarded upstream.
    pub fn rpc_forwarded(&self, method: &str) {
        let entry = self.methods.entry(method.to_string()).or_default();
        entry.forwarded.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("rpc_forwarded_total", "method" => method.to_string()).increment(1);
    }

    /// Snapshot of all tallies, ordered by method name.
    #[must_use]
    pub fn report(&self) -> Value {
        let mut rows: Vec<_> = self
            .methods
            .iter()
            .map(|entry| {
                json!({
                    "method": entry.key(),
                    "completed": entry.completed.load(Ordering::Relaxed),
                    "errored": entry.errored.load(Ordering::Relaxed),
                    "forwarded": entry.forwarded.load(Ordering::Relaxed),
                    "duration_us": entry.duration_us.load(Ordering::Relaxed),
                })
            })
            .collect();
        rows.sort_by(|a, b| a["method"].as_str().cmp(&b["method"].as_str()));
        json!({ "rpc": rows })
    }

    /// Whether any tally exists for the method. Test and report helper.
    #[must_use]
    pub fn has_entry(&self, method: &str) -> bool {
        self.methods.contains_key(method)
    }
}
