//! Server-level configuration for the dispatch and admission layers.
//!
//! Loading (file formats, watching) is the embedding binary's concern; this
//! crate only defines the deserializable shape and its defaults.

use serde::Deserialize;

use crate::cache::CacheLoaderSettings;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Maximum accepted-but-unfinished units of work before the queue starts
    /// declining submissions.
    pub max_queue_size: usize,
    /// Interval between queue-depth gauge reports, in milliseconds.
    pub queue_report_interval_ms: u64,
    /// Source addresses granted admin privileges.
    pub admin_allowlist: Vec<String>,
    /// Cache loader tuning.
    pub cache: CacheLoaderSettings,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            max_queue_size: 1000,
            queue_report_interval_ms: 5_000,
            admin_allowlist: vec!["127.0.0.1".to_string(), "::1".to_string()],
            cache: CacheLoaderSettings::default(),
        }
    }
}
