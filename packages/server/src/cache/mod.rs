//! Background ledger-cache loading: tuning knobs and the stop-aware loader
//! shell around the execution framework.

use std::future::Future;

use serde::Deserialize;

use crate::exec::{ExecError, ExecutionContext, StopToken, StoppableOutcome};

/// How the cache is populated at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LoadStyle {
    /// Load in the background while the server starts serving.
    Async,
    /// Block startup until the cache is warm.
    Sync,
    /// Do not populate the cache at all.
    None,
}

/// Tuning knobs for the cache loader.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct CacheLoaderSettings {
    /// Number of ledger diffs used to generate traversal cursors.
    pub num_cache_diffs: usize,
    /// Number of markers walking the ledger concurrently.
    pub num_cache_markers: usize,
    /// Ledger objects fetched per marker per page.
    pub cache_page_fetch_size: usize,
    /// Worker threads dedicated to cache loading.
    pub num_threads: usize,
    pub load_style: LoadStyle,
}

impl Default for CacheLoaderSettings {
    fn default() -> Self {
        Self {
            num_cache_diffs: 32,
            num_cache_markers: 48,
            cache_page_fetch_size: 512,
            num_threads: 2,
            load_style: LoadStyle::Async,
        }
    }
}

impl CacheLoaderSettings {
    #[must_use]
    pub fn is_sync(&self) -> bool {
        self.load_style == LoadStyle::Sync
    }

    #[must_use]
    pub fn is_async(&self) -> bool {
        self.load_style == LoadStyle::Async
    }

    #[must_use]
    pub fn is_disabled(&self) -> bool {
        self.load_style == LoadStyle::None
    }
}

/// Runs the cache-population job as a stoppable unit of work.
///
/// The job itself (walking ledger pages through the backend) is supplied by
/// the composition root; the loader owns its lifecycle: start, cooperative
/// stop, wait.
pub struct CacheLoader {
    ctx: ExecutionContext,
    settings: CacheLoaderSettings,
    job: Option<StoppableOutcome<()>>,
}

impl CacheLoader {
    #[must_use]
    pub fn new(ctx: ExecutionContext, settings: CacheLoaderSettings) -> Self {
        Self {
            ctx,
            settings,
            job: None,
        }
    }

    #[must_use]
    pub fn settings(&self) -> &CacheLoaderSettings {
        &self.settings
    }

    /// Starts the load job unless loading is disabled. The job receives a
    /// [`StopToken`] and is expected to check it between pages.
    pub fn start<F, Fut>(&mut self, load: F)
    where
        F: FnOnce(StopToken) -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        if self.settings.is_disabled() {
            tracing::info!("cache loading is disabled");
            return;
        }
        tracing::info!(
            markers = self.settings.num_cache_markers,
            page_size = self.settings.cache_page_fetch_size,
            "starting cache load"
        );
        self.job = Some(self.ctx.run_stoppable(None, load));
    }

    /// Requests cooperative cancellation of a running load job.
    pub fn stop(&self) {
        if let Some(job) = &self.job {
            job.request_stop();
        }
    }

    /// Waits for the load job to resolve. Resolves immediately when no job
    /// was started.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError`] when the executor was torn down mid-load.
    pub async fn wait(&mut self) -> Result<(), ExecError> {
        match self.job.take() {
            Some(job) => job.wait().await,
            None => Ok(()),
        }
    }
}
