//! Tracing subscriber setup for embedding binaries.

use tracing_subscriber::EnvFilter;

/// Installs the global tracing subscriber: compact fmt output filtered by
/// `RUST_LOG` (default level `info`). Safe to call more than once; later
/// calls are no-ops.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .compact()
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_is_idempotent() {
        init();
        init();
    }
}
