//! Engine tuning knobs.

use std::time::Duration;

/// Configuration recognised by the engine.
#[derive(Debug, Clone)]
pub struct EngineConfig {
    /// Max concurrent node invocations across all executions.
    pub worker_count: usize,
    /// Master switch for the result cache; overrides per-execution
    /// `use_cache = true`.
    pub cache_enabled: bool,
    /// LRU cap on the result cache.
    pub cache_max_entries: usize,
    /// Expiry applied to every cached result.
    pub cache_default_ttl: Duration,
    /// Default deadline for submitted executions; `None` means unlimited.
    pub execution_timeout: Option<Duration>,
    /// If true, node failures substitute `null` and the run continues;
    /// otherwise the first failure fails the execution.
    pub continue_on_error: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            worker_count: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1),
            cache_enabled: true,
            cache_max_entries: 1000,
            cache_default_ttl: Duration::from_secs(3600),
            execution_timeout: None,
            continue_on_error: false,
        }
    }
}
