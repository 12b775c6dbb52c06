//! The per-node execution record.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// The outcome of running one node within one execution.
///
/// `output` is the payload downstream nodes see under this node's id in the
/// execution context. A failed result carries `output = null` and an error
/// message; failed results are never cached.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeResult {
    pub success: bool,
    pub output: Value,
    pub error: Option<String>,
    pub duration_ms: u64,
    pub cached: bool,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl NodeResult {
    /// A successful result with the given output.
    pub fn succeeded(output: Value, duration_ms: u64) -> Self {
        Self {
            success: true,
            output,
            error: None,
            duration_ms,
            cached: false,
            metadata: Map::new(),
        }
    }

    /// A failed result with the given error message.
    pub fn failed(error: impl Into<String>, duration_ms: u64) -> Self {
        Self {
            success: false,
            output: Value::Null,
            error: Some(error.into()),
            duration_ms,
            cached: false,
            metadata: Map::new(),
        }
    }

    /// Copy of this result marked as served from the cache.
    pub fn as_cached(&self, duration_ms: u64) -> Self {
        let mut copy = self.clone();
        copy.cached = true;
        copy.duration_ms = duration_ms;
        copy
    }
}
