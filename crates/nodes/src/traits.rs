//! The `ExecutableNode` trait — the contract every node kind must fulfil.

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::schema::Schema;
use crate::NodeError;

/// Per-invocation handle passed to every node.
///
/// Defined here (in the nodes crate) so both the engine and individual node
/// implementations can import it without a circular dependency.
#[derive(Debug, Clone)]
pub struct NodeContext {
    /// ID of the parent workflow.
    pub workflow_id: uuid::Uuid,
    /// ID of the current execution run.
    pub execution_id: uuid::Uuid,
    /// ID of the node being invoked.
    pub node_id: String,
    /// The caller-supplied input map for the whole execution (read-only).
    pub caller_inputs: Arc<Map<String, Value>>,
    /// Cancellation signal for this execution. Long-running nodes should
    /// select on `cancellation.cancelled()` alongside their own I/O.
    pub cancellation: CancellationToken,
}

impl NodeContext {
    /// Whether cancellation has been requested for this execution.
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }
}

/// The core node trait.
///
/// Implementations must be safe to invoke concurrently across distinct
/// invocations; the executor shares one instance per kind. `run` receives
/// the *already template-resolved* configuration and a map of
/// predecessor-id → predecessor output, so nodes never do their own
/// interpolation.
#[async_trait]
pub trait ExecutableNode: Send + Sync {
    /// Execute the node and return its output payload.
    ///
    /// A returned `Err` marks the node (and by default the execution) as
    /// failed; the executor owns the bookkeeping around it.
    async fn run(
        &self,
        config: Value,
        inputs: &Map<String, Value>,
        ctx: &NodeContext,
    ) -> Result<Value, NodeError>;

    /// Structural descriptor the graph validator checks raw configs against.
    fn config_schema(&self) -> Schema;

    /// Descriptor of the inputs this kind expects. Informational only.
    fn input_schema(&self) -> Schema {
        Schema::any()
    }

    /// Descriptor of the output this kind produces. Informational only.
    fn output_schema(&self) -> Schema {
        Schema::any()
    }
}
