//! Engine-level error types.

use nodes::RegistryError;
use storage::StorageError;
use thiserror::Error;
use uuid::Uuid;

/// A single graph-validation rule violation.
///
/// Violations are reported in checking order; `validate` stops at the first
/// one it finds.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GraphViolation {
    #[error("node ids must be non-empty")]
    EmptyNodeId,

    #[error("duplicate node id: '{0}'")]
    DuplicateNodeId(String),

    #[error("edge references unknown node '{node_id}' ({side} side)")]
    UnknownNode {
        node_id: String,
        side: &'static str,
    },

    #[error("node '{0}' has an edge to itself")]
    SelfLoop(String),

    #[error("duplicate edge '{from}' -> '{to}'")]
    DuplicateEdge { from: String, to: String },

    #[error("node '{node_id}' has unregistered kind '{kind}'")]
    UnknownKind { node_id: String, kind: String },

    #[error("node '{node_id}' config rejected: {message}")]
    BadConfig { node_id: String, message: String },

    #[error("workflow graph contains a cycle")]
    Cycle,
}

/// Errors surfaced by the engine's public operations.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The workflow failed a validation rule.
    #[error("invalid workflow graph: {0}")]
    InvalidGraph(#[from] GraphViolation),

    /// No workflow under the given id.
    #[error("unknown workflow: {0}")]
    UnknownWorkflow(Uuid),

    /// No execution under the given id.
    #[error("unknown execution: {0}")]
    UnknownExecution(Uuid),

    /// Registry lookup or registration failure.
    #[error(transparent)]
    Registry(#[from] RegistryError),

    /// A node run returned a failure; recorded here only for operations that
    /// surface it directly (preview). During executions node failures land
    /// in the execution record instead.
    #[error("node '{node_id}' failed: {message}")]
    NodeFailed { node_id: String, message: String },

    /// The execution was cancelled or timed out.
    #[error("execution cancelled")]
    Cancelled,

    /// Failure at the storage boundary.
    #[error(transparent)]
    Storage(#[from] StorageError),

    /// Executor-internal failure.
    #[error("internal engine error: {0}")]
    Internal(String),
}
