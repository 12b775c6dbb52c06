//! `nodes` crate — the `ExecutableNode` contract, the kind registry, and the
//! built-in node kinds.
//!
//! Every node — built-in and external alike — implements [`ExecutableNode`]
//! and registers a [`NodeDescriptor`] under its kind tag. The engine crate
//! dispatches execution through the registry.

pub mod builtin;
pub mod error;
pub mod mock;
pub mod registry;
pub mod result;
pub mod schema;
pub mod traits;

pub use builtin::OUTPUT_KIND;
pub use error::{NodeError, RegistryError};
pub use registry::{NodeDescriptor, NodeRegistry};
pub use result::NodeResult;
pub use schema::{Field, FieldType, Schema};
pub use traits::{ExecutableNode, NodeContext};

#[cfg(test)]
pub(crate) mod test_util {
    use std::sync::Arc;

    use serde_json::Map;
    use tokio_util::sync::CancellationToken;

    use crate::traits::NodeContext;

    /// A throwaway context for exercising nodes directly.
    pub fn test_context() -> NodeContext {
        NodeContext {
            workflow_id: uuid::Uuid::new_v4(),
            execution_id: uuid::Uuid::new_v4(),
            node_id: "test".into(),
            caller_inputs: Arc::new(Map::new()),
            cancellation: CancellationToken::new(),
        }
    }
}
