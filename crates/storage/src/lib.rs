//! `storage` crate — the persistence boundary of the engine.
//!
//! Defines the domain records, the async [`Storage`] trait the engine is
//! written against, and an in-process [`MemoryStorage`] implementation.
//! Durable backends implement the same trait; each trait call is an atomic
//! unit and the engine assumes serializable per-execution-id updates.

pub mod error;
pub mod memory;
pub mod records;

use async_trait::async_trait;
use uuid::Uuid;

pub use error::StorageError;
pub use memory::MemoryStorage;
pub use records::{Edge, Execution, ExecutionStatus, NodeDefinition, Workflow};

/// CRUD for workflow definitions and execution records.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn create_workflow(&self, workflow: Workflow) -> Result<Uuid, StorageError>;
    async fn get_workflow(&self, id: Uuid) -> Result<Workflow, StorageError>;
    async fn list_workflows(&self) -> Result<Vec<Workflow>, StorageError>;

    /// Replace a workflow definition.
    ///
    /// The caller passes the version it read; a mismatch with the stored
    /// version fails with [`StorageError::VersionConflict`]. On success the
    /// stored version is bumped.
    async fn update_workflow(&self, id: Uuid, workflow: Workflow) -> Result<(), StorageError>;
    async fn delete_workflow(&self, id: Uuid) -> Result<(), StorageError>;

    async fn create_execution(&self, execution: Execution) -> Result<Uuid, StorageError>;
    async fn get_execution(&self, id: Uuid) -> Result<Execution, StorageError>;
    async fn update_execution(&self, id: Uuid, execution: Execution) -> Result<(), StorageError>;
    async fn list_executions(&self, workflow_id: Uuid) -> Result<Vec<Execution>, StorageError>;
}
