//! Validated workflow CRUD.
//!
//! Transport adapters go through this service rather than the raw storage
//! trait so that no invalid definition is ever persisted: `create` and
//! `update` run full graph validation first.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use nodes::NodeRegistry;
use storage::{Execution, Storage, StorageError, Workflow};

use crate::error::EngineError;
use crate::graph;

pub struct WorkflowService {
    storage: Arc<dyn Storage>,
    registry: Arc<NodeRegistry>,
}

impl WorkflowService {
    pub fn new(storage: Arc<dyn Storage>, registry: Arc<NodeRegistry>) -> Self {
        Self { storage, registry }
    }

    /// Validate and persist a new workflow.
    pub async fn create_workflow(&self, workflow: Workflow) -> Result<Uuid, EngineError> {
        graph::validate(&workflow, &self.registry)?;
        let id = self.storage.create_workflow(workflow).await?;
        info!(%id, "workflow created");
        Ok(id)
    }

    pub async fn get_workflow(&self, id: Uuid) -> Result<Workflow, EngineError> {
        match self.storage.get_workflow(id).await {
            Ok(workflow) => Ok(workflow),
            Err(StorageError::NotFound) => Err(EngineError::UnknownWorkflow(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn list_workflows(&self) -> Result<Vec<Workflow>, EngineError> {
        Ok(self.storage.list_workflows().await?)
    }

    /// Validate and persist a replacement definition.
    ///
    /// The caller must pass the version it read; stale writers get
    /// [`StorageError::VersionConflict`] back.
    pub async fn update_workflow(&self, id: Uuid, workflow: Workflow) -> Result<(), EngineError> {
        graph::validate(&workflow, &self.registry)?;
        match self.storage.update_workflow(id, workflow).await {
            Ok(()) => {
                info!(%id, "workflow updated");
                Ok(())
            }
            Err(StorageError::NotFound) => Err(EngineError::UnknownWorkflow(id)),
            Err(other) => Err(other.into()),
        }
    }

    pub async fn delete_workflow(&self, id: Uuid) -> Result<(), EngineError> {
        match self.storage.delete_workflow(id).await {
            Ok(()) => Ok(()),
            Err(StorageError::NotFound) => Err(EngineError::UnknownWorkflow(id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Execution history of one workflow.
    pub async fn list_executions(&self, workflow_id: Uuid) -> Result<Vec<Execution>, EngineError> {
        Ok(self.storage.list_executions(workflow_id).await?)
    }
}
