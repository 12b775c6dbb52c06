//! In-process storage backend.
//!
//! Volatile by design: it backs tests, previews, and the CLI. The maps are
//! guarded by `std::sync::RwLock`; no lock is held across an await point.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::records::{Execution, Workflow};
use crate::{Storage, StorageError};

/// A `Storage` implementation over two in-memory maps.
#[derive(Debug, Default)]
pub struct MemoryStorage {
    workflows: RwLock<HashMap<Uuid, Workflow>>,
    executions: RwLock<HashMap<Uuid, Execution>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Storage for MemoryStorage {
    async fn create_workflow(&self, workflow: Workflow) -> Result<Uuid, StorageError> {
        let id = workflow.id;
        let mut workflows = self.workflows.write().unwrap();
        if workflows.contains_key(&id) {
            return Err(StorageError::Internal(format!(
                "workflow {id} already exists"
            )));
        }
        workflows.insert(id, workflow);
        Ok(id)
    }

    async fn get_workflow(&self, id: Uuid) -> Result<Workflow, StorageError> {
        self.workflows
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn list_workflows(&self) -> Result<Vec<Workflow>, StorageError> {
        let mut all: Vec<Workflow> = self.workflows.read().unwrap().values().cloned().collect();
        all.sort_by_key(|w| (w.created_at, w.id));
        Ok(all)
    }

    async fn update_workflow(&self, id: Uuid, workflow: Workflow) -> Result<(), StorageError> {
        let mut workflows = self.workflows.write().unwrap();
        let stored = workflows.get_mut(&id).ok_or(StorageError::NotFound)?;

        if workflow.version != stored.version {
            return Err(StorageError::VersionConflict {
                expected: stored.version,
                given: workflow.version,
            });
        }

        let mut updated = workflow;
        updated.id = id;
        updated.version = stored.version + 1;
        updated.created_at = stored.created_at;
        updated.updated_at = Utc::now();
        *stored = updated;
        Ok(())
    }

    async fn delete_workflow(&self, id: Uuid) -> Result<(), StorageError> {
        self.workflows
            .write()
            .unwrap()
            .remove(&id)
            .map(|_| ())
            .ok_or(StorageError::NotFound)
    }

    async fn create_execution(&self, execution: Execution) -> Result<Uuid, StorageError> {
        let id = execution.id;
        self.executions.write().unwrap().insert(id, execution);
        Ok(id)
    }

    async fn get_execution(&self, id: Uuid) -> Result<Execution, StorageError> {
        self.executions
            .read()
            .unwrap()
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    async fn update_execution(&self, id: Uuid, execution: Execution) -> Result<(), StorageError> {
        let mut executions = self.executions.write().unwrap();
        match executions.get_mut(&id) {
            Some(stored) => {
                *stored = execution;
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn list_executions(&self, workflow_id: Uuid) -> Result<Vec<Execution>, StorageError> {
        let mut matching: Vec<Execution> = self
            .executions
            .read()
            .unwrap()
            .values()
            .filter(|e| e.workflow_id == workflow_id)
            .cloned()
            .collect();
        matching.sort_by_key(|e| (e.created_at, e.id));
        Ok(matching)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::ExecutionStatus;
    use serde_json::Map;

    fn workflow(name: &str) -> Workflow {
        Workflow::new(name, vec![], vec![])
    }

    #[tokio::test]
    async fn workflow_crud_round_trip() {
        let store = MemoryStorage::new();
        let wf = workflow("wf");
        let id = store.create_workflow(wf.clone()).await.unwrap();

        let fetched = store.get_workflow(id).await.unwrap();
        assert_eq!(fetched.name, "wf");
        assert_eq!(fetched.version, 1);

        store.delete_workflow(id).await.unwrap();
        assert!(matches!(
            store.get_workflow(id).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn update_bumps_version_and_rejects_stale_writers() {
        let store = MemoryStorage::new();
        let id = store.create_workflow(workflow("wf")).await.unwrap();

        let mut first = store.get_workflow(id).await.unwrap();
        first.name = "renamed".into();
        store.update_workflow(id, first.clone()).await.unwrap();
        assert_eq!(store.get_workflow(id).await.unwrap().version, 2);

        // `first` still carries version 1 — a second write with it is stale.
        assert!(matches!(
            store.update_workflow(id, first).await,
            Err(StorageError::VersionConflict { expected: 2, given: 1 })
        ));
    }

    #[tokio::test]
    async fn executions_are_listed_per_workflow() {
        let store = MemoryStorage::new();
        let wf_id = Uuid::new_v4();
        let other_id = Uuid::new_v4();

        for _ in 0..2 {
            store
                .create_execution(Execution::new(wf_id, Map::new(), true))
                .await
                .unwrap();
        }
        store
            .create_execution(Execution::new(other_id, Map::new(), true))
            .await
            .unwrap();

        assert_eq!(store.list_executions(wf_id).await.unwrap().len(), 2);
        assert_eq!(store.list_executions(other_id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn execution_updates_replace_the_record() {
        let store = MemoryStorage::new();
        let mut exec = Execution::new(Uuid::new_v4(), Map::new(), false);
        let id = store.create_execution(exec.clone()).await.unwrap();

        exec.status = ExecutionStatus::Running;
        store.update_execution(id, exec).await.unwrap();
        assert_eq!(
            store.get_execution(id).await.unwrap().status,
            ExecutionStatus::Running
        );

        assert!(matches!(
            store.update_execution(Uuid::new_v4(), Execution::new(id, Map::new(), false)).await,
            Err(StorageError::NotFound)
        ));
    }
}
