//! Workflow execution.
//!
//! `WorkflowExecutor` is the submit-and-poll surface around the engine:
//! 1. `submit` snapshots and validates the workflow, creates a `pending`
//!    execution record, and schedules a background run task.
//! 2. The run task walks the plan level by level, resolving templates,
//!    consulting the result cache, and dispatching nodes concurrently
//!    within each level under a process-wide worker bound.
//! 3. Callers observe progress through `status` and stop runs with
//!    `cancel`; deadlines are scheduled cancellations.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use serde_json::{Map, Value};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

use nodes::{ExecutableNode, NodeContext, NodeRegistry, NodeResult, OUTPUT_KIND};
use storage::{Execution, ExecutionStatus, NodeDefinition, Storage, StorageError, Workflow};

use crate::cache::{CacheStats, ResultCache};
use crate::config::EngineConfig;
use crate::context::ExecutionContext;
use crate::error::EngineError;
use crate::graph::{self, WorkflowGraph};
use crate::plan::ExecutionPlan;
use crate::template;

// ---------------------------------------------------------------------------
// Submit options
// ---------------------------------------------------------------------------

/// Per-submit overrides.
#[derive(Debug, Clone)]
pub struct SubmitOptions {
    /// Whether this execution may read and write the result cache.
    /// `EngineConfig::cache_enabled = false` overrides a `true` here.
    pub use_cache: bool,
    /// Override of the engine-wide error policy for this execution.
    pub continue_on_error: Option<bool>,
    /// Deadline after which the execution is cancelled. Falls back to
    /// `EngineConfig::execution_timeout`.
    pub deadline: Option<Duration>,
}

impl Default for SubmitOptions {
    fn default() -> Self {
        Self {
            use_cache: true,
            continue_on_error: None,
            deadline: None,
        }
    }
}

// ---------------------------------------------------------------------------
// WorkflowExecutor
// ---------------------------------------------------------------------------

/// Drives executions of stored workflows.
///
/// Cheap to clone — clones share storage, registry, cache, and the worker
/// pool. Different executions run independently and in parallel, all
/// drawing node slots from the same pool.
#[derive(Clone)]
pub struct WorkflowExecutor {
    inner: Arc<Inner>,
}

struct Inner {
    storage: Arc<dyn Storage>,
    registry: Arc<NodeRegistry>,
    cache: Arc<ResultCache>,
    config: EngineConfig,
    workers: Arc<Semaphore>,
    cancellations: Mutex<HashMap<Uuid, CancellationToken>>,
}

/// Why a run stopped before producing an output.
enum Halt {
    Cancelled,
    NodeFailed { node_id: String, message: String },
    Internal(String),
}

impl WorkflowExecutor {
    pub fn new(
        storage: Arc<dyn Storage>,
        registry: Arc<NodeRegistry>,
        config: EngineConfig,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                storage,
                registry,
                cache: Arc::new(ResultCache::new(config.cache_max_entries)),
                workers: Arc::new(Semaphore::new(config.worker_count.max(1))),
                config,
                cancellations: Mutex::new(HashMap::new()),
            }),
        }
    }

    /// Submit an execution of `workflow_id` and return its id immediately.
    pub async fn submit(
        &self,
        workflow_id: Uuid,
        inputs: Map<String, Value>,
        use_cache: bool,
    ) -> Result<Uuid, EngineError> {
        let options = SubmitOptions {
            use_cache,
            ..SubmitOptions::default()
        };
        self.submit_with_options(workflow_id, inputs, options).await
    }

    /// Submit with per-execution overrides.
    ///
    /// Snapshots the workflow definition as of now: a long-running
    /// execution never observes later edits.
    pub async fn submit_with_options(
        &self,
        workflow_id: Uuid,
        inputs: Map<String, Value>,
        options: SubmitOptions,
    ) -> Result<Uuid, EngineError> {
        let inner = &self.inner;
        let workflow = match inner.storage.get_workflow(workflow_id).await {
            Ok(workflow) => workflow,
            Err(StorageError::NotFound) => return Err(EngineError::UnknownWorkflow(workflow_id)),
            Err(other) => return Err(other.into()),
        };

        graph::validate(&workflow, &inner.registry)?;

        let use_cache = options.use_cache && inner.config.cache_enabled;
        let execution = Execution::new(workflow_id, inputs, use_cache);
        let execution_id = inner.storage.create_execution(execution.clone()).await?;

        let cancel = CancellationToken::new();
        inner
            .cancellations
            .lock()
            .unwrap()
            .insert(execution_id, cancel.clone());

        // A deadline is just a scheduled cancel.
        if let Some(deadline) = options.deadline.or(inner.config.execution_timeout) {
            let timer = cancel.clone();
            tokio::spawn(async move {
                tokio::time::sleep(deadline).await;
                timer.cancel();
            });
        }

        let continue_on_error = options
            .continue_on_error
            .unwrap_or(inner.config.continue_on_error);
        let task_inner = Arc::clone(inner);
        tokio::spawn(async move {
            task_inner
                .run(execution, workflow, continue_on_error, cancel)
                .await;
            task_inner
                .cancellations
                .lock()
                .unwrap()
                .remove(&execution_id);
        });

        Ok(execution_id)
    }

    /// Current record of an execution.
    pub async fn status(&self, execution_id: Uuid) -> Result<Execution, EngineError> {
        match self.inner.storage.get_execution(execution_id).await {
            Ok(execution) => Ok(execution),
            Err(StorageError::NotFound) => Err(EngineError::UnknownExecution(execution_id)),
            Err(other) => Err(other.into()),
        }
    }

    /// Request cancellation of a live execution.
    ///
    /// The run task honours the request between levels; nodes in flight see
    /// it through their context handle. Cancelling an already-terminal
    /// execution is a no-op.
    pub async fn cancel(&self, execution_id: Uuid) -> Result<(), EngineError> {
        let token = self
            .inner
            .cancellations
            .lock()
            .unwrap()
            .get(&execution_id)
            .cloned();

        match token {
            Some(token) => {
                info!(%execution_id, "cancellation requested");
                token.cancel();
                Ok(())
            }
            // Not live any more (or never was): succeed iff the record exists.
            None => self.status(execution_id).await.map(|_| ()),
        }
    }

    /// Run one node kind in isolation, bypassing persistence and cache.
    ///
    /// Templates in `config` are resolved against `context` with the usual
    /// passthrough rule for unresolved references.
    pub async fn preview(
        &self,
        kind: &str,
        config: &Value,
        inputs: &Map<String, Value>,
        context: &Map<String, Value>,
    ) -> Result<NodeResult, EngineError> {
        let descriptor = self.inner.registry.get(kind)?;
        let resolved_config = template::resolve_value(config, context);

        let ctx = NodeContext {
            workflow_id: Uuid::nil(),
            execution_id: Uuid::nil(),
            node_id: format!("preview-{kind}"),
            caller_inputs: Arc::new(context.clone()),
            cancellation: CancellationToken::new(),
        };

        let started = Instant::now();
        let mut result = match descriptor.node.run(resolved_config, inputs, &ctx).await {
            Ok(output) => NodeResult::succeeded(output, elapsed_ms(started)),
            Err(err) => NodeResult::failed(err.to_string(), elapsed_ms(started)),
        };
        result
            .metadata
            .insert("kind".into(), Value::String(kind.into()));
        Ok(result)
    }

    /// Mark executions left `pending`/`running` by a previous process as
    /// failed. Call once at startup, before submitting anything.
    pub async fn recover_interrupted(&self) -> Result<usize, EngineError> {
        let inner = &self.inner;
        let mut recovered = 0usize;
        for workflow in inner.storage.list_workflows().await? {
            for mut execution in inner.storage.list_executions(workflow.id).await? {
                if execution.status.is_terminal() {
                    continue;
                }
                execution.status = ExecutionStatus::Failed;
                execution.error = Some("interrupted by process restart".into());
                execution.finished_at = Some(Utc::now());
                inner
                    .storage
                    .update_execution(execution.id, execution.clone())
                    .await?;
                recovered += 1;
            }
        }
        if recovered > 0 {
            warn!(recovered, "marked interrupted executions as failed");
        }
        Ok(recovered)
    }

    /// Hit/miss counters of the shared result cache.
    pub fn cache_stats(&self) -> CacheStats {
        self.inner.cache.stats()
    }
}

// ---------------------------------------------------------------------------
// The scheduled run task
// ---------------------------------------------------------------------------

impl Inner {
    #[instrument(skip_all, fields(execution_id = %execution.id, workflow = %workflow.name))]
    async fn run(
        &self,
        mut execution: Execution,
        workflow: Workflow,
        continue_on_error: bool,
        cancel: CancellationToken,
    ) {
        execution.status = ExecutionStatus::Running;
        execution.started_at = Some(Utc::now());
        let started = Instant::now();

        if let Err(err) = self.persist(&execution).await {
            error!(%err, "could not mark execution running");
            execution.status = ExecutionStatus::Failed;
            execution.error = Some(format!("internal: {err}"));
            execution.finished_at = Some(Utc::now());
            let _ = self.persist(&execution).await;
            return;
        }
        info!("execution running");

        let outcome = self
            .execute_levels(&mut execution, &workflow, continue_on_error, &cancel)
            .await;

        execution.finished_at = Some(Utc::now());
        execution.duration_ms = Some(elapsed_ms(started));

        match outcome {
            Ok(output) => {
                execution.status = ExecutionStatus::Success;
                execution.output = Some(output);
                info!(duration_ms = execution.duration_ms, "execution succeeded");
            }
            Err(Halt::Cancelled) => {
                execution.status = ExecutionStatus::Cancelled;
                execution.error = Some("execution cancelled".into());
                warn!("execution cancelled");
            }
            Err(Halt::NodeFailed { node_id, message }) => {
                execution.status = ExecutionStatus::Failed;
                execution.error = Some(format!("node '{node_id}' failed: {message}"));
                warn!(%node_id, "execution failed");
            }
            Err(Halt::Internal(message)) => {
                execution.status = ExecutionStatus::Failed;
                execution.error = Some(format!("internal: {message}"));
                error!(%message, "execution failed internally");
            }
        }

        let _ = self.persist(&execution).await;
    }

    /// Walk the plan; on success return the extracted final output.
    async fn execute_levels(
        &self,
        execution: &mut Execution,
        workflow: &Workflow,
        continue_on_error: bool,
        cancel: &CancellationToken,
    ) -> Result<Value, Halt> {
        // Defense in depth: the workflow was validated at submit, but the
        // executor never trusts its input graph.
        graph::validate(workflow, &self.registry)
            .map_err(|violation| Halt::Internal(format!("invalid graph: {violation}")))?;
        let plan = ExecutionPlan::build(workflow)
            .map_err(|violation| Halt::Internal(format!("planning failed: {violation}")))?;
        let graph_index = WorkflowGraph::build(workflow);

        let defs: HashMap<&str, &NodeDefinition> = workflow
            .nodes
            .iter()
            .map(|node| (node.id.as_str(), node))
            .collect();

        let mut context = ExecutionContext::new(execution.input.clone());
        // Under continue-on-error the first failure is remembered and
        // reported once every level has run; a success status never
        // coexists with a failed node result.
        let mut deferred_failure: Option<(String, String)> = None;

        for level in plan.levels() {
            // Between levels is the natural quiescence point.
            if cancel.is_cancelled() {
                return Err(Halt::Cancelled);
            }

            let mut level_results: Vec<(String, NodeResult)> = Vec::with_capacity(level.len());
            let mut join_set: JoinSet<(String, NodeResult)> = JoinSet::new();

            for node_id in level {
                let def = defs.get(node_id.as_str()).ok_or_else(|| {
                    Halt::Internal(format!("planned node '{node_id}' missing from workflow"))
                })?;
                let descriptor = self
                    .registry
                    .get(&def.kind)
                    .map_err(|err| Halt::Internal(err.to_string()))?;

                let mut node_inputs = Map::new();
                for pred in plan.predecessors(node_id) {
                    node_inputs.insert(
                        pred.clone(),
                        context.get(pred).cloned().unwrap_or(Value::Null),
                    );
                }

                let resolved_config = template::resolve_value(&def.config, context.values());

                let cache_key = (execution.use_cache && descriptor.cacheable).then(|| {
                    ResultCache::fingerprint(&def.kind, &resolved_config, &node_inputs)
                });

                if let Some(key) = cache_key.as_deref() {
                    if let Some(hit) = self.cache.get(key) {
                        debug!(%node_id, "cache hit");
                        level_results.push((node_id.clone(), hit.as_cached(0)));
                        continue;
                    }
                }

                join_set.spawn(self.node_task(
                    node_id.clone(),
                    def.kind.clone(),
                    Arc::clone(&descriptor.node),
                    resolved_config,
                    node_inputs,
                    cache_key,
                    NodeContext {
                        workflow_id: workflow.id,
                        execution_id: execution.id,
                        node_id: node_id.clone(),
                        caller_inputs: context.caller_inputs(),
                        cancellation: cancel.clone(),
                    },
                ));
            }

            // Barrier: every node in this level completes before the next
            // level starts.
            while let Some(joined) = join_set.join_next().await {
                match joined {
                    Ok(pair) => level_results.push(pair),
                    Err(join_err) => {
                        return Err(Halt::Internal(format!("level task panicked: {join_err}")))
                    }
                }
            }

            level_results.sort_by(|a, b| a.0.cmp(&b.0));
            let mut first_failure: Option<(String, String)> = None;
            for (node_id, result) in level_results {
                if result.success {
                    context.insert_output(&node_id, result.output.clone());
                } else {
                    if continue_on_error {
                        // Downstream references to this node resolve to null.
                        context.insert_output(&node_id, Value::Null);
                    }
                    if first_failure.is_none() {
                        let message = result
                            .error
                            .clone()
                            .unwrap_or_else(|| "unknown error".into());
                        first_failure = Some((node_id.clone(), message));
                    }
                }
                execution.node_results.insert(node_id, result);
            }

            self.persist(execution)
                .await
                .map_err(|err| Halt::Internal(format!("storage update failed twice: {err}")))?;

            // Nodes that ignored a mid-level cancel have returned by now;
            // cancellation takes precedence over any failure it provoked.
            if cancel.is_cancelled() {
                return Err(Halt::Cancelled);
            }

            if let Some((node_id, message)) = first_failure {
                if !continue_on_error {
                    return Err(Halt::NodeFailed { node_id, message });
                }
                deferred_failure.get_or_insert((node_id, message));
            }
        }

        if let Some((node_id, message)) = deferred_failure {
            return Err(Halt::NodeFailed { node_id, message });
        }

        Ok(extract_output(workflow, &graph_index, execution))
    }

    /// Assemble the spawned task for one node invocation.
    #[allow(clippy::too_many_arguments)]
    fn node_task(
        &self,
        node_id: String,
        kind: String,
        node: Arc<dyn ExecutableNode>,
        resolved_config: Value,
        node_inputs: Map<String, Value>,
        cache_key: Option<String>,
        ctx: NodeContext,
    ) -> impl std::future::Future<Output = (String, NodeResult)> + Send + 'static {
        let workers = Arc::clone(&self.workers);
        let cache = cache_key.map(|key| (key, Arc::clone(&self.cache)));
        let ttl = self.config.cache_default_ttl;

        async move {
            let _permit = workers.acquire_owned().await.ok();
            let started = Instant::now();

            // Inner spawn so a panicking node is contained and reported as
            // this node's failure rather than tearing down the level.
            let handle =
                tokio::spawn(async move { node.run(resolved_config, &node_inputs, &ctx).await });

            let mut result = match handle.await {
                Ok(Ok(output)) => NodeResult::succeeded(output, elapsed_ms(started)),
                Ok(Err(err)) => NodeResult::failed(err.to_string(), elapsed_ms(started)),
                Err(join_err) => {
                    NodeResult::failed(format!("node raised: {join_err}"), elapsed_ms(started))
                }
            };
            result.metadata.insert("kind".into(), Value::String(kind));

            if let Some((key, cache)) = cache {
                // No-op for failed results.
                cache.put(key, &result, ttl);
            }

            (node_id, result)
        }
    }

    /// One retry on failed execution updates; the second failure bubbles up.
    async fn persist(&self, execution: &Execution) -> Result<(), StorageError> {
        if let Err(first) = self
            .storage
            .update_execution(execution.id, execution.clone())
            .await
        {
            warn!(%first, "execution update failed, retrying once");
            self.storage
                .update_execution(execution.id, execution.clone())
                .await?;
        }
        Ok(())
    }
}

/// The execution's final output.
///
/// Sinks are the `output`-kind nodes; a workflow without any falls back to
/// its terminal (no-successor) nodes. A single sink contributes its output
/// directly, several contribute a `{node_id: output}` map.
fn extract_output(
    workflow: &Workflow,
    graph_index: &WorkflowGraph,
    execution: &Execution,
) -> Value {
    let mut sinks: Vec<&str> = workflow
        .nodes
        .iter()
        .filter(|node| node.kind == OUTPUT_KIND)
        .map(|node| node.id.as_str())
        .collect();

    if sinks.is_empty() {
        sinks = workflow
            .nodes
            .iter()
            .filter(|node| graph_index.successors(&node.id).is_empty())
            .map(|node| node.id.as_str())
            .collect();
    }

    match sinks.as_slice() {
        [single] => execution
            .node_results
            .get(*single)
            .map(|result| result.output.clone())
            .unwrap_or(Value::Null),
        many => Value::Object(
            many.iter()
                .filter_map(|id| {
                    execution
                        .node_results
                        .get(*id)
                        .map(|result| ((*id).to_string(), result.output.clone()))
                })
                .collect(),
        ),
    }
}

fn elapsed_ms(since: Instant) -> u64 {
    since.elapsed().as_millis() as u64
}
