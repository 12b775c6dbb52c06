//! `weft` CLI entry-point.
//!
//! Available sub-commands:
//! - `validate` — validate a workflow JSON file and print its plan.
//! - `run`      — execute a workflow file to completion and print the output.
//! - `kinds`    — list the registered node kinds.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::info;

use engine::{EngineConfig, ExecutionPlan, WorkflowExecutor, WorkflowService};
use nodes::NodeRegistry;
use storage::{Edge, ExecutionStatus, MemoryStorage, NodeDefinition, Storage, Workflow};

#[derive(Parser)]
#[command(name = "weft", about = "DAG workflow execution engine", version)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Validate a workflow definition JSON file.
    Validate {
        /// Path to the workflow JSON file.
        path: PathBuf,
    },
    /// Execute a workflow file to completion and print the final output.
    Run {
        /// Path to the workflow JSON file.
        path: PathBuf,
        /// Caller inputs as a JSON object, e.g. '{"topic": "rust"}'.
        #[arg(long, default_value = "{}")]
        inputs: String,
        /// Skip the result cache for this run.
        #[arg(long)]
        no_cache: bool,
    },
    /// List the registered node kinds.
    Kinds,
}

/// On-disk workflow shape: just the definition, without record bookkeeping.
#[derive(Deserialize)]
struct WorkflowFile {
    name: String,
    #[serde(default)]
    description: Option<String>,
    nodes: Vec<NodeDefinition>,
    #[serde(default)]
    edges: Vec<Edge>,
}

impl WorkflowFile {
    fn load(path: &PathBuf) -> anyhow::Result<Workflow> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("cannot read {}", path.display()))?;
        let file: WorkflowFile =
            serde_json::from_str(&content).context("invalid workflow JSON")?;

        let mut workflow = Workflow::new(file.name, file.nodes, file.edges);
        workflow.description = file.description;
        Ok(workflow)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let registry = Arc::new(NodeRegistry::with_builtins());

    match cli.command {
        Command::Validate { path } => {
            let workflow = WorkflowFile::load(&path)?;
            engine::validate(&workflow, &registry)?;
            let plan = ExecutionPlan::build(&workflow)?;
            println!("workflow '{}' is valid", workflow.name);
            for (depth, level) in plan.levels().iter().enumerate() {
                println!("  level {depth}: {}", level.join(", "));
            }
        }

        Command::Run {
            path,
            inputs,
            no_cache,
        } => {
            let workflow = WorkflowFile::load(&path)?;
            let inputs: Map<String, Value> =
                serde_json::from_str(&inputs).context("--inputs must be a JSON object")?;

            let storage = Arc::new(MemoryStorage::new()) as Arc<dyn Storage>;
            let service = WorkflowService::new(Arc::clone(&storage), Arc::clone(&registry));
            let executor =
                WorkflowExecutor::new(storage, Arc::clone(&registry), EngineConfig::default());

            let workflow_id = service.create_workflow(workflow).await?;
            let execution_id = executor.submit(workflow_id, inputs, !no_cache).await?;
            info!(%execution_id, "execution submitted");

            let execution = loop {
                let execution = executor.status(execution_id).await?;
                if execution.status.is_terminal() {
                    break execution;
                }
                tokio::time::sleep(Duration::from_millis(25)).await;
            };

            match execution.status {
                ExecutionStatus::Success => {
                    let output = execution.output.unwrap_or(Value::Null);
                    println!("{}", serde_json::to_string_pretty(&output)?);
                }
                status => {
                    let reason = execution.error.unwrap_or_else(|| "unknown".into());
                    bail!("execution ended {status}: {reason}");
                }
            }
        }

        Command::Kinds => {
            for descriptor in registry.list() {
                let cache_note = if descriptor.cacheable { "" } else { " (not cacheable)" };
                println!("{:<10} {}{}", descriptor.kind, descriptor.description, cache_note);
            }
        }
    }

    Ok(())
}
