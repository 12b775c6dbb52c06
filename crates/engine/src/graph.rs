//! Graph validation and the adjacency index.
//!
//! Rules enforced, in checking order:
//! 1. Node ids are non-empty and unique within the workflow.
//! 2. Every edge endpoint references an existing node.
//! 3. No self-loops, no duplicate edges.
//! 4. Every node's kind is registered.
//! 5. Every node's config satisfies its kind's schema.
//! 6. The directed graph is acyclic.
//!
//! The acyclicity check delegates to the planner, so `validate` accepts a
//! workflow exactly when a plan can be built for it.

use std::collections::{HashMap, HashSet};

use nodes::NodeRegistry;
use storage::Workflow;

use crate::error::GraphViolation;
use crate::plan::ExecutionPlan;

/// Adjacency index over a workflow's edges.
///
/// Built once; `predecessors`/`successors` are O(1) lookups afterwards.
/// Neighbour lists preserve edge-insertion order.
#[derive(Debug)]
pub struct WorkflowGraph {
    predecessors: HashMap<String, Vec<String>>,
    successors: HashMap<String, Vec<String>>,
}

impl WorkflowGraph {
    pub fn build(workflow: &Workflow) -> Self {
        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();
        let mut successors: HashMap<String, Vec<String>> = HashMap::new();

        for node in &workflow.nodes {
            predecessors.entry(node.id.clone()).or_default();
            successors.entry(node.id.clone()).or_default();
        }

        for edge in &workflow.edges {
            successors
                .entry(edge.source.clone())
                .or_default()
                .push(edge.target.clone());
            predecessors
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }

        Self {
            predecessors,
            successors,
        }
    }

    /// Sources of the node's incoming edges, in edge-insertion order.
    pub fn predecessors(&self, node_id: &str) -> &[String] {
        self.predecessors.get(node_id).map_or(&[], Vec::as_slice)
    }

    /// Targets of the node's outgoing edges, in edge-insertion order.
    pub fn successors(&self, node_id: &str) -> &[String] {
        self.successors.get(node_id).map_or(&[], Vec::as_slice)
    }
}

/// Validate a workflow against the rules above.
///
/// Returns the first violation found, in checking order.
pub fn validate(workflow: &Workflow, registry: &NodeRegistry) -> Result<(), GraphViolation> {
    let mut seen_ids: HashSet<&str> = HashSet::new();
    for node in &workflow.nodes {
        if node.id.is_empty() {
            return Err(GraphViolation::EmptyNodeId);
        }
        if !seen_ids.insert(node.id.as_str()) {
            return Err(GraphViolation::DuplicateNodeId(node.id.clone()));
        }
    }

    let mut seen_edges: HashSet<(&str, &str)> = HashSet::new();
    for edge in &workflow.edges {
        if !seen_ids.contains(edge.source.as_str()) {
            return Err(GraphViolation::UnknownNode {
                node_id: edge.source.clone(),
                side: "source",
            });
        }
        if !seen_ids.contains(edge.target.as_str()) {
            return Err(GraphViolation::UnknownNode {
                node_id: edge.target.clone(),
                side: "target",
            });
        }
        if edge.source == edge.target {
            return Err(GraphViolation::SelfLoop(edge.source.clone()));
        }
        if !seen_edges.insert((edge.source.as_str(), edge.target.as_str())) {
            return Err(GraphViolation::DuplicateEdge {
                from: edge.source.clone(),
                to: edge.target.clone(),
            });
        }
    }

    for node in &workflow.nodes {
        let descriptor = registry.get(&node.kind).map_err(|_| GraphViolation::UnknownKind {
            node_id: node.id.clone(),
            kind: node.kind.clone(),
        })?;

        descriptor
            .node
            .config_schema()
            .validate(&node.config)
            .map_err(|message| GraphViolation::BadConfig {
                node_id: node.id.clone(),
                message,
            })?;
    }

    ExecutionPlan::build(workflow).map(|_| ())
}
