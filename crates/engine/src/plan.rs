//! The level planner.
//!
//! Kahn's algorithm partitions a validated workflow into totally-ordered
//! *levels*: every node's in-edges land in earlier levels, so nodes within a
//! level are mutually independent and may run in parallel. Levels are sorted
//! by node id to keep plans deterministic.

use std::collections::HashMap;

use storage::Workflow;

use crate::error::GraphViolation;

/// An ordered partition of a workflow's nodes into parallel-executable
/// levels, plus each node's predecessor list in edge-insertion order.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    levels: Vec<Vec<String>>,
    predecessors: HashMap<String, Vec<String>>,
}

impl ExecutionPlan {
    /// Build the plan for a workflow.
    ///
    /// Expects edge endpoints to reference existing nodes (the validator
    /// guarantees this); edges to unknown ids are skipped. Reports
    /// [`GraphViolation::Cycle`] when the frontier drains with nodes left.
    pub fn build(workflow: &Workflow) -> Result<Self, GraphViolation> {
        let mut in_degree: HashMap<&str, usize> = HashMap::new();
        let mut adjacency: HashMap<&str, Vec<&str>> = HashMap::new();
        let mut predecessors: HashMap<String, Vec<String>> = HashMap::new();

        for node in &workflow.nodes {
            in_degree.entry(node.id.as_str()).or_insert(0);
            adjacency.entry(node.id.as_str()).or_default();
            predecessors.entry(node.id.clone()).or_default();
        }

        for edge in &workflow.edges {
            if !in_degree.contains_key(edge.source.as_str())
                || !in_degree.contains_key(edge.target.as_str())
            {
                continue;
            }
            adjacency
                .entry(edge.source.as_str())
                .or_default()
                .push(edge.target.as_str());
            *in_degree.entry(edge.target.as_str()).or_insert(0) += 1;
            predecessors
                .entry(edge.target.clone())
                .or_default()
                .push(edge.source.clone());
        }

        // Seed the frontier with every zero-in-degree node, then peel one
        // level per round.
        let mut frontier: Vec<&str> = in_degree
            .iter()
            .filter(|(_, &degree)| degree == 0)
            .map(|(&id, _)| id)
            .collect();

        let mut levels: Vec<Vec<String>> = Vec::new();
        let mut emitted = 0usize;

        while !frontier.is_empty() {
            frontier.sort_unstable();
            emitted += frontier.len();

            let mut next: Vec<&str> = Vec::new();
            for &node_id in &frontier {
                for &successor in &adjacency[node_id] {
                    let degree = in_degree
                        .get_mut(successor)
                        .ok_or(GraphViolation::Cycle)?;
                    *degree -= 1;
                    if *degree == 0 {
                        next.push(successor);
                    }
                }
            }

            levels.push(frontier.iter().map(|&id| id.to_owned()).collect());
            frontier = next;
        }

        // Nodes left over when the frontier empties sit on a cycle.
        if emitted != workflow.nodes.len() {
            return Err(GraphViolation::Cycle);
        }

        Ok(Self {
            levels,
            predecessors,
        })
    }

    /// The levels, outermost order first.
    pub fn levels(&self) -> &[Vec<String>] {
        &self.levels
    }

    /// Sources of the node's incoming edges, in edge-insertion order.
    pub fn predecessors(&self, node_id: &str) -> &[String] {
        self.predecessors.get(node_id).map_or(&[], Vec::as_slice)
    }

    /// Total number of planned nodes.
    pub fn node_count(&self) -> usize {
        self.levels.iter().map(Vec::len).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::{Edge, NodeDefinition};

    fn workflow(ids: &[&str], edges: &[(&str, &str)]) -> Workflow {
        Workflow::new(
            "plan-test",
            ids.iter()
                .map(|id| NodeDefinition {
                    id: (*id).into(),
                    kind: "literal".into(),
                    config: serde_json::Value::Null,
                })
                .collect(),
            edges
                .iter()
                .map(|(source, target)| Edge {
                    source: (*source).into(),
                    target: (*target).into(),
                })
                .collect(),
        )
    }

    #[test]
    fn linear_pipeline_gets_one_node_per_level() {
        let plan = ExecutionPlan::build(&workflow(&["a", "b"], &[("a", "b")])).unwrap();
        assert_eq!(plan.levels(), &[vec!["a".to_string()], vec!["b".to_string()]]);
    }

    #[test]
    fn fan_out_in_produces_three_levels() {
        let plan = ExecutionPlan::build(&workflow(
            &["r", "l", "u", "j"],
            &[("r", "l"), ("r", "u"), ("l", "j"), ("u", "j")],
        ))
        .unwrap();
        assert_eq!(
            plan.levels(),
            &[
                vec!["r".to_string()],
                vec!["l".to_string(), "u".to_string()],
                vec!["j".to_string()]
            ]
        );
    }

    #[test]
    fn levels_are_sorted_by_node_id() {
        let plan =
            ExecutionPlan::build(&workflow(&["zeta", "alpha", "mid"], &[])).unwrap();
        assert_eq!(plan.levels(), &[vec![
            "alpha".to_string(),
            "mid".to_string(),
            "zeta".to_string()
        ]]);
    }

    #[test]
    fn every_node_appears_exactly_once() {
        let plan = ExecutionPlan::build(&workflow(
            &["a", "b", "c", "d", "e"],
            &[("a", "c"), ("b", "c"), ("c", "d"), ("c", "e")],
        ))
        .unwrap();

        let mut all: Vec<&String> = plan.levels().iter().flatten().collect();
        all.sort();
        assert_eq!(plan.node_count(), 5);
        assert_eq!(all, ["a", "b", "c", "d", "e"].iter().collect::<Vec<_>>());
    }

    #[test]
    fn no_level_contains_both_ends_of_an_edge() {
        let edges = [("a", "c"), ("b", "c"), ("c", "d")];
        let plan = ExecutionPlan::build(&workflow(&["a", "b", "c", "d"], &edges)).unwrap();

        for level in plan.levels() {
            for (source, target) in &edges {
                assert!(
                    !(level.contains(&source.to_string()) && level.contains(&target.to_string())),
                    "edge {source}->{target} inside level {level:?}"
                );
            }
        }
    }

    #[test]
    fn cycle_is_reported() {
        let result = ExecutionPlan::build(&workflow(&["a", "b"], &[("a", "b"), ("b", "a")]));
        assert!(matches!(result, Err(GraphViolation::Cycle)));
    }

    #[test]
    fn predecessor_lists_follow_edge_insertion_order() {
        let plan = ExecutionPlan::build(&workflow(
            &["j", "u", "l"],
            &[("u", "j"), ("l", "j")],
        ))
        .unwrap();
        assert_eq!(plan.predecessors("j"), ["u", "l"]);
        assert!(plan.predecessors("u").is_empty());
    }

    #[test]
    fn empty_workflow_plans_to_no_levels() {
        let plan = ExecutionPlan::build(&workflow(&[], &[])).unwrap();
        assert!(plan.levels().is_empty());
    }
}
