//! The per-execution context map.

use std::sync::Arc;

use serde_json::{Map, Value};

/// Mutable mapping from reference-root to value, alive only while an
/// execution runs.
///
/// Seeded with the caller's input map at the top level, so `{{topic}}`-style
/// references work alongside `{{node_id.field}}`. Each completed node then
/// writes its output under its own id; a node id shadows a caller input of
/// the same name.
#[derive(Debug)]
pub struct ExecutionContext {
    values: Map<String, Value>,
    caller_inputs: Arc<Map<String, Value>>,
}

impl ExecutionContext {
    pub fn new(inputs: Map<String, Value>) -> Self {
        Self {
            values: inputs.clone(),
            caller_inputs: Arc::new(inputs),
        }
    }

    /// Record a completed node's output under its id.
    pub fn insert_output(&mut self, node_id: &str, output: Value) {
        self.values.insert(node_id.to_string(), output);
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    /// The full map, as the template evaluator sees it.
    pub fn values(&self) -> &Map<String, Value> {
        &self.values
    }

    /// The original caller input map, untouched by node writes.
    pub fn caller_inputs(&self) -> Arc<Map<String, Value>> {
        Arc::clone(&self.caller_inputs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn inputs() -> Map<String, Value> {
        let mut map = Map::new();
        map.insert("topic".into(), json!("rust"));
        map
    }

    #[test]
    fn caller_inputs_are_visible_at_top_level() {
        let ctx = ExecutionContext::new(inputs());
        assert_eq!(ctx.get("topic"), Some(&json!("rust")));
    }

    #[test]
    fn node_outputs_shadow_caller_inputs() {
        let mut ctx = ExecutionContext::new(inputs());
        ctx.insert_output("topic", json!("shadowed"));

        assert_eq!(ctx.get("topic"), Some(&json!("shadowed")));
        // The read-only copy handed to nodes keeps the original.
        assert_eq!(ctx.caller_inputs().get("topic"), Some(&json!("rust")));
    }
}
