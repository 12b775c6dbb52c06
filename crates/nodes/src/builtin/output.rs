//! `output` — the sink kind that feeds the execution's final output.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::schema::{Field, FieldType, Schema};
use crate::traits::{ExecutableNode, NodeContext};
use crate::NodeError;

/// Passes a value through to the execution output. With an explicit
/// `config.value` (usually a template reference) it emits that; otherwise it
/// forwards its single predecessor's output, or the whole input map when fed
/// by several predecessors.
pub struct OutputNode;

#[async_trait]
impl ExecutableNode for OutputNode {
    async fn run(
        &self,
        config: Value,
        inputs: &Map<String, Value>,
        _ctx: &NodeContext,
    ) -> Result<Value, NodeError> {
        if let Some(value) = config.get("value") {
            return Ok(value.clone());
        }

        let mut values = inputs.values();
        match (values.next(), values.next()) {
            (Some(single), None) => Ok(single.clone()),
            _ => Ok(Value::Object(inputs.clone())),
        }
    }

    fn config_schema(&self) -> Schema {
        Schema::object(vec![Field::optional("value", FieldType::Any)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_context;
    use serde_json::json;

    fn inputs(pairs: &[(&str, Value)]) -> Map<String, Value> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[tokio::test]
    async fn explicit_value_wins() {
        let out = OutputNode
            .run(
                json!({ "value": "done" }),
                &inputs(&[("a", json!(1))]),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!("done"));
    }

    #[tokio::test]
    async fn single_predecessor_passes_through() {
        let out = OutputNode
            .run(json!(null), &inputs(&[("a", json!("hi"))]), &test_context())
            .await
            .unwrap();
        assert_eq!(out, json!("hi"));
    }

    #[tokio::test]
    async fn several_predecessors_become_a_map() {
        let out = OutputNode
            .run(
                json!(null),
                &inputs(&[("a", json!(1)), ("b", json!(2))]),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!({ "a": 1, "b": 2 }));
    }
}
