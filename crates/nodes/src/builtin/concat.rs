//! `concat` — join rendered parts with a separator.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::schema::{Field, FieldType, Schema};
use crate::traits::{ExecutableNode, NodeContext};
use crate::NodeError;

/// Renders each entry of `config.parts` as text and joins them with
/// `config.separator` (default empty). Strings render as-is; everything
/// else renders as compact JSON.
pub struct ConcatNode;

#[async_trait]
impl ExecutableNode for ConcatNode {
    async fn run(
        &self,
        config: Value,
        _inputs: &Map<String, Value>,
        _ctx: &NodeContext,
    ) -> Result<Value, NodeError> {
        let parts = config
            .get("parts")
            .and_then(Value::as_array)
            .ok_or_else(|| NodeError::Config("missing required field 'parts'".into()))?;

        let separator = config
            .get("separator")
            .and_then(Value::as_str)
            .unwrap_or("");

        let rendered: Vec<String> = parts.iter().map(render).collect();
        Ok(Value::String(rendered.join(separator)))
    }

    fn config_schema(&self) -> Schema {
        Schema::object(vec![
            Field::required("parts", FieldType::Array),
            Field::optional("separator", FieldType::String),
        ])
    }
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn joins_parts_with_separator() {
        let out = ConcatNode
            .run(
                json!({ "parts": ["42", "42"], "separator": "|" }),
                &Map::new(),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!("42|42"));
    }

    #[tokio::test]
    async fn non_string_parts_render_as_json() {
        let out = ConcatNode
            .run(
                json!({ "parts": [1, null, {"a": 1}], "separator": "," }),
                &Map::new(),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!("1,,{\"a\":1}"));
    }
}
