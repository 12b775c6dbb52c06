//! `literal` — emit a constant value.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::schema::{Field, FieldType, Schema};
use crate::traits::{ExecutableNode, NodeContext};
use crate::NodeError;

/// Emits `config.value` unchanged. This is how constants (and, via template
/// resolution, structured context values) enter a pipeline.
pub struct LiteralNode;

#[async_trait]
impl ExecutableNode for LiteralNode {
    async fn run(
        &self,
        config: Value,
        _inputs: &Map<String, Value>,
        _ctx: &NodeContext,
    ) -> Result<Value, NodeError> {
        config
            .get("value")
            .cloned()
            .ok_or_else(|| NodeError::Config("missing required field 'value'".into()))
    }

    fn config_schema(&self) -> Schema {
        Schema::object(vec![Field::required("value", FieldType::Any)])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn emits_the_configured_value() {
        let out = LiteralNode
            .run(json!({ "value": { "n": 42 } }), &Map::new(), &test_context())
            .await
            .unwrap();
        assert_eq!(out, json!({ "n": 42 }));
    }

    #[tokio::test]
    async fn missing_value_is_a_config_error() {
        let err = LiteralNode
            .run(json!({}), &Map::new(), &test_context())
            .await
            .unwrap_err();
        assert!(matches!(err, NodeError::Config(_)));
    }
}
