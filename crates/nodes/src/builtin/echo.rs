//! `echo` — emit a templated text, optionally prefixed.

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::schema::{Field, FieldType, Schema};
use crate::traits::{ExecutableNode, NodeContext};
use crate::NodeError;

/// Emits `prefix + text`. `text` is usually a template reference to an
/// upstream node; the executor hands it over already resolved.
pub struct EchoNode;

#[async_trait]
impl ExecutableNode for EchoNode {
    async fn run(
        &self,
        config: Value,
        _inputs: &Map<String, Value>,
        _ctx: &NodeContext,
    ) -> Result<Value, NodeError> {
        let text = config
            .get("text")
            .and_then(Value::as_str)
            .ok_or_else(|| NodeError::Config("missing required field 'text'".into()))?;

        let prefix = config.get("prefix").and_then(Value::as_str).unwrap_or("");

        Ok(Value::String(format!("{prefix}{text}")))
    }

    fn config_schema(&self) -> Schema {
        Schema::object(vec![
            Field::required("text", FieldType::String),
            Field::optional("prefix", FieldType::String),
        ])
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::test_context;
    use serde_json::json;

    #[tokio::test]
    async fn prefixes_the_text() {
        let out = EchoNode
            .run(
                json!({ "prefix": "X-", "text": "hi" }),
                &Map::new(),
                &test_context(),
            )
            .await
            .unwrap();
        assert_eq!(out, json!("X-hi"));
    }

    #[tokio::test]
    async fn prefix_is_optional() {
        let out = EchoNode
            .run(json!({ "text": "plain" }), &Map::new(), &test_context())
            .await
            .unwrap();
        assert_eq!(out, json!("plain"));
    }
}
