//! `MockNode` — a programmable test double for `ExecutableNode`.
//!
//! Useful in unit and integration tests where a real node implementation is
//! either unavailable or irrelevant.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::schema::Schema;
use crate::traits::{ExecutableNode, NodeContext};
use crate::NodeError;

/// Behaviour injected into `MockNode` at construction time.
pub enum MockBehaviour {
    /// Return a specific JSON value.
    ReturnValue(Value),
    /// Fail with the given message.
    Fail(String),
    /// Sleep, then return the value. Aborts early (as a failure) when the
    /// execution's cancellation token fires during the sleep.
    Delay(Duration, Value),
}

/// A mock node that records every call it receives and returns a
/// programmer-specified result.
pub struct MockNode {
    /// Label used in test assertions.
    pub name: String,
    /// What the node will do when `run` is called.
    pub behaviour: MockBehaviour,
    /// All (config, inputs) pairs seen by this node, in call order.
    pub calls: Arc<Mutex<Vec<(Value, Map<String, Value>)>>>,
}

impl MockNode {
    /// Create a mock that always succeeds with the given value.
    pub fn returning(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::ReturnValue(value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that always fails with the given message.
    pub fn failing(name: impl Into<String>, msg: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::Fail(msg.into()),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Create a mock that sleeps before succeeding.
    pub fn delayed(name: impl Into<String>, delay: Duration, value: Value) -> Self {
        Self {
            name: name.into(),
            behaviour: MockBehaviour::Delay(delay, value),
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Number of times this node has been executed.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl ExecutableNode for MockNode {
    async fn run(
        &self,
        config: Value,
        inputs: &Map<String, Value>,
        ctx: &NodeContext,
    ) -> Result<Value, NodeError> {
        self.calls.lock().unwrap().push((config, inputs.clone()));

        match &self.behaviour {
            MockBehaviour::ReturnValue(v) => Ok(v.clone()),
            MockBehaviour::Fail(msg) => Err(NodeError::Failed(msg.clone())),
            MockBehaviour::Delay(delay, v) => {
                tokio::select! {
                    _ = tokio::time::sleep(*delay) => Ok(v.clone()),
                    _ = ctx.cancellation.cancelled() => {
                        Err(NodeError::Failed(format!("'{}' cancelled mid-run", self.name)))
                    }
                }
            }
        }
    }

    fn config_schema(&self) -> Schema {
        Schema::any()
    }
}
