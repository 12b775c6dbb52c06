//! The process-wide node-kind registry.
//!
//! Initialised once at startup and treated as read-only afterwards; the
//! executor holds it behind an `Arc` with no locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::builtin;
use crate::schema::Schema;
use crate::traits::ExecutableNode;
use crate::RegistryError;

/// Everything the engine knows about one node kind.
#[derive(Clone)]
pub struct NodeDescriptor {
    /// The kind tag referenced by `NodeDefinition::kind`.
    pub kind: String,
    /// Shared instance dispatched for every invocation of this kind.
    pub node: Arc<dyn ExecutableNode>,
    /// Whether results of this kind may be served from the result cache.
    /// Non-deterministic kinds must opt out.
    pub cacheable: bool,
    /// Human-readable summary for listing/preview tooling.
    pub description: String,
}

impl NodeDescriptor {
    pub fn new(
        kind: impl Into<String>,
        node: Arc<dyn ExecutableNode>,
        cacheable: bool,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            node,
            cacheable,
            description: description.into(),
        }
    }

    /// Schemas plus metadata; two descriptors for the same kind are
    /// interchangeable iff these match.
    fn shape(&self) -> (Schema, Schema, Schema, bool, &str) {
        (
            self.node.config_schema(),
            self.node.input_schema(),
            self.node.output_schema(),
            self.cacheable,
            &self.description,
        )
    }
}

impl std::fmt::Debug for NodeDescriptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeDescriptor")
            .field("kind", &self.kind)
            .field("cacheable", &self.cacheable)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// Maps `kind` strings to node descriptors, preserving registration order.
#[derive(Debug, Default)]
pub struct NodeRegistry {
    entries: HashMap<String, NodeDescriptor>,
    order: Vec<String>,
}

impl NodeRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry pre-loaded with the built-in kinds
    /// (`literal`, `echo`, `concat`, `output`).
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for descriptor in builtin::descriptors() {
            // Built-in kinds are distinct, so this cannot fail.
            let _ = registry.register(descriptor);
        }
        registry
    }

    /// Register a kind.
    ///
    /// Re-registering an identical descriptor is a no-op; a different
    /// descriptor under an existing kind fails with
    /// [`RegistryError::DuplicateKind`].
    pub fn register(&mut self, descriptor: NodeDescriptor) -> Result<(), RegistryError> {
        if let Some(existing) = self.entries.get(&descriptor.kind) {
            if existing.shape() == descriptor.shape() {
                return Ok(());
            }
            return Err(RegistryError::DuplicateKind(descriptor.kind));
        }

        let kind = descriptor.kind.clone();
        self.order.push(kind.clone());
        self.entries.insert(kind.clone(), descriptor);
        tracing::debug!(%kind, "node kind registered");
        Ok(())
    }

    /// Look up a kind's descriptor.
    pub fn get(&self, kind: &str) -> Result<&NodeDescriptor, RegistryError> {
        self.entries
            .get(kind)
            .ok_or_else(|| RegistryError::UnknownKind(kind.to_string()))
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.entries.contains_key(kind)
    }

    /// All descriptors in registration order.
    pub fn list(&self) -> Vec<&NodeDescriptor> {
        self.order
            .iter()
            .filter_map(|kind| self.entries.get(kind))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::MockNode;
    use serde_json::json;

    fn mock_descriptor(kind: &str, cacheable: bool) -> NodeDescriptor {
        NodeDescriptor::new(
            kind,
            Arc::new(MockNode::returning(kind, json!({ "ok": true }))),
            cacheable,
            "test double",
        )
    }

    #[test]
    fn builtins_are_listed_in_registration_order() {
        let registry = NodeRegistry::with_builtins();
        let kinds: Vec<&str> = registry.list().iter().map(|d| d.kind.as_str()).collect();
        assert_eq!(kinds, vec!["literal", "echo", "concat", "output"]);
    }

    #[test]
    fn identical_reregistration_is_a_noop() {
        let mut registry = NodeRegistry::new();
        registry.register(mock_descriptor("mock", true)).unwrap();
        registry.register(mock_descriptor("mock", true)).unwrap();
        assert_eq!(registry.list().len(), 1);
    }

    #[test]
    fn conflicting_reregistration_fails() {
        let mut registry = NodeRegistry::new();
        registry.register(mock_descriptor("mock", true)).unwrap();
        let err = registry.register(mock_descriptor("mock", false)).unwrap_err();
        assert!(matches!(err, RegistryError::DuplicateKind(kind) if kind == "mock"));
    }

    #[test]
    fn unknown_kind_lookup_fails() {
        let registry = NodeRegistry::new();
        assert!(matches!(
            registry.get("ghost"),
            Err(RegistryError::UnknownKind(kind)) if kind == "ghost"
        ));
    }
}
