//! Built-in node kinds.
//!
//! These are the pure data-shaping kinds the engine ships with. Effectful
//! kinds that wrap external providers register themselves through the same
//! [`crate::NodeDescriptor`] mechanism from their own crates.

mod concat;
mod echo;
mod literal;
mod output;

use std::sync::Arc;

pub use concat::ConcatNode;
pub use echo::EchoNode;
pub use literal::LiteralNode;
pub use output::OutputNode;

use crate::registry::NodeDescriptor;

/// The kind tag whose results form an execution's final output.
pub const OUTPUT_KIND: &str = "output";

/// Descriptors for every built-in kind, in registration order.
pub fn descriptors() -> Vec<NodeDescriptor> {
    vec![
        NodeDescriptor::new(
            "literal",
            Arc::new(LiteralNode),
            true,
            "Emit a constant value",
        ),
        NodeDescriptor::new(
            "echo",
            Arc::new(EchoNode),
            true,
            "Emit a templated text, optionally prefixed",
        ),
        NodeDescriptor::new(
            "concat",
            Arc::new(ConcatNode),
            true,
            "Join rendered parts with a separator",
        ),
        NodeDescriptor::new(
            OUTPUT_KIND,
            Arc::new(OutputNode),
            true,
            "Collect a value into the execution output",
        ),
    ]
}
