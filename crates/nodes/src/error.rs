//! Node- and registry-level error types.

use thiserror::Error;

/// Errors returned by a node's `run` method.
///
/// The executor converts either variant into a failed [`crate::NodeResult`];
/// the variant only determines the message prefix.
#[derive(Debug, Error, Clone)]
pub enum NodeError {
    /// The resolved configuration is missing a field or has the wrong shape.
    #[error("invalid node config: {0}")]
    Config(String),

    /// The node's work itself failed.
    #[error("{0}")]
    Failed(String),
}

/// Errors raised by the node registry.
#[derive(Debug, Error, Clone)]
pub enum RegistryError {
    /// A kind was re-registered with a different descriptor.
    #[error("node kind '{0}' is already registered with a different descriptor")]
    DuplicateKind(String),

    /// Lookup of an unregistered kind.
    #[error("unknown node kind: '{0}'")]
    UnknownKind(String),
}
