//! Error types for graphig_core.

use thiserror::Error;

/// Result type alias using [`CoreError`].
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while building, comparing or converting graphs.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Two graphs disagree on structure (set names, sizes, adjacency or feature shapes).
    #[error("Topology mismatch: {0}")]
    TopologyMismatch(String),

    /// A graph failed structural validation while being built.
    #[error("Invalid graph: {0}")]
    InvalidGraph(String),

    /// A set or feature name was rejected.
    #[error("Invalid name {name:?}: {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },

    /// Feature values do not fit the declared shape.
    #[error("Shape mismatch: {0}")]
    ShapeMismatch(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    SerializationError(String),
}
