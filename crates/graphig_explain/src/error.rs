//! Error types for attribution.

use graphig_core::CoreError;
use thiserror::Error;

/// Result type alias for attribution operations.
pub type Result<T> = std::result::Result<T, ExplainError>;

/// Errors that can occur while computing attributions.
///
/// None of these are transient; callers should not retry.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ExplainError {
    /// Operand graphs disagree on structure.
    #[error("Topology mismatch: {0}")]
    TopologyMismatch(String),

    /// A sequence that needs at least one element was empty.
    #[error("Empty input: {0}")]
    EmptyInput(String),

    /// A random counterfactual was requested without a seed.
    #[error("Invalid seed: {0}")]
    InvalidSeed(String),

    /// The model has no finite gradient at a required point.
    #[error("Model is not differentiable{}: {reason}", step.map(|s| format!(" at path step {}", s)).unwrap_or_default())]
    NonDifferentiableModel {
        /// Index of the interpolation step, when known.
        step: Option<usize>,
        /// What was undefined.
        reason: String,
    },

    /// Any other core error (invalid graph, serialization).
    #[error("Core error: {0}")]
    Core(CoreError),
}

impl ExplainError {
    /// Attach the interpolation step to a [`ExplainError::NonDifferentiableModel`].
    #[must_use]
    pub fn at_step(self, step: usize) -> Self {
        match self {
            Self::NonDifferentiableModel { step: None, reason } => Self::NonDifferentiableModel {
                step: Some(step),
                reason,
            },
            other => other,
        }
    }
}

impl From<CoreError> for ExplainError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::TopologyMismatch(msg) => Self::TopologyMismatch(msg),
            other => Self::Core(other),
        }
    }
}
