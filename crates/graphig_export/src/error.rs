//! Error types for exporting and invoking attribution units.

use graphig_core::CoreError;
use graphig_explain::ExplainError;
use thiserror::Error;

/// Result type alias for export operations.
pub type Result<T> = std::result::Result<T, ExportError>;

/// Errors that can occur while saving, loading or invoking an export.
#[derive(Error, Debug)]
pub enum ExportError {
    /// The destination cannot be created or written.
    #[error("Destination error: {0}")]
    Destination(String),

    /// The preprocess output is not accepted by the model.
    #[error("Incompatible schema: {0}")]
    IncompatibleSchema(String),

    /// A record in a batch could not be parsed.
    #[error("Invalid record {index}: {reason}")]
    Record {
        /// Position of the record in the batch.
        index: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// No operation is exported under the requested name.
    #[error("Unknown signature '{name}', available: {available:?}")]
    UnknownSignature {
        /// Requested name.
        name: String,
        /// Names the export provides.
        available: Vec<String>,
    },

    /// A saved file is malformed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Attribution failed.
    #[error("Attribution error: {0}")]
    Explain(#[from] ExplainError),

    /// Core error.
    #[error("Core error: {0}")]
    Core(#[from] CoreError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
