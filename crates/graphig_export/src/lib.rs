//! # graphig_export
//!
//! Packaging a record parser and a graph model into one named, callable
//! Integrated Gradients operation.
//!
//! This crate provides:
//! - [`Preprocess`] and [`JsonRecordParser`] for record to graph parsing
//! - [`ModelExporter`] and [`IntegratedGradientsExporter`] to save a unit
//! - [`SavedAttribution`] to load a unit and invoke it on a batch of records

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod exporter;
mod preprocess;
mod saved;

#[cfg(test)]
mod testing;

pub use error::{ExportError, Result};
pub use exporter::{
    export, ExportMetadata, ExportOptions, IntegratedGradientsExporter, ModelExporter,
};
pub use graphig_models::ExportableModel;
pub use preprocess::{JsonRecordParser, Preprocess};
pub use saved::SavedAttribution;
