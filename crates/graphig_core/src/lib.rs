//! # graphig_core
//!
//! Core types for graphig: graph values, topology checks and records.
//!
//! This crate provides:
//! - [`Graph`] with its [`Context`], [`NodeSet`]s and [`EdgeSet`]s
//! - [`Feature`] dense feature tensors keyed by validated [`Name`]s
//! - [`Graph::check_compatible`], the single topology-compatibility check
//! - [`GraphSchema`] for size-independent schemas
//! - [`GraphRecord`] for the JSON structured form of a graph
//! - [`Seed`] for deterministic random number generation
//!
//! ## Feature Convention
//!
//! Context features are shaped `(components, ...)`, node and edge features
//! `(set size, ...)`. The leading dimension indexes items; the remaining
//! dimensions are flattened into a width for storage.
//!
//! ## Example
//!
//! ```rust,ignore
//! use graphig_core::{Graph, GraphRecord};
//!
//! let record = GraphRecord::from_json(bytes)?;
//! let graph = Graph::<NdArray>::from_record(&record, &device)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod feature;
mod graph;
mod name;
mod record;
mod schema;
mod seed;

pub use error::{CoreError, Result};
pub use feature::Feature;
pub use graph::{
    Adjacency, Context, EdgeSet, FeatureMap, FeaturePath, Graph, GraphBuilder, NodeSet,
};
pub use name::Name;
pub use record::{AdjacencyRecord, EdgeSetRecord, FeatureRecord, GraphRecord, NodeSetRecord};
pub use schema::{EdgeSetSchema, FeatureSchema, GraphSchema, NodeSetSchema};
pub use seed::Seed;

/// Backend type aliases for convenience
pub mod backend {
    #[cfg(feature = "backend-ndarray")]
    pub use burn_ndarray::NdArray;
}
