//! # graphig
//!
//! Integrated Gradients attribution for models over graph-structured inputs.
//!
//! graphig explains the scalar prediction of a graph model feature by feature:
//!
//! - **Core**: graphs of context, node set and edge set features with a fixed topology
//! - **Explain**: feature algebra, baselines, interpolation paths, gradient accumulation
//! - **Models**: a reference message-passing model
//! - **Export**: a record parser and a model saved as one named attribution operation
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use graphig::prelude::*;
//!
//! type Ad = Autodiff<NdArray>;
//!
//! let graph = Graph::<NdArray>::from_record(&GraphRecord::from_json(bytes)?, &device)?;
//! let model = EdgeMessageReadoutConfig::new(graph.schema(), "edge", "h", "weight")?
//!     .init::<Ad>(&device)?;
//!
//! let config = IntegratedGradientsConfig::default().with_steps(32);
//! let attribution = integrated_gradients(&ReverseMode::<Ad, _>::new(&model), &graph, &config)?;
//! println!("{:?}", attribution.per_feature_totals()?);
//! ```
//!
//! ## Feature Flags
//!
//! - `backend-ndarray` (default): CPU backend using ndarray

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export all crates
pub use graphig_core as core;
pub use graphig_explain as explain;
pub use graphig_export as export;
pub use graphig_models as models;

/// Prelude module for convenient imports.
///
/// ```rust,ignore
/// use graphig::prelude::*;
/// ```
pub mod prelude {
    // Core types
    pub use graphig_core::{
        Adjacency, EdgeSet, Feature, FeaturePath, Graph, GraphRecord, GraphSchema, Name, NodeSet,
        Seed,
    };

    // Explain
    pub use graphig_explain::{
        accumulate, counterfactual, integrated_gradients, interpolate, multiply, scale, subtract,
        sum, BaselineType, Differentiable, GraphAttribution, GraphModel, IntegratedGradientsConfig,
        ReverseMode,
    };

    // Models
    pub use graphig_models::{EdgeMessageReadout, EdgeMessageReadoutConfig, ExportableModel};

    // Export
    pub use graphig_export::{
        export, ExportOptions, IntegratedGradientsExporter, JsonRecordParser, ModelExporter,
        Preprocess, SavedAttribution,
    };

    // Backends
    pub use graphig_core::backend::*;
}
