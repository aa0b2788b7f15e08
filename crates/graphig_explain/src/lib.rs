//! # graphig_explain
//!
//! Integrated Gradients attribution for graph-structured inputs.
//!
//! This crate provides:
//! - Graph feature algebra (subtract, multiply, scale, sum)
//! - Counterfactual baselines (zeros or seeded random)
//! - Straight-line interpolation paths between graphs
//! - Gradient accumulation along a path
//! - [`integrated_gradients`], which chains the four
//!
//! Models are supplied as [`GraphModel`]s on an autodiff backend and wrapped
//! in [`ReverseMode`] to obtain a [`Differentiable`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

mod accumulate;
mod algebra;
mod attribution;
mod counterfactual;
mod error;
mod interpolate;
mod model;

#[cfg(test)]
mod testing;

pub use accumulate::accumulate;
pub use algebra::{multiply, scale, subtract, sum};
pub use attribution::{
    integrated_gradients, BaselineType, GraphAttribution, IntegratedGradientsConfig,
};
pub use counterfactual::counterfactual;
pub use error::{ExplainError, Result};
pub use interpolate::interpolate;
pub use model::{Differentiable, GraphModel, ReverseMode};
