//! # graphig_models
//!
//! Graph models for graphig.
//!
//! - [`EdgeMessageReadout`] - one round of edge messages with a first-node readout
//! - [`ExportableModel`] - what a model needs to be saved with an attribution unit

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod readout;
pub mod traits;

#[cfg(test)]
mod testing;

pub use readout::{EdgeMessageReadout, EdgeMessageReadoutConfig};
pub use traits::ExportableModel;
