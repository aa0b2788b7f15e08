//! Trait implementations that let models be explained and exported.

use std::fmt::Debug;

use burn::module::AutodiffModule;
use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use graphig_core::{CoreError, Graph, GraphSchema};
use graphig_explain::{GraphModel, Result};
use serde::{de::DeserializeOwned, Serialize};

use crate::readout::{EdgeMessageReadout, EdgeMessageReadoutConfig};

/// A graph model that can be rebuilt from a serialized config and a record.
///
/// Exporters persist [`ExportableModel::config`] as JSON next to the module
/// record; loading calls [`ExportableModel::init`] and then loads the record
/// into the fresh module, so only the model type is needed to load.
pub trait ExportableModel<B: AutodiffBackend>: GraphModel<B> + AutodiffModule<B> {
    /// Architecture name written to export metadata.
    const ARCH: &'static str;

    /// Serializable configuration.
    type Config: Clone + Debug + Serialize + DeserializeOwned;

    /// Configuration the model was built from.
    fn config(&self) -> Self::Config;

    /// Build a freshly initialized model.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is inconsistent.
    fn init(config: &Self::Config, device: &B::Device) -> std::result::Result<Self, CoreError>
    where
        Self: Sized;

    /// Schema of the graphs the model accepts.
    fn input_spec(&self) -> GraphSchema;
}

impl<B: AutodiffBackend> GraphModel<B> for EdgeMessageReadout<B> {
    fn forward(&self, graph: &Graph<B>) -> Result<Tensor<B, 1>> {
        Ok(self.forward(graph)?)
    }
}

impl<B: AutodiffBackend> ExportableModel<B> for EdgeMessageReadout<B> {
    const ARCH: &'static str = "EdgeMessageReadout";

    type Config = EdgeMessageReadoutConfig;

    fn config(&self) -> Self::Config {
        EdgeMessageReadout::config(self).clone()
    }

    fn init(config: &Self::Config, device: &B::Device) -> std::result::Result<Self, CoreError> {
        config.init(device)
    }

    fn input_spec(&self) -> GraphSchema {
        EdgeMessageReadout::config(self).input_spec.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line_graph, TestAutodiff, TestBackend};
    use graphig_explain::{Differentiable, ReverseMode};

    #[test]
    fn test_rebuild_from_config() {
        let device = Default::default();
        let graph = line_graph::<TestAutodiff>(&device);

        let config = EdgeMessageReadoutConfig::new(graph.schema(), "edge", "h", "weight").unwrap();
        let model = config.init::<TestAutodiff>(&device).unwrap();

        let json = serde_json::to_string(&ExportableModel::config(&model)).unwrap();
        let decoded: EdgeMessageReadoutConfig = serde_json::from_str(&json).unwrap();
        let rebuilt =
            <EdgeMessageReadout<TestAutodiff> as ExportableModel<TestAutodiff>>::init(&decoded, &device)
                .unwrap();

        assert_eq!(rebuilt.input_spec(), graph.schema());
        assert_eq!(<EdgeMessageReadout<TestAutodiff> as ExportableModel<TestAutodiff>>::ARCH, "EdgeMessageReadout");
    }

    #[test]
    fn test_gradient_locality() {
        let device = Default::default();
        let graph = line_graph::<TestBackend>(&device);

        let model = EdgeMessageReadoutConfig::new(graph.schema(), "edge", "h", "weight")
            .unwrap()
            .init::<TestAutodiff>(&device)
            .unwrap();

        let (_, grads) = ReverseMode::<TestAutodiff, _>::new(&model)
            .value_and_gradients(&graph)
            .unwrap();

        let h = grads.node_set("node").unwrap().feature("h").unwrap().to_values().unwrap();
        let w = grads.edge_set("edge").unwrap().feature("weight").unwrap().to_values().unwrap();
        let ctx = grads.context().feature("h").unwrap().to_values().unwrap();

        assert_eq!(h[2], 0.0);
        assert_eq!(w[1], 0.0);
        assert_eq!(ctx, vec![0.0, 0.0]);
    }
}
