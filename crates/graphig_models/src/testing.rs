//! Shared fixtures for unit tests.

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use graphig_core::{Adjacency, EdgeSet, Feature, Graph, NodeSet};

pub type TestBackend = NdArray;
pub type TestAutodiff = Autodiff<NdArray>;

fn feature<B: Backend>(device: &B::Device, values: &[f32]) -> Feature<B> {
    Feature::from_values(values.to_vec(), &[values.len()], device).unwrap()
}

/// `0 --> 1 --> 2` with a context feature the model never reads.
pub fn line_graph<B: Backend>(device: &B::Device) -> Graph<B> {
    Graph::builder()
        .context_feature("h", feature(device, &[514.0, 433.0]))
        .unwrap()
        .node_set(
            "node",
            NodeSet::new(3)
                .with_feature("h", feature(device, &[8191.0, 9474.0, 1634.0]))
                .unwrap(),
        )
        .unwrap()
        .edge_set(
            "edge",
            EdgeSet::new(Adjacency::from_indices(("node", vec![0, 1]), ("node", vec![1, 2])).unwrap())
                .with_feature("weight", feature(device, &[153.0, 9.0]))
                .unwrap(),
        )
        .unwrap()
        .build()
        .unwrap()
}
