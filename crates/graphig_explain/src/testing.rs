//! Shared fixtures for unit tests.

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use graphig_core::{Adjacency, EdgeSet, Feature, Graph, NodeSet};

pub type TestBackend = NdArray;
pub type TestAutodiff = Autodiff<NdArray>;

pub fn feature<B: Backend>(device: &B::Device, values: &[f32]) -> Feature<B> {
    Feature::from_values(values.to_vec(), &[values.len()], device).unwrap()
}

/// Three nodes on a line: `0 --edge 0--> 1 --edge 1--> 2`.
pub fn line_graph<B: Backend>(
    device: &B::Device,
    context_h: [f32; 2],
    node_h: [f32; 3],
    weight: [f32; 2],
) -> Graph<B> {
    Graph::builder()
        .context_feature("h", feature(device, &context_h))
        .unwrap()
        .node_set(
            "node",
            NodeSet::new(3).with_feature("h", feature(device, &node_h)).unwrap(),
        )
        .unwrap()
        .edge_set(
            "edge",
            EdgeSet::new(Adjacency::from_indices(("node", vec![0, 1]), ("node", vec![1, 2])).unwrap())
                .with_feature("weight", feature(device, &weight))
                .unwrap(),
        )
        .unwrap()
        .build()
        .unwrap()
}

/// The line graph used throughout the attribution tests.
pub fn gt<B: Backend>(device: &B::Device) -> Graph<B> {
    line_graph(device, [514.0, 433.0], [8191.0, 9474.0, 1634.0], [153.0, 9.0])
}

/// Values of the feature at a display path such as `nodes/node/h`.
pub fn values<B: Backend>(graph: &Graph<B>, path: &str) -> Vec<f32> {
    graph
        .features()
        .into_iter()
        .find(|(p, _)| p.to_string() == path)
        .map(|(_, f)| f.to_values().unwrap())
        .unwrap_or_else(|| panic!("no feature at {}", path))
}

pub fn bits(values: &[f32]) -> Vec<u32> {
    values.iter().map(|v| v.to_bits()).collect()
}
