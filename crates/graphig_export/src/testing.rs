//! Shared fixtures for unit tests.

use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;
use graphig_core::{Graph, GraphRecord, GraphSchema};

pub type TestBackend = NdArray;
pub type TestAutodiff = Autodiff<NdArray>;

/// JSON record of the line graph `0 --> 1 --> 2`, with an optional context label.
pub fn line_graph_json(label: Option<f32>) -> Vec<u8> {
    let label = label
        .map(|v| format!(r#", "label": {{"shape": [1], "values": [{}]}}"#, v))
        .unwrap_or_default();
    format!(
        r#"{{
            "context": {{"h": {{"shape": [2], "values": [514, 433]}}{}}},
            "node_sets": {{"node": {{"size": 3, "features": {{"h": {{"shape": [3], "values": [8191, 9474, 1634]}}}}}}}},
            "edge_sets": {{"edge": {{
                "size": 2,
                "adjacency": {{"source": ["node", [0, 1]], "target": ["node", [1, 2]]}},
                "features": {{"weight": {{"shape": [2], "values": [153, 9]}}}}
            }}}}
        }}"#,
        label
    )
    .into_bytes()
}

pub fn line_graph_schema(with_label: bool) -> GraphSchema {
    let json = line_graph_json(with_label.then_some(1.0));
    let record = GraphRecord::from_json(&json).unwrap();
    Graph::<TestBackend>::from_record(&record, &Default::default())
        .unwrap()
        .schema()
}
