//! Integration tests for the attribution pipeline.
//!
//! These tests explain a small line graph end to end, directly and through a
//! saved attribution unit.

use std::path::Path;

use burn::prelude::*;
use burn_autodiff::Autodiff;
use burn_ndarray::NdArray;

use graphig::prelude::*;

type Ad = Autodiff<NdArray>;

/// `0 --> 1 --> 2` with context `h=[514, 433]`, node `h=[8191, 9474, 1634]`
/// and edge `weight=[153, 9]`.
fn line_graph(device: &<NdArray as Backend>::Device) -> Graph<NdArray> {
    let feature = |values: &[f32]| {
        Feature::from_values(values.to_vec(), &[values.len()], device).expect("valid feature")
    };

    Graph::builder()
        .context_feature("h", feature(&[514.0, 433.0]))
        .and_then(|b| {
            b.node_set(
                "node",
                NodeSet::new(3).with_feature("h", feature(&[8191.0, 9474.0, 1634.0]))?,
            )
        })
        .and_then(|b| {
            b.edge_set(
                "edge",
                EdgeSet::new(Adjacency::from_indices(("node", vec![0, 1]), ("node", vec![1, 2]))?)
                    .with_feature("weight", feature(&[153.0, 9.0]))?,
            )
        })
        .and_then(|b| b.build())
        .expect("valid line graph")
}

fn readout(graph: &Graph<NdArray>, device: &<Ad as Backend>::Device) -> EdgeMessageReadout<Ad> {
    EdgeMessageReadoutConfig::new(graph.schema(), "edge", "h", "weight")
        .and_then(|config| config.init::<Ad>(device))
        .expect("valid model")
}

fn save(graph: &Graph<NdArray>, model: &EdgeMessageReadout<Ad>, dir: &Path, steps: usize) {
    let exporter = IntegratedGradientsExporter::new("output", steps);
    ModelExporter::<Ad>::save(&exporter, &JsonRecordParser::new(graph.schema()), model, dir)
        .expect("export succeeds");
}

#[test]
fn test_exported_attribution_locality() {
    let device = Default::default();
    let graph = line_graph(&device);
    let model = readout(&graph, &device);
    let dir = tempfile::tempdir().unwrap();
    save(&graph, &model, dir.path(), 3);

    let saved: SavedAttribution<Ad, EdgeMessageReadout<Ad>> =
        SavedAttribution::load(dir.path(), &device).unwrap();
    let record = graph.to_record().unwrap().to_json().unwrap();
    let outputs = saved.invoke("integrated_gradients", &[record]).unwrap();

    let attribution = Graph::<NdArray>::from_record(&outputs["output"][0], &device).unwrap();
    assert!(graph.check_compatible(&attribution).is_ok());

    let h = attribution.node_set("node").unwrap().feature("h").unwrap().to_values().unwrap();
    let w = attribution.edge_set("edge").unwrap().feature("weight").unwrap().to_values().unwrap();
    let ctx = attribution.context().feature("h").unwrap().to_values().unwrap();

    // Node 2 only feeds node 1, edge 1 leaves node 1; neither reaches node 0.
    assert_eq!(h[2], 0.0);
    assert_eq!(w[1], 0.0);
    assert_eq!(ctx, vec![0.0, 0.0]);
}

#[test]
fn test_exported_matches_direct_attribution() {
    let device = Default::default();
    let graph = line_graph(&device);
    let model = readout(&graph, &device);
    let dir = tempfile::tempdir().unwrap();
    save(&graph, &model, dir.path(), 4);

    let direct = integrated_gradients(
        &ReverseMode::<Ad, _>::new(&model),
        &graph,
        &IntegratedGradientsConfig::default().with_steps(4),
    )
    .unwrap();

    let saved: SavedAttribution<Ad, EdgeMessageReadout<Ad>> =
        SavedAttribution::load(dir.path(), &device).unwrap();
    let record = graph.to_record().unwrap().to_json().unwrap();
    let outputs = saved.invoke("integrated_gradients", &[record]).unwrap();

    assert_eq!(outputs["output"][0], direct.values.to_record().unwrap());
}

#[test]
fn test_completeness_for_linear_model() {
    let device = Default::default();
    let graph = line_graph(&device);

    // f = 3 * h[1] - 2 * weight[0] + 0.5 * sum(context h)
    let model = |g: &Graph<Ad>| {
        let h = g.node_set("node").unwrap().feature("h").unwrap().tensor().clone();
        let w = g.edge_set("edge").unwrap().feature("weight").unwrap().tensor().clone();
        let c = g.context().feature("h").unwrap().tensor().clone();
        h.slice([1..2, 0..1]).sum() * 3.0 - w.slice([0..1, 0..1]).sum() * 2.0 + c.sum() * 0.5
    };
    let model = ReverseMode::<Ad, _>::new(&model);

    let attribution =
        integrated_gradients(&model, &graph, &IntegratedGradientsConfig::default()).unwrap();
    let (f_input, _) = model.value_and_gradients(&graph).unwrap();
    let total = attribution.total().unwrap();

    // Zero baseline: f(baseline) = 0.
    assert!((total - f_input).abs() < 1e-2 * f_input.abs());
}

#[test]
fn test_random_baseline_is_reproducible_end_to_end() {
    let device = Default::default();
    let graph = line_graph(&device);
    let model = readout(&graph, &device);
    let dir = tempfile::tempdir().unwrap();

    let options = ExportOptions::default()
        .with_steps(4)
        .with_baseline(BaselineType::Random)
        .with_seed(Seed::new(8191));
    export::<Ad, _, _>(&JsonRecordParser::new(graph.schema()), &model, dir.path(), &options)
        .unwrap();

    let saved: SavedAttribution<Ad, EdgeMessageReadout<Ad>> =
        SavedAttribution::load(dir.path(), &device).unwrap();
    let record = graph.to_record().unwrap().to_json().unwrap();

    let first = saved.invoke("integrated_gradients", &[record.clone()]).unwrap();
    let second = saved.invoke("integrated_gradients", &[record]).unwrap();
    assert_eq!(first, second);
}
