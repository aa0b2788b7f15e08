//! Gradient accumulation along an interpolation path.

use burn::prelude::*;
use graphig_core::Graph;
use tracing::debug;

use crate::algebra::{multiply, scale, sum};
use crate::error::{ExplainError, Result};
use crate::model::Differentiable;

/// Accumulate delta-scaled gradients of `model` over `path`.
///
/// For every path point the gradient with respect to each feature is
/// multiplied elementwise by the matching `delta` feature and weighted by
/// `1 / path.len()`; the contributions are then summed. When `path` comes from
/// [`interpolate`](crate::interpolate) between a baseline and an input and
/// `delta` is `input - baseline`, the result is the Riemann approximation of
/// Integrated Gradients over exactly the points of that path.
///
/// # Errors
///
/// - [`ExplainError::EmptyInput`] if `path` is empty.
/// - [`ExplainError::TopologyMismatch`] if a path point disagrees with `delta`.
/// - [`ExplainError::NonDifferentiableModel`] if the model value or a gradient
///   is not finite at some point; the error carries the step index.
pub fn accumulate<B, M>(model: &M, path: &[Graph<B>], delta: &Graph<B>) -> Result<Graph<B>>
where
    B: Backend,
    M: Differentiable<B> + ?Sized,
{
    if path.is_empty() {
        return Err(ExplainError::EmptyInput(
            "cannot accumulate gradients over an empty path".to_string(),
        ));
    }
    let weight = 1.0 / path.len() as f32;

    let contributions = path
        .iter()
        .enumerate()
        .map(|(step, point)| {
            point.check_compatible(delta)?;
            let (value, gradients) = model
                .value_and_gradients(point)
                .map_err(|e| e.at_step(step))?;
            debug!(step, value, "evaluated model on path point");
            scale(&multiply(&gradients, delta)?, weight)
        })
        .collect::<Result<Vec<_>>>()?;

    sum(&contributions)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algebra::subtract;
    use crate::counterfactual::counterfactual;
    use crate::interpolate::interpolate;
    use crate::model::ReverseMode;
    use crate::testing::{gt, values, TestAutodiff, TestBackend};
    use graphig_core::Seed;

    /// Reads node 0, node 1 and edge 0 only: `(h0 + h1) * w0`.
    fn first_edge_model(g: &Graph<TestAutodiff>) -> Tensor<TestAutodiff, 1> {
        let h = g.node_set("node").unwrap().feature("h").unwrap().tensor().clone();
        let w = g.edge_set("edge").unwrap().feature("weight").unwrap().tensor().clone();
        let device = h.device();

        let used = Tensor::<TestAutodiff, 1, Int>::from_ints([0, 1], &device);
        let nodes = h.select(0, used).sum();
        let edge = w.slice([0..1, 0..1]).sum();
        nodes * edge
    }

    #[test]
    fn test_gradient_locality() {
        let device = Default::default();
        let graph = gt::<TestBackend>(&device);
        let baseline = counterfactual(&graph, false, None).unwrap();
        let path = interpolate(&baseline, &graph, 8).unwrap();
        let delta = subtract(&graph, &baseline).unwrap();

        let model = first_edge_model;
        let attribution = accumulate(&ReverseMode::<TestAutodiff, _>::new(&model), &path, &delta).unwrap();

        let node_h = values(&attribution, "nodes/node/h");
        assert!(node_h[0] != 0.0);
        assert!(node_h[1] != 0.0);
        assert_eq!(node_h[2], 0.0);

        let weight = values(&attribution, "edges/edge/weight");
        assert!(weight[0] != 0.0);
        assert_eq!(weight[1], 0.0);

        assert_eq!(values(&attribution, "context/h"), vec![0.0, 0.0]);
    }

    #[test]
    fn test_linear_model_completeness() {
        let device = Default::default();
        let graph = gt::<TestBackend>(&device);
        let baseline = counterfactual(&graph, true, Some(Seed::new(8191))).unwrap();
        let delta = subtract(&graph, &baseline).unwrap();
        let path = interpolate(&baseline, &graph, 5).unwrap();

        // f = 0.5 * sum(context h) - 3 * sum(node h) + 2 * sum(edge weight)
        let model = |g: &Graph<TestAutodiff>| {
            let c = g.context().feature("h").unwrap().tensor().clone();
            let h = g.node_set("node").unwrap().feature("h").unwrap().tensor().clone();
            let w = g.edge_set("edge").unwrap().feature("weight").unwrap().tensor().clone();
            c.sum() * 0.5 - h.sum() * 3.0 + w.sum() * 2.0
        };
        let reverse = ReverseMode::<TestAutodiff, _>::new(&model);

        let attribution = accumulate(&reverse, &path, &delta).unwrap();

        // Constant gradients: the attribution is gradient * delta exactly.
        for (feature, factor) in [("context/h", 0.5), ("nodes/node/h", -3.0), ("edges/edge/weight", 2.0)] {
            let expected: Vec<f32> = values(&delta, feature).iter().map(|d| d * factor).collect();
            for (got, want) in values(&attribution, feature).iter().zip(&expected) {
                assert!((got - want).abs() <= 1e-3 * want.abs().max(1.0), "{}", feature);
            }
        }

        let (f_input, _) = reverse.value_and_gradients(&graph).unwrap();
        let (f_baseline, _) = reverse.value_and_gradients(&baseline).unwrap();
        let total: f32 = attribution
            .features()
            .into_iter()
            .flat_map(|(_, f)| f.to_values().unwrap())
            .sum();
        assert!((total - (f_input - f_baseline)).abs() <= 1e-3 * (f_input - f_baseline).abs());
    }

    #[test]
    fn test_non_differentiable_point_reports_step() {
        let device = Default::default();
        let graph = gt::<TestBackend>(&device);
        let baseline = counterfactual(&graph, false, None).unwrap();
        let path = interpolate(&baseline, &graph, 4).unwrap();
        let delta = subtract(&graph, &baseline).unwrap();

        // d/dx sqrt(x) is undefined at the all-zero baseline.
        let model = |g: &Graph<TestAutodiff>| {
            g.node_set("node").unwrap().feature("h").unwrap().tensor().clone().sqrt().sum()
        };

        let result = accumulate(&ReverseMode::<TestAutodiff, _>::new(&model), &path, &delta);
        assert!(matches!(
            result,
            Err(ExplainError::NonDifferentiableModel { step: Some(0), .. })
        ));
    }

    #[test]
    fn test_empty_path() {
        let device = Default::default();
        let graph = gt::<TestBackend>(&device);
        let model = first_edge_model;

        let result = accumulate(&ReverseMode::<TestAutodiff, _>::new(&model), &[], &graph);
        assert!(matches!(result, Err(ExplainError::EmptyInput(_))));
    }

    #[test]
    fn test_path_delta_mismatch() {
        let device = Default::default();
        let graph = gt::<TestBackend>(&device);
        let empty = Graph::<TestBackend>::builder().build().unwrap();
        let model = first_edge_model;

        let result = accumulate(&ReverseMode::<TestAutodiff, _>::new(&model), &[graph], &empty);
        assert!(matches!(result, Err(ExplainError::TopologyMismatch(_))));
    }
}
