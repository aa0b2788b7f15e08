//! Elementwise arithmetic over every feature of a graph.
//!
//! Each operation treats context, node set and edge set features
//! independently and requires its operands to be topology-compatible.

use burn::prelude::*;
use graphig_core::{Feature, Graph};

use crate::error::{ExplainError, Result};

/// Per-feature `a - b`.
///
/// # Errors
///
/// Returns [`ExplainError::TopologyMismatch`] if the graphs are not compatible.
pub fn subtract<B: Backend>(a: &Graph<B>, b: &Graph<B>) -> Result<Graph<B>> {
    a.zip_features(b, |_, x, y| binary(x, y, |x, y| x - y))
}

/// Per-feature elementwise `a * b`.
///
/// # Errors
///
/// Returns [`ExplainError::TopologyMismatch`] if the graphs are not compatible.
pub fn multiply<B: Backend>(a: &Graph<B>, b: &Graph<B>) -> Result<Graph<B>> {
    a.zip_features(b, |_, x, y| binary(x, y, |x, y| x * y))
}

/// Per-feature multiplication by a scalar.
///
/// # Errors
///
/// Only fails if a backend changes a feature's shape, which is a bug.
pub fn scale<B: Backend>(graph: &Graph<B>, factor: f32) -> Result<Graph<B>> {
    graph.map_features(|_, f| f.map_tensor(|t| t * factor).map_err(ExplainError::from))
}

/// Per-feature elementwise sum of a sequence of graphs.
///
/// # Errors
///
/// Returns [`ExplainError::EmptyInput`] if `graphs` is empty, and
/// [`ExplainError::TopologyMismatch`] if any two graphs are not compatible.
pub fn sum<B: Backend>(graphs: &[Graph<B>]) -> Result<Graph<B>> {
    let (first, rest) = graphs
        .split_first()
        .ok_or_else(|| ExplainError::EmptyInput("cannot sum an empty sequence of graphs".into()))?;

    rest.iter().try_fold(first.clone(), |acc, graph| {
        acc.zip_features(graph, |_, x, y| binary(x, y, |x, y| x + y))
    })
}

fn binary<B, F>(x: &Feature<B>, y: &Feature<B>, op: F) -> Result<Feature<B>>
where
    B: Backend,
    F: FnOnce(Tensor<B, 2>, Tensor<B, 2>) -> Tensor<B, 2>,
{
    Ok(x.map_tensor(|t| op(t, y.tensor().clone()))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{line_graph, values, TestBackend};

    #[test]
    fn test_subtract_graph_features() {
        let device = Default::default();
        let gt = line_graph::<TestBackend>(&device, [514.0, 433.0], [8191.0, 9474.0, 1634.0], [153.0, 9.0]);
        let other = line_graph::<TestBackend>(&device, [4.0, 8.0], [1.0, 2.0, 3.0], [2.0, 1.0]);

        let deltas = subtract(&gt, &other).unwrap();

        assert_eq!(values(&deltas, "context/h"), vec![514.0 - 4.0, 433.0 - 8.0]);
        assert_eq!(values(&deltas, "edges/edge/weight"), vec![153.0 - 2.0, 9.0 - 1.0]);
        assert_eq!(
            values(&deltas, "nodes/node/h"),
            vec![8191.0 - 1.0, 9474.0 - 2.0, 1634.0 - 3.0]
        );
    }

    #[test]
    fn test_sum_graph_features() {
        let device = Default::default();
        let gt = line_graph::<TestBackend>(&device, [514.0, 433.0], [8191.0, 9474.0, 1634.0], [153.0, 9.0]);

        let summation = sum(&vec![gt.clone(); 4]).unwrap();

        assert_eq!(values(&summation, "context/h"), vec![514.0 * 4.0, 433.0 * 4.0]);
        assert_eq!(values(&summation, "edges/edge/weight"), vec![153.0 * 4.0, 9.0 * 4.0]);
        assert_eq!(
            values(&summation, "nodes/node/h"),
            vec![8191.0 * 4.0, 9474.0 * 4.0, 1634.0 * 4.0]
        );
    }

    #[test]
    fn test_sum_matches_scale() {
        let device = Default::default();
        let g = line_graph::<TestBackend>(&device, [1.5, -2.0], [0.25, 3.0, 7.0], [-1.0, 0.5]);

        for k in 1..=5 {
            let summed = sum(&vec![g.clone(); k]).unwrap();
            let scaled = scale(&g, k as f32).unwrap();
            for path in ["context/h", "nodes/node/h", "edges/edge/weight"] {
                assert_eq!(values(&summed, path), values(&scaled, path), "k={} {}", k, path);
            }
        }
    }

    #[test]
    fn test_sum_empty() {
        let result = sum::<TestBackend>(&[]);
        assert!(matches!(result, Err(ExplainError::EmptyInput(_))));
    }

    #[test]
    fn test_multiply() {
        let device = Default::default();
        let a = line_graph::<TestBackend>(&device, [1.0, 2.0], [1.0, 2.0, 3.0], [4.0, 5.0]);
        let b = line_graph::<TestBackend>(&device, [3.0, 0.5], [2.0, 2.0, -1.0], [0.0, 2.0]);

        let product = multiply(&a, &b).unwrap();

        assert_eq!(values(&product, "context/h"), vec![3.0, 1.0]);
        assert_eq!(values(&product, "nodes/node/h"), vec![2.0, 4.0, -3.0]);
        assert_eq!(values(&product, "edges/edge/weight"), vec![0.0, 10.0]);
    }

    #[test]
    fn test_mismatched_operands() {
        let device = Default::default();
        let a = line_graph::<TestBackend>(&device, [1.0, 2.0], [1.0, 2.0, 3.0], [4.0, 5.0]);
        let b = Graph::<TestBackend>::builder().build().unwrap();

        assert!(matches!(subtract(&a, &b), Err(ExplainError::TopologyMismatch(_))));
        assert!(matches!(multiply(&a, &b), Err(ExplainError::TopologyMismatch(_))));
        assert!(matches!(sum(&[a, b]), Err(ExplainError::TopologyMismatch(_))));
    }
}
