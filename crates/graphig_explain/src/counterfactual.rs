//! Counterfactual (baseline) graphs for Integrated Gradients.

use burn::prelude::*;
use graphig_core::{Feature, Graph, Seed};
use rand::Rng;

use crate::error::{ExplainError, Result};

/// Build a baseline graph with the same topology as `graph`.
///
/// With `random == false` every feature is replaced by zeros. With
/// `random == true` every value is drawn uniformly from `[min, max]` of the
/// feature it replaces, so the baseline stays within the observed range of
/// each feature. A constant feature reproduces its constant and non-finite
/// source values are ignored when computing the range.
///
/// The random stream is a ChaCha8 generator created from `seed` for this call
/// only, consumed feature by feature in graph traversal order (context, node
/// sets, edge sets, each by name). The same topology and seed therefore give
/// bit-identical baselines in any process.
///
/// # Errors
///
/// Returns [`ExplainError::InvalidSeed`] if `random` is set without a seed.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_explain::counterfactual;
///
/// let zeros = counterfactual(&graph, false, None)?;
/// let random = counterfactual(&graph, true, Some(Seed::new(8191)))?;
/// ```
pub fn counterfactual<B: Backend>(
    graph: &Graph<B>,
    random: bool,
    seed: Option<Seed>,
) -> Result<Graph<B>> {
    if !random {
        return graph.map_features(|_, f| Ok::<_, ExplainError>(f.zeros_like()));
    }

    let seed = seed.ok_or_else(|| {
        ExplainError::InvalidSeed("a random counterfactual needs a seed".to_string())
    })?;
    let mut rng = seed.to_rng();

    graph.map_features(|_, f| uniform_like(f, &mut rng))
}

fn uniform_like<B: Backend, R: Rng>(feature: &Feature<B>, rng: &mut R) -> Result<Feature<B>> {
    let values = feature.to_values()?;

    let range = values
        .iter()
        .copied()
        .filter(|v| v.is_finite())
        .fold(None, |range: Option<(f32, f32)>, v| match range {
            Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            None => Some((v, v)),
        });

    let sampled = match range {
        Some((lo, hi)) => {
            let (lo64, hi64) = (f64::from(lo), f64::from(hi));
            values
                .iter()
                .map(|_| {
                    let u = f64::from(rng.gen::<f32>());
                    // hi - lo can overflow f32 for finite values
                    ((lo64 + (hi64 - lo64) * u) as f32).clamp(lo, hi)
                })
                .collect()
        }
        None => vec![0.0; values.len()],
    };

    Ok(Feature::from_values(sampled, feature.dims(), &feature.device())?)
}
