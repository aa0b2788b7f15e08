//! Straight-line interpolation paths between graphs.

use burn::prelude::*;
use graphig_core::Graph;

use crate::algebra::subtract;
use crate::error::{ExplainError, Result};

/// Interpolate every feature from `start` to `end` in `steps` points.
///
/// Element `i` holds `start + (end - start) * i / (steps - 1)` for every
/// feature. The first element is `start` and the last is `end`, both cloned
/// rather than computed, so they match the endpoints bit for bit. With
/// `steps == 1` the single element is `end`.
///
/// The path is fully materialized; elements share no mutable state.
///
/// # Errors
///
/// Returns [`ExplainError::EmptyInput`] if `steps` is zero and
/// [`ExplainError::TopologyMismatch`] if the endpoints are not compatible.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_explain::{counterfactual, interpolate};
///
/// let baseline = counterfactual(&graph, false, None)?;
/// let path = interpolate(&baseline, &graph, 32)?;
/// assert_eq!(path.len(), 32);
/// ```
pub fn interpolate<B: Backend>(
    start: &Graph<B>,
    end: &Graph<B>,
    steps: usize,
) -> Result<Vec<Graph<B>>> {
    if steps == 0 {
        return Err(ExplainError::EmptyInput(
            "an interpolation path needs at least one step".to_string(),
        ));
    }
    start.check_compatible(end)?;
    if steps == 1 {
        return Ok(vec![end.clone()]);
    }

    let delta = subtract(end, start)?;
    let last = steps - 1;

    (0..steps)
        .map(|i| {
            if i == 0 {
                Ok(start.clone())
            } else if i == last {
                Ok(end.clone())
            } else {
                start.zip_features(&delta, |_, s, d| {
                    let offset = d.tensor().clone() * (i as f32) / (last as f32);
                    s.map_tensor(|t| t + offset).map_err(ExplainError::from)
                })
            }
        })
        .collect()
}
