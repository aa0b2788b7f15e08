//! Model interfaces used by attribution.
//!
//! [`GraphModel`] is what callers supply: a forward pass over a graph on an
//! autodiff backend. [`Differentiable`] is what the accumulator consumes: a
//! value and gradients with respect to every feature. [`ReverseMode`] bridges
//! the two with Burn's reverse-mode autodiff, so the accumulator itself never
//! touches an autodiff engine.

use std::marker::PhantomData;

use burn::prelude::*;
use burn::tensor::backend::AutodiffBackend;
use graphig_core::{Feature, FeaturePath, Graph};

use crate::error::{ExplainError, Result};

/// A model producing one scalar per graph component.
///
/// Closures `Fn(&Graph<B>) -> Tensor<B, 1>` implement this trait and never fail.
pub trait GraphModel<B: AutodiffBackend> {
    /// Forward pass.
    ///
    /// # Returns
    ///
    /// Tensor of shape `(components,)`. Attribution differentiates its sum.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::TopologyMismatch`] if the graph lacks a set or
    /// feature the model reads.
    fn forward(&self, graph: &Graph<B>) -> Result<Tensor<B, 1>>;
}

impl<B, F> GraphModel<B> for F
where
    B: AutodiffBackend,
    F: Fn(&Graph<B>) -> Tensor<B, 1>,
{
    fn forward(&self, graph: &Graph<B>) -> Result<Tensor<B, 1>> {
        Ok(self(graph))
    }
}

/// A scalar function of a graph with gradients for every feature.
pub trait Differentiable<B: Backend> {
    /// Evaluate the function and its gradient with respect to every feature.
    ///
    /// The returned gradient graph is topology-compatible with `graph`.
    ///
    /// # Errors
    ///
    /// Returns [`ExplainError::NonDifferentiableModel`] if the value or any
    /// gradient is not finite.
    fn value_and_gradients(&self, graph: &Graph<B>) -> Result<(f32, Graph<B>)>;
}

/// Reverse-mode differentiation of a [`GraphModel`] on an autodiff backend.
///
/// Graphs are given on the inner backend; every feature is lifted onto the
/// autodiff backend with gradient tracking, the model output is summed and
/// back-propagated, and the gradients are read back per feature. A feature
/// the model never reads gets a zero gradient.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_explain::{GraphModel, ReverseMode};
///
/// type Ad = Autodiff<NdArray>;
/// let model = |g: &Graph<Ad>| g.context().feature("h").unwrap().tensor().clone().sum();
/// let (value, grads) = ReverseMode::<Ad, _>::new(&model).value_and_gradients(&graph)?;
/// ```
#[derive(Debug)]
pub struct ReverseMode<'a, B: AutodiffBackend, M> {
    model: &'a M,
    _backend: PhantomData<B>,
}

impl<'a, B: AutodiffBackend, M: GraphModel<B>> ReverseMode<'a, B, M> {
    /// Wrap a model.
    pub fn new(model: &'a M) -> Self {
        Self {
            model,
            _backend: PhantomData,
        }
    }
}

impl<B: AutodiffBackend, M: GraphModel<B>> Differentiable<B::InnerBackend>
    for ReverseMode<'_, B, M>
{
    fn value_and_gradients(
        &self,
        graph: &Graph<B::InnerBackend>,
    ) -> Result<(f32, Graph<B::InnerBackend>)> {
        let watched: Graph<B> = graph.map_features(|_, f| {
            f.map_tensor(|t| Tensor::<B, 2>::from_inner(t).require_grad())
                .map_err(ExplainError::from)
        })?;

        let output = self.model.forward(&watched)?.sum();
        let value: f32 = output.clone().into_scalar().elem();
        if !value.is_finite() {
            return Err(ExplainError::NonDifferentiableModel {
                step: None,
                reason: format!("model output is {}", value),
            });
        }

        let grads = output.backward();
        let gradients = watched.map_features(|path, f| -> Result<Feature<B::InnerBackend>> {
            let grad = match f.tensor().grad(&grads) {
                Some(grad) => Feature::with_dims(grad, f.dims())?,
                None => Feature::with_dims(f.tensor().clone().inner().zeros_like(), f.dims())?,
            };
            ensure_finite(path, &grad)?;
            Ok(grad)
        })?;

        Ok((value, gradients))
    }
}

fn ensure_finite<B: Backend>(path: &FeaturePath, gradient: &Feature<B>) -> Result<()> {
    let values = gradient.to_values()?;
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(ExplainError::NonDifferentiableModel {
            step: None,
            reason: format!(
                "gradient of {} is {} at element {}",
                path, values[index], index
            ),
        }),
        None => Ok(()),
    }
}
