//! Dense feature tensors attached to a graph piece.

use burn::prelude::*;
use burn::tensor::TensorData;

use crate::error::{CoreError, Result};

/// A dense feature tensor with its logical shape.
///
/// The values are stored as a Burn tensor of shape `(items, width)` where
/// `items` is the leading dimension of the logical shape and `width` the
/// product of the remaining dimensions. A feature shaped `[3]` is stored as
/// `(3, 1)`, one shaped `[3, 4, 2]` as `(3, 8)` and a scalar shaped `[]` as
/// `(1, 1)`. Topology checks compare the logical shape.
///
/// # Example
///
/// ```rust,ignore
/// use graphig_core::Feature;
///
/// let h = Feature::<NdArray>::from_values(vec![8191.0, 9474.0, 1634.0], &[3], &device)?;
/// assert_eq!(h.dims(), &[3]);
/// assert_eq!(h.tensor().dims(), [3, 1]);
/// ```
#[derive(Debug, Clone)]
pub struct Feature<B: Backend> {
    tensor: Tensor<B, 2>,
    dims: Vec<usize>,
}

impl<B: Backend> Feature<B> {
    /// Wrap a 2D tensor holding a feature of logical shape `dims`.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if `dims` does not flatten to the
    /// tensor shape.
    pub fn with_dims(tensor: Tensor<B, 2>, dims: &[usize]) -> Result<Self> {
        let expected = flat_dims(dims);
        let got = tensor.dims();
        if expected != got {
            return Err(CoreError::ShapeMismatch(format!(
                "feature of shape {:?} must be stored as {:?}, got {:?}",
                dims, expected, got
            )));
        }
        Ok(Self {
            tensor,
            dims: dims.to_vec(),
        })
    }

    /// Build a feature from row-major values.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the number of values does not
    /// match the product of `dims`.
    pub fn from_values(values: Vec<f32>, dims: &[usize], device: &B::Device) -> Result<Self> {
        let [items, width] = flat_dims(dims);
        if values.len() != items * width {
            return Err(CoreError::ShapeMismatch(format!(
                "{} values cannot fill a feature of shape {:?}",
                values.len(),
                dims
            )));
        }
        let tensor = Tensor::from_data(TensorData::new(values, [items, width]), device);
        Ok(Self {
            tensor,
            dims: dims.to_vec(),
        })
    }

    /// A feature of the same shape and device filled with zeros.
    pub fn zeros_like(&self) -> Self {
        Self {
            tensor: self.tensor.zeros_like(),
            dims: self.dims.clone(),
        }
    }

    /// Logical shape of the feature.
    #[must_use]
    pub fn dims(&self) -> &[usize] {
        &self.dims
    }

    /// Number of items (leading dimension, 1 for a scalar).
    #[must_use]
    pub fn items(&self) -> usize {
        flat_dims(&self.dims)[0]
    }

    /// Number of scalar values per item.
    #[must_use]
    pub fn width(&self) -> usize {
        flat_dims(&self.dims)[1]
    }

    /// Logical shape of one item.
    #[must_use]
    pub fn item_dims(&self) -> &[usize] {
        self.dims.get(1..).unwrap_or_default()
    }

    /// Total number of scalar values.
    #[must_use]
    pub fn num_elements(&self) -> usize {
        self.dims.iter().product()
    }

    /// The stored `(items, width)` tensor.
    #[must_use]
    pub const fn tensor(&self) -> &Tensor<B, 2> {
        &self.tensor
    }

    /// Consume the feature and return the stored tensor.
    #[must_use]
    pub fn into_tensor(self) -> Tensor<B, 2> {
        self.tensor
    }

    /// Device the values live on.
    pub fn device(&self) -> B::Device {
        self.tensor.device()
    }

    /// Copy the values to the host in row-major order.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::SerializationError`] if the backend data cannot
    /// be read as `f32`.
    pub fn to_values(&self) -> Result<Vec<f32>> {
        self.tensor
            .to_data()
            .convert::<f32>()
            .to_vec::<f32>()
            .map_err(|e| CoreError::SerializationError(format!("{:?}", e)))
    }

    /// Apply a tensor transform, possibly onto another backend.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::ShapeMismatch`] if the transform changed the
    /// stored shape.
    pub fn map_tensor<B2, F>(&self, f: F) -> Result<Feature<B2>>
    where
        B2: Backend,
        F: FnOnce(Tensor<B, 2>) -> Tensor<B2, 2>,
    {
        Feature::with_dims(f(self.tensor.clone()), &self.dims)
    }
}

/// Storage shape `(items, width)` for a logical shape.
fn flat_dims(dims: &[usize]) -> [usize; 2] {
    match dims.split_first() {
        Some((&items, rest)) => [items, rest.iter().product()],
        None => [1, 1],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use burn_ndarray::NdArray;

    type TestBackend = NdArray;

    #[test]
    fn test_from_values_rank_one() {
        let device = Default::default();
        let f = Feature::<TestBackend>::from_values(vec![1.0, 2.0, 3.0], &[3], &device).unwrap();

        assert_eq!(f.dims(), &[3]);
        assert_eq!(f.items(), 3);
        assert_eq!(f.width(), 1);
        assert_eq!(f.tensor().dims(), [3, 1]);
        assert_eq!(f.to_values().unwrap(), vec![1.0, 2.0, 3.0]);
    }

    #[test]
    fn test_from_values_higher_rank() {
        let device = Default::default();
        let values: Vec<f32> = (0..12).map(|i| i as f32).collect();
        let f = Feature::<TestBackend>::from_values(values, &[2, 3, 2], &device).unwrap();

        assert_eq!(f.tensor().dims(), [2, 6]);
        assert_eq!(f.num_elements(), 12);
    }

    #[test]
    fn test_from_values_wrong_count() {
        let device = Default::default();
        let result = Feature::<TestBackend>::from_values(vec![1.0, 2.0], &[3], &device);
        assert!(matches!(result, Err(CoreError::ShapeMismatch(_))));
    }

    #[test]
    fn test_scalar_feature() {
        let device = Default::default();
        let f = Feature::<TestBackend>::from_values(vec![2.5], &[], &device).unwrap();

        assert_eq!(f.dims(), &[] as &[usize]);
        assert_eq!(f.tensor().dims(), [1, 1]);
        assert_eq!(f.items(), 1);
        assert_eq!(f.width(), 1);
        assert_eq!(f.num_elements(), 1);
        assert!(f.item_dims().is_empty());
        assert_eq!(f.to_values().unwrap(), vec![2.5]);
    }

    #[test]
    fn test_scalar_feature_wrong_count() {
        let device = Default::default();
        let result = Feature::<TestBackend>::from_values(vec![1.0, 2.0], &[], &device);
        assert!(matches!(result, Err(CoreError::ShapeMismatch(_))));
    }

    #[test]
    fn test_zeros_like() {
        let device = Default::default();
        let f = Feature::<TestBackend>::from_values(vec![5.0, -2.0], &[2], &device).unwrap();
        let z = f.zeros_like();

        assert_eq!(z.dims(), f.dims());
        assert_eq!(z.to_values().unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn test_map_tensor_rejects_reshape() {
        let device = Default::default();
        let f = Feature::<TestBackend>::from_values(vec![1.0, 2.0], &[2], &device).unwrap();
        let result = f.map_tensor(|t| t.reshape([1, 2]));
        assert!(matches!(result, Err(CoreError::ShapeMismatch(_))));
    }
}
