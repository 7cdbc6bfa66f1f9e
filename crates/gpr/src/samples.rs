use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array2, ArrayBase, Data, Ix1};

/// Ordered collection of training `(input, output)` pairs.
///
/// Row `i` of [`SampleStore::inputs`] and [`SampleStore::outputs`] is the `i`-th added sample.
/// Input and output dimensions are fixed by the first sample.
#[derive(Debug, Clone)]
pub struct SampleStore<F: Float> {
    inputs: Array2<F>,
    outputs: Array2<F>,
}

impl<F: Float> Default for SampleStore<F> {
    fn default() -> Self {
        SampleStore {
            inputs: Array2::zeros((0, 0)),
            outputs: Array2::zeros((0, 0)),
        }
    }
}

impl<F: Float> SampleStore<F> {
    /// Empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample, checking its dimensions against previously stored samples
    pub fn push(
        &mut self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<()> {
        if self.is_empty() {
            if x.is_empty() || y.is_empty() {
                return Err(GpError::InvalidValueError(
                    "sample input and output should not be empty".to_string(),
                ));
            }
            self.inputs = Array2::zeros((0, x.len()));
            self.outputs = Array2::zeros((0, y.len()));
        }
        if x.len() != self.input_dim() {
            return Err(GpError::dimension("sample input", self.input_dim(), x.len()));
        }
        if y.len() != self.output_dim() {
            return Err(GpError::dimension("sample output", self.output_dim(), y.len()));
        }
        self.inputs
            .push_row(x.view())
            .map_err(|e| GpError::InvalidValueError(e.to_string()))?;
        self.outputs
            .push_row(y.view())
            .map_err(|e| GpError::InvalidValueError(e.to_string()))?;
        Ok(())
    }

    /// Remove all samples, dimensions are reset as well
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Number of samples
    pub fn len(&self) -> usize {
        self.inputs.nrows()
    }

    /// Whether no sample was added yet
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Input dimension (0 while empty)
    pub fn input_dim(&self) -> usize {
        self.inputs.ncols()
    }

    /// Output dimension (0 while empty)
    pub fn output_dim(&self) -> usize {
        self.outputs.ncols()
    }

    /// Training inputs as a (n, input_dim) matrix
    pub fn inputs(&self) -> &Array2<F> {
        &self.inputs
    }

    /// Label matrix: training outputs as a (n, output_dim) matrix
    pub fn outputs(&self) -> &Array2<F> {
        &self.outputs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GpErrorKind;
    use ndarray::{array, Array1};

    #[test]
    fn test_store_keeps_insertion_order() {
        let mut store = SampleStore::new();
        assert!(store.is_empty());
        store.push(&array![1., 2.], &array![10.]).unwrap();
        store.push(&array![3., 4.], &array![20.]).unwrap();
        store.push(&array![5., 6.], &array![30.]).unwrap();
        assert_eq!(3, store.len());
        assert_eq!((2, 1), (store.input_dim(), store.output_dim()));
        assert_eq!(&array![[1., 2.], [3., 4.], [5., 6.]], store.inputs());
        assert_eq!(&array![[10.], [20.], [30.]], store.outputs());
    }

    #[test]
    fn test_store_dimension_mismatch() {
        let mut store = SampleStore::new();
        store.push(&array![1., 2.], &array![10., 11.]).unwrap();
        let err = store.push(&array![1.], &array![10., 11.]).unwrap_err();
        assert_eq!(GpErrorKind::DimensionMismatch, err.kind());
        let err = store.push(&array![1., 2.], &array![10.]).unwrap_err();
        assert_eq!(GpErrorKind::DimensionMismatch, err.kind());
        assert_eq!(1, store.len());
    }

    #[test]
    fn test_store_clear() {
        let mut store = SampleStore::new();
        store.push(&array![1., 2.], &array![10.]).unwrap();
        store.clear();
        assert!(store.is_empty());
        store.push(&array![1.], &array![10., 3.]).unwrap();
        assert_eq!((1, 2), (store.input_dim(), store.output_dim()));
        assert!(store.push(&Array1::<f64>::zeros(0), &array![1.]).is_err());
    }
}
