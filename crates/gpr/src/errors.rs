use thiserror::Error;

/// A result type for GP regression algorithm
pub type Result<T> = std::result::Result<T, GpError>;

/// An error when using a [`GaussianProcess`](crate::GaussianProcess), its likelihood
/// or its posterior sampler
#[derive(Error, Debug)]
pub enum GpError {
    /// When the model is queried while its derived state (core matrix) is missing or stale
    #[error("Uninitialized model: {0}")]
    Uninitialized(String),
    /// When the determinant of `K + sigma.I` is not strictly positive
    #[error("Degenerate matrix: {0}")]
    DegenerateMatrix(String),
    /// When a vector dimension does not match the one established by the sample store
    #[error("Dimension mismatch for {what}: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// What was checked (input, output, query...)
        what: &'static str,
        /// Expected dimension
        expected: usize,
        /// Given dimension
        actual: usize,
    },
    /// When the core matrix has lost positive definiteness
    #[error("Numerical instability: {0}")]
    NumericalInstability(String),
    /// When the model is initialized without any sample
    #[error("Empty sample store: at least one sample is required")]
    EmptySampleStore,
    /// When error due to a bad value
    #[error("InvalidValue error: {0}")]
    InvalidValueError(String),
    /// When linear algebra computation fails
    #[error(transparent)]
    LinalgError(#[from] linfa_linalg::LinalgError),
    /// When a linfa error occurs
    #[error(transparent)]
    LinfaError(#[from] linfa::error::Error),
}

/// Discriminant of a [`GpError`] allowing callers to branch on the kind of failure
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GpErrorKind {
    /// See [`GpError::Uninitialized`]
    Uninitialized,
    /// See [`GpError::DegenerateMatrix`]
    DegenerateMatrix,
    /// See [`GpError::DimensionMismatch`]
    DimensionMismatch,
    /// See [`GpError::NumericalInstability`]
    NumericalInstability,
    /// Any other configuration or backend failure, including an empty sample store
    Other,
}

impl GpError {
    /// Kind of the error.
    ///
    /// [`GpError::EmptySampleStore`] is a configuration failure reported as
    /// [`GpErrorKind::Other`]: `Uninitialized` only means a stale or missing core matrix.
    pub fn kind(&self) -> GpErrorKind {
        match self {
            GpError::Uninitialized(_) => GpErrorKind::Uninitialized,
            GpError::DegenerateMatrix(_) => GpErrorKind::DegenerateMatrix,
            GpError::DimensionMismatch { .. } => GpErrorKind::DimensionMismatch,
            GpError::NumericalInstability(_) => GpErrorKind::NumericalInstability,
            GpError::EmptySampleStore
            | GpError::InvalidValueError(_)
            | GpError::LinalgError(_)
            | GpError::LinfaError(_) => GpErrorKind::Other,
        }
    }

    pub(crate) fn dimension(what: &'static str, expected: usize, actual: usize) -> Self {
        GpError::DimensionMismatch {
            what,
            expected,
            actual,
        }
    }
}
