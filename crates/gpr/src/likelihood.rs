use crate::algorithm::GaussianProcess;
use crate::errors::{GpError, Result};
use crate::kernels::Kernel;

use linfa::Float;
use ndarray::{Array1, Zip};
use std::fmt;

/// A trait for a likelihood of the training outputs under a GP model
pub trait Likelihood<F: Float>: fmt::Display {
    /// Evaluate the likelihood for each output of an initialized GP, returns a (ny,) vector
    fn evaluate<K: Kernel<F>>(&self, gp: &GaussianProcess<F, K>) -> Result<Array1<F>>;
}

/// Gaussian log likelihood
///
/// `-1/2 * y^t.C.y - 1/2 * ln|K + sigma.I| - n/2 * ln(2.pi)`
///
/// evaluated for each column `y` of the label matrix.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct GaussianLogLikelihood;

impl fmt::Display for GaussianLogLikelihood {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GaussianLogLikelihood")
    }
}

impl<F: Float> Likelihood<F> for GaussianLogLikelihood {
    fn evaluate<K: Kernel<F>>(&self, gp: &GaussianProcess<F, K>) -> Result<Array1<F>> {
        let y = gp.label_matrix()?;
        let (core, det) = gp.core_matrix_and_determinant()?;
        if !det.is_positive() {
            return Err(GpError::DegenerateMatrix(format!(
                "determinant of K + sigma.I is {} (sign={}), likelihood is undefined",
                det.value(),
                det.sign()
            )));
        }
        let n = F::cast(y.nrows());
        let half = F::cast(0.5);
        let constant = -half * det.log_abs() - half * n * F::cast(2. * std::f64::consts::PI).ln();

        // diag(Y^t.C.Y) without the full (ny, ny) product
        let cy = core.dot(y);
        let mut lkh = Array1::zeros(y.ncols());
        Zip::from(&mut lkh)
            .and(y.columns())
            .and(cy.columns())
            .for_each(|l, yj, cyj| *l = -half * yj.dot(&cyj) + constant);
        Ok(lkh)
    }
}
