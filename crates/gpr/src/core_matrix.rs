//! Gram matrix assembly and factorization of `K + sigma.I`.
//!
//! The core matrix `C = inv(K + sigma.I)` and the determinant of `K + sigma.I`
//! are computed once per initialization and shared by prediction, likelihood
//! and posterior covariance computations.

use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::samples::SampleStore;

use linfa::Float;
use linfa_linalg::{cholesky::*, eigh::*, triangular::*};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, Data, Ix1, Ix2, Zip};
use ndarray_stats::QuantileExt;

/// Factorization used to invert `K + sigma.I`
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Factorization {
    /// Cholesky decomposition, `K + sigma.I` is positive definite
    Cholesky,
    /// Symmetric eigendecomposition fallback, the inverse drops the numerical null space
    Eigen,
}

/// Determinant stored as a sign and the logarithm of its absolute value
/// to avoid underflow with large sample sets
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Determinant<F: Float> {
    sign: F,
    log_abs: F,
}

impl<F: Float> Determinant<F> {
    /// Sign of the determinant: -1, 0 or 1
    pub fn sign(&self) -> F {
        self.sign
    }

    /// `ln(|det|)`, -inf for a singular matrix
    pub fn log_abs(&self) -> F {
        self.log_abs
    }

    /// Determinant value (may underflow to zero for large matrices, use `log_abs` then)
    pub fn value(&self) -> F {
        if self.sign == F::zero() {
            F::zero()
        } else {
            self.sign * self.log_abs.exp()
        }
    }

    /// Whether the determinant is strictly positive
    pub fn is_positive(&self) -> bool {
        self.sign > F::zero()
    }
}

/// Inverse of `K + sigma.I` together with its determinant
#[derive(Clone, Debug)]
pub struct CoreMatrix<F: Float> {
    /// Core matrix `C = inv(K + sigma.I)`
    inverse: Array2<F>,
    /// Prediction weights `C.Y`, one column per output
    alpha: Array2<F>,
    /// Determinant of `K + sigma.I`
    determinant: Determinant<F>,
    /// Factorization which produced the inverse
    factorization: Factorization,
}

impl<F: Float> CoreMatrix<F> {
    /// Build the Gram matrix of the stored inputs with the given kernel, add `sigma`
    /// on its diagonal and factorize it.
    pub fn compute<K: Kernel<F>>(samples: &SampleStore<F>, kernel: &K, sigma: F) -> Result<Self> {
        if samples.is_empty() {
            return Err(GpError::EmptySampleStore);
        }
        let mut k_mx = gram_matrix(kernel, samples.inputs());
        k_mx.diag_mut().mapv_inplace(|v| v + sigma);
        let (inverse, determinant, factorization) = factorize(k_mx)?;
        let alpha = inverse.dot(samples.outputs());
        Ok(CoreMatrix {
            inverse,
            alpha,
            determinant,
            factorization,
        })
    }

    /// Core matrix `C = inv(K + sigma.I)`
    pub fn inverse(&self) -> &Array2<F> {
        &self.inverse
    }

    /// Prediction weights `C.Y`
    pub fn alpha(&self) -> &Array2<F> {
        &self.alpha
    }

    /// Determinant of `K + sigma.I`
    pub fn determinant(&self) -> &Determinant<F> {
        &self.determinant
    }

    /// Factorization used
    pub fn factorization(&self) -> Factorization {
        self.factorization
    }

    /// Number of samples the core matrix was built from
    pub fn size(&self) -> usize {
        self.inverse.nrows()
    }
}

/// Compute the (n, n) Gram matrix `K[i, j] = k(x_i, x_j)` of the given (n, nx) points.
/// Only the upper triangle is evaluated, the lower one is mirrored.
pub fn gram_matrix<F: Float, K: Kernel<F>>(
    kernel: &K,
    x: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array2<F> {
    let n = x.nrows();
    let mut k_mx = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let v = kernel.value(&x.row(i), &x.row(j));
            k_mx[[i, j]] = v;
            k_mx[[j, i]] = v;
        }
    }
    k_mx
}

/// Compute the vector `k(x) = [k(x, x_i)]` of covariances between `x` and the rows of `xt`
pub fn kernel_vector<F: Float, K: Kernel<F>>(
    kernel: &K,
    x: &ArrayBase<impl Data<Elem = F>, Ix1>,
    xt: &ArrayBase<impl Data<Elem = F>, Ix2>,
) -> Array1<F> {
    let mut kx = Array1::zeros(xt.nrows());
    Zip::from(&mut kx)
        .and(xt.rows())
        .for_each(|k, xi| *k = kernel.value(x, &xi));
    kx
}

/// Invert a symmetric matrix and compute its determinant.
///
/// Cholesky is used whenever it succeeds with finite positive pivots, the determinant
/// being the squared product of the pivots. Otherwise a symmetric eigendecomposition is
/// used and eigenvalues below the numerical rank cutoff are dropped from the inverse,
/// the determinant being zero in that case.
pub(crate) fn factorize<F: Float>(
    matrix: Array2<F>,
) -> Result<(Array2<F>, Determinant<F>, Factorization)> {
    if matrix.iter().any(|v| !v.is_finite()) {
        return Err(GpError::NumericalInstability(
            "non finite value in kernel matrix".to_string(),
        ));
    }
    let n = matrix.nrows();
    match matrix.cholesky() {
        Ok(chol) if chol.diag().iter().all(|d| d.is_finite() && *d > F::zero()) => {
            let chol_inv = chol.solve_triangular(&Array2::eye(n), UPLO::Lower)?;
            let inverse = chol_inv.t().dot(&chol_inv);
            // det(K) = prod(diag(L))^2
            let log_abs = chol.diag().mapv(|d| d.ln()).sum() * F::cast(2.);
            debug!("Core matrix ({n}x{n}) factorized with cholesky");
            Ok((
                inverse,
                Determinant {
                    sign: F::one(),
                    log_abs,
                },
                Factorization::Cholesky,
            ))
        }
        _ => {
            warn!("Kernel matrix ({n}x{n}) is not positive definite, fallback to eigendecomposition");
            let (vals, vecs) = matrix.eigh_into()?;
            let max_abs = *vals.mapv(|v| v.abs()).max().map_err(|_| {
                GpError::NumericalInstability("eigenvalues cannot be compared".to_string())
            })?;
            let cutoff = max_abs * F::cast(n) * F::epsilon().sqrt();

            let mut sign = F::one();
            let mut log_abs = F::zero();
            let mut n_dropped = 0;
            let inv_vals = vals.mapv(|v| {
                if v.abs() <= cutoff {
                    n_dropped += 1;
                    F::zero()
                } else {
                    if v < F::zero() {
                        sign = -sign;
                    }
                    log_abs += v.abs().ln();
                    F::one() / v
                }
            });
            if n_dropped > 0 {
                sign = F::zero();
                log_abs = F::neg_infinity();
            }
            debug!(
                "Core matrix ({n}x{n}) factorized with eigendecomposition, {n_dropped} components dropped"
            );
            let inverse = (&vecs * &inv_vals).dot(&vecs.t());
            Ok((
                inverse,
                Determinant { sign, log_abs },
                Factorization::Eigen,
            ))
        }
    }
}
