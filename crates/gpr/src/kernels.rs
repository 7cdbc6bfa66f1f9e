//! A module for covariance kernels used to model the prior of the GP.
//!
//! The following kernels are implemented:
//! * gaussian (aka squared exponential, RBF),
//! * linear,
//! * periodic,
//! * white noise,
//! * sum and product of two kernels.
//!
//! Kernels are assumed symmetric and real-valued: `k(x, x') = k(x', x)`.

use crate::errors::{GpError, Result};
use linfa::Float;
use ndarray::{Array1, ArrayBase, Data, Ix1, Zip};
use std::fmt;

/// A trait for using a covariance kernel in GP regression
pub trait Kernel<F: Float>: Clone + fmt::Display + Send + Sync {
    /// Compute the covariance `k(x1, x2)` between two points of the same dimension
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F;

    /// Kernel hyperparameters, all strictly positive
    fn hyperparameters(&self) -> Array1<F>;

    /// Build a new kernel of the same family from the given hyperparameters
    /// (same ordering and length as [`Kernel::hyperparameters`])
    fn with_hyperparameters(&self, params: &[F]) -> Result<Self>;

    /// Number of hyperparameters
    fn n_hyperparameters(&self) -> usize {
        self.hyperparameters().len()
    }
}

fn squared_distance<F: Float>(
    x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
    x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
) -> F {
    Zip::from(x1)
        .and(x2)
        .fold(F::zero(), |acc, &a, &b| acc + (a - b) * (a - b))
}

fn check_hyperparameters<F: Float>(name: &str, params: &[F], expected: usize) -> Result<()> {
    if params.len() != expected {
        return Err(GpError::InvalidValueError(format!(
            "{name} expects {expected} hyperparameters, got {}",
            params.len()
        )));
    }
    if let Some(p) = params.iter().find(|p| !(p.is_finite() && **p > F::zero())) {
        return Err(GpError::InvalidValueError(format!(
            "{name} hyperparameters should be finite and strictly positive, got {p}"
        )));
    }
    Ok(())
}

/// Gaussian kernel
///
/// `k(x, x') = scale * exp(-|x - x'|^2 / (2 * sigma^2))`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GaussianKernel<F: Float> {
    sigma: F,
    scale: F,
}

impl<F: Float> Default for GaussianKernel<F> {
    fn default() -> Self {
        Self::new(F::one())
    }
}

impl<F: Float> GaussianKernel<F> {
    /// Gaussian kernel with the given length scale `sigma` and unit scale
    pub fn new(sigma: F) -> Self {
        GaussianKernel {
            sigma,
            scale: F::one(),
        }
    }

    /// Set the kernel amplitude
    pub fn scale(mut self, scale: F) -> Self {
        self.scale = scale;
        self
    }

    /// Length scale
    pub fn sigma(&self) -> F {
        self.sigma
    }
}

impl<F: Float> fmt::Display for GaussianKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "GaussianKernel(sigma={}, scale={})", self.sigma, self.scale)
    }
}

impl<F: Float> Kernel<F> for GaussianKernel<F> {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        let r2 = squared_distance(x1, x2);
        self.scale * F::exp(-r2 / (F::cast(2.) * self.sigma * self.sigma))
    }

    fn hyperparameters(&self) -> Array1<F> {
        Array1::from_vec(vec![self.sigma, self.scale])
    }

    fn with_hyperparameters(&self, params: &[F]) -> Result<Self> {
        check_hyperparameters("GaussianKernel", params, 2)?;
        Ok(GaussianKernel::new(params[0]).scale(params[1]))
    }
}

/// Linear kernel
///
/// `k(x, x') = scale * x.x'`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearKernel<F: Float> {
    scale: F,
}

impl<F: Float> Default for LinearKernel<F> {
    fn default() -> Self {
        Self::new(F::one())
    }
}

impl<F: Float> LinearKernel<F> {
    /// Linear kernel with the given amplitude
    pub fn new(scale: F) -> Self {
        LinearKernel { scale }
    }
}

impl<F: Float> fmt::Display for LinearKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "LinearKernel(scale={})", self.scale)
    }
}

impl<F: Float> Kernel<F> for LinearKernel<F> {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        self.scale * x1.dot(x2)
    }

    fn hyperparameters(&self) -> Array1<F> {
        Array1::from_vec(vec![self.scale])
    }

    fn with_hyperparameters(&self, params: &[F]) -> Result<Self> {
        check_hyperparameters("LinearKernel", params, 1)?;
        Ok(LinearKernel::new(params[0]))
    }
}

/// Periodic kernel
///
/// `k(x, x') = scale * exp(-2 * sin^2(pi * |x - x'| / period) / length^2)`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PeriodicKernel<F: Float> {
    scale: F,
    period: F,
    length: F,
}

impl<F: Float> Default for PeriodicKernel<F> {
    fn default() -> Self {
        Self::new(F::one(), F::one(), F::one())
    }
}

impl<F: Float> PeriodicKernel<F> {
    /// Periodic kernel constructor
    pub fn new(scale: F, period: F, length: F) -> Self {
        PeriodicKernel {
            scale,
            period,
            length,
        }
    }
}

impl<F: Float> fmt::Display for PeriodicKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "PeriodicKernel(scale={}, period={}, length={})",
            self.scale, self.period, self.length
        )
    }
}

impl<F: Float> Kernel<F> for PeriodicKernel<F> {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        let r = squared_distance(x1, x2).sqrt();
        let s = F::sin(F::cast(std::f64::consts::PI) * r / self.period);
        self.scale * F::exp(F::cast(-2.) * s * s / (self.length * self.length))
    }

    fn hyperparameters(&self) -> Array1<F> {
        Array1::from_vec(vec![self.scale, self.period, self.length])
    }

    fn with_hyperparameters(&self, params: &[F]) -> Result<Self> {
        check_hyperparameters("PeriodicKernel", params, 3)?;
        Ok(PeriodicKernel::new(params[0], params[1], params[2]))
    }
}

/// White noise kernel: `scale` on identical points, zero elsewhere
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WhiteKernel<F: Float> {
    scale: F,
}

impl<F: Float> Default for WhiteKernel<F> {
    fn default() -> Self {
        Self::new(F::one())
    }
}

impl<F: Float> WhiteKernel<F> {
    /// White kernel with the given noise level
    pub fn new(scale: F) -> Self {
        WhiteKernel { scale }
    }
}

impl<F: Float> fmt::Display for WhiteKernel<F> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "WhiteKernel(scale={})", self.scale)
    }
}

impl<F: Float> Kernel<F> for WhiteKernel<F> {
    fn value(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> F {
        if x1 == x2 {
            self.scale
        } else {
            F::zero()
        }
    }

    fn hyperparameters(&self) -> Array1<F> {
        Array1::from_vec(vec![self.scale])
    }

    fn with_hyperparameters(&self, params: &[F]) -> Result<Self> {
        check_hyperparameters("WhiteKernel", params, 1)?;
        Ok(WhiteKernel::new(params[0]))
    }
}

/// Sum of two kernels `k1(x, x') + k2(x, x')`
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct SumKernel<K1, K2>(pub K1, pub K2);

impl<K1: fmt::Display, K2: fmt::Display> fmt::Display for SumKernel<K1, K2> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} + {})", self.0, self.1)
    }
}

/// Product of two kernels `k1(x, x') * k2(x, x')`
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct ProductKernel<K1, K2>(pub K1, pub K2);

impl<K1: fmt::Display, K2: fmt::Display> fmt::Display for ProductKernel<K1, K2> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "({} * {})", self.0, self.1)
    }
}

macro_rules! impl_composite_kernel {
    ($composite:ident, $op:tt) => {
        impl<F: Float, K1: Kernel<F>, K2: Kernel<F>> Kernel<F> for $composite<K1, K2> {
            fn value(
                &self,
                x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
                x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
            ) -> F {
                self.0.value(x1, x2) $op self.1.value(x1, x2)
            }

            fn hyperparameters(&self) -> Array1<F> {
                self.0
                    .hyperparameters()
                    .iter()
                    .chain(self.1.hyperparameters().iter())
                    .cloned()
                    .collect()
            }

            fn with_hyperparameters(&self, params: &[F]) -> Result<Self> {
                let n = self.0.n_hyperparameters();
                if params.len() != n + self.1.n_hyperparameters() {
                    return Err(GpError::InvalidValueError(format!(
                        "{} expects {} hyperparameters, got {}",
                        self,
                        n + self.1.n_hyperparameters(),
                        params.len()
                    )));
                }
                Ok($composite(
                    self.0.with_hyperparameters(&params[..n])?,
                    self.1.with_hyperparameters(&params[n..])?,
                ))
            }
        }
    };
}

impl_composite_kernel!(SumKernel, +);
impl_composite_kernel!(ProductKernel, *);
