use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use linfa::{Float, ParamGuard};

/// Default multiplier applied to the posterior standard deviation to get the credible interval
pub const DEFAULT_CREDIBLE_FACTOR: f64 = 2.0;
/// Default eigenvalue floor under which posterior covariance components are discarded
pub const DEFAULT_EIGEN_THRESHOLD: f64 = 1e-10;
/// Default relative tolerance on negative self-covariance values
pub const DEFAULT_INSTABILITY_TOLERANCE: f64 = 1e-8;

/// A set of validated GP parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct GpValidParams<F: Float, K: Kernel<F>> {
    /// Prior covariance kernel k(x, x')
    pub(crate) kernel: K,
    /// Observation noise added to the diagonal of the Gram matrix
    pub(crate) sigma: F,
    /// Multiplier of the posterior standard deviation
    pub(crate) credible_factor: F,
    /// Eigenvalue floor used by the posterior sampler
    pub(crate) eigen_threshold: F,
    /// Relative tolerance on negative self-covariance before reporting instability
    pub(crate) instability_tolerance: F,
}

impl<F: Float, K: Kernel<F>> GpValidParams<F, K> {
    /// Get covariance kernel
    pub fn kernel(&self) -> &K {
        &self.kernel
    }

    /// Get observation noise
    pub fn sigma(&self) -> F {
        self.sigma
    }

    /// Get credible interval multiplier
    pub fn credible_factor(&self) -> F {
        self.credible_factor
    }

    /// Get eigenvalue truncation floor
    pub fn eigen_threshold(&self) -> F {
        self.eigen_threshold
    }

    /// Get negative self-covariance tolerance
    pub fn instability_tolerance(&self) -> F {
        self.instability_tolerance
    }
}

#[derive(Clone, Debug)]
/// The set of hyperparameters that can be specified for the execution of
/// the [GP algorithm](crate::GaussianProcess).
pub struct GpParams<F: Float, K: Kernel<F>>(pub(crate) GpValidParams<F, K>);

impl<F: Float, K: Kernel<F>> GpParams<F, K> {
    /// A constructor for GP parameters given a kernel, other parameters get their default values
    pub fn new(kernel: K) -> GpParams<F, K> {
        Self(GpValidParams {
            kernel,
            sigma: F::zero(),
            credible_factor: F::cast(DEFAULT_CREDIBLE_FACTOR),
            eigen_threshold: F::cast(DEFAULT_EIGEN_THRESHOLD),
            instability_tolerance: F::cast(DEFAULT_INSTABILITY_TOLERANCE),
        })
    }

    /// A constructor for GP parameters from validated parameters
    pub fn new_from_valid(params: &GpValidParams<F, K>) -> Self {
        Self(params.clone())
    }

    /// Set covariance kernel.
    pub fn kernel(mut self, kernel: K) -> Self {
        self.0.kernel = kernel;
        self
    }

    /// Set observation noise.
    ///
    /// Should be >= 0, a zero noise makes the GP interpolate its training outputs
    pub fn sigma(mut self, sigma: F) -> Self {
        self.0.sigma = sigma;
        self
    }

    /// Set the credible interval multiplier (2 by default)
    pub fn credible_factor(mut self, factor: F) -> Self {
        self.0.credible_factor = factor;
        self
    }

    /// Set the eigenvalue floor under which posterior covariance components
    /// are discarded when sampling
    pub fn eigen_threshold(mut self, threshold: F) -> Self {
        self.0.eigen_threshold = threshold;
        self
    }

    /// Set the relative tolerance on negative self-covariance
    pub fn instability_tolerance(mut self, tolerance: F) -> Self {
        self.0.instability_tolerance = tolerance;
        self
    }
}

impl<F: Float, K: Kernel<F>> From<GpValidParams<F, K>> for GpParams<F, K> {
    fn from(valid: GpValidParams<F, K>) -> Self {
        GpParams(valid)
    }
}

pub(crate) fn check_sigma<F: Float>(sigma: F) -> Result<()> {
    if !sigma.is_finite() || sigma < F::zero() {
        return Err(GpError::InvalidValueError(format!(
            "`sigma` should be finite and >= 0, got {sigma}"
        )));
    }
    Ok(())
}

impl<F: Float, K: Kernel<F>> ParamGuard for GpParams<F, K> {
    type Checked = GpValidParams<F, K>;
    type Error = GpError;

    fn check_ref(&self) -> Result<&Self::Checked> {
        check_sigma(self.0.sigma)?;
        if !self.0.credible_factor.is_finite() || self.0.credible_factor <= F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`credible_factor` should be > 0, got {}",
                self.0.credible_factor
            )));
        }
        if !self.0.eigen_threshold.is_finite() || self.0.eigen_threshold < F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`eigen_threshold` should be >= 0, got {}",
                self.0.eigen_threshold
            )));
        }
        if !self.0.instability_tolerance.is_finite() || self.0.instability_tolerance < F::zero() {
            return Err(GpError::InvalidValueError(format!(
                "`instability_tolerance` should be >= 0, got {}",
                self.0.instability_tolerance
            )));
        }
        Ok(&self.0)
    }

    fn check(self) -> Result<Self::Checked> {
        self.check_ref()?;
        Ok(self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::kernels::GaussianKernel;

    #[test]
    fn test_default_params() {
        let params = GpParams::new(GaussianKernel::new(0.5)).check().unwrap();
        assert_eq!(0., params.sigma());
        assert_eq!(2., params.credible_factor());
        assert_eq!(1e-10, params.eigen_threshold());
        assert_eq!(&GaussianKernel::new(0.5), params.kernel());
    }

    #[test]
    fn test_invalid_params() {
        let kernel = GaussianKernel::new(1.);
        assert!(GpParams::new(kernel).sigma(-1e-3).check().is_err());
        assert!(GpParams::new(kernel).sigma(f64::NAN).check().is_err());
        assert!(GpParams::new(kernel).credible_factor(0.).check().is_err());
        assert!(GpParams::new(kernel).eigen_threshold(-1.).check().is_err());
        assert!(GpParams::new(kernel)
            .instability_tolerance(f64::INFINITY)
            .check()
            .is_err());
        assert!(GpParams::new(kernel).sigma(1e-5).check_ref().is_ok());
    }
}
