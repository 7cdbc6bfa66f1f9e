//! Draw trajectories from the posterior distribution of a GP at a set of points.
//!
//! The posterior covariance matrix `K_post` at the requested points is decomposed
//! as `V.diag(lambda).V^t`. Components with an eigenvalue below the threshold are
//! dropped and the remaining ones, sorted by decreasing eigenvalue, give a factor
//! `Q = V.diag(sqrt(lambda))` such that `Q.Q^t ~ K_post`. A trajectory is then
//! `Q.z + mean` with `z` a vector of independent standard normal values.

use crate::errors::{GpError, Result};

use linfa::Float;
use linfa_linalg::eigh::*;
use log::debug;
use ndarray::{Array1, Array2, ArrayBase, Axis, Data, Ix1, Ix2};
use ndarray_rand::rand::Rng;
use ndarray_rand::rand_distr::StandardNormal;
use ndarray_rand::RandomExt;

/// Posterior sampler at a fixed set of m points
#[derive(Clone, Debug)]
pub struct PosteriorSampler<F: Float> {
    /// Posterior mean at the points (m,)
    mean: Array1<F>,
    /// Kept eigenvalues in decreasing order (k,)
    eigenvalues: Array1<F>,
    /// Factor `Q` (m, k)
    factor: Array2<F>,
}

impl<F: Float> PosteriorSampler<F> {
    /// Build a sampler from the posterior mean (m,) and covariance (m, m) at m points,
    /// eigen components with eigenvalue not greater than `threshold` are discarded.
    pub fn new(
        mean: Array1<F>,
        cov: &ArrayBase<impl Data<Elem = F>, Ix2>,
        threshold: F,
    ) -> Result<Self> {
        let m = mean.len();
        if m == 0 {
            return Err(GpError::InvalidValueError(
                "posterior sampler requires at least one point".to_string(),
            ));
        }
        if cov.nrows() != cov.ncols() {
            return Err(GpError::dimension("covariance columns", cov.nrows(), cov.ncols()));
        }
        if cov.nrows() != m {
            return Err(GpError::dimension("covariance rows", m, cov.nrows()));
        }
        if cov.iter().any(|v| !v.is_finite()) {
            return Err(GpError::NumericalInstability(
                "non finite value in posterior covariance".to_string(),
            ));
        }

        let (vals, vecs) = cov.to_owned().eigh_into()?;
        let mut kept: Vec<usize> = (0..m).filter(|&i| vals[i] > threshold).collect();
        kept.sort_by(|&i, &j| {
            vals[j]
                .partial_cmp(&vals[i])
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        debug!(
            "Posterior sampler keeps {} of {} eigen components (threshold={})",
            kept.len(),
            m,
            threshold
        );

        let eigenvalues: Array1<F> = kept.iter().map(|&i| vals[i]).collect();
        let mut factor = vecs.select(Axis(1), &kept);
        for (mut col, lambda) in factor.columns_mut().into_iter().zip(eigenvalues.iter()) {
            col *= lambda.sqrt();
        }
        Ok(PosteriorSampler {
            mean,
            eigenvalues,
            factor,
        })
    }

    /// Number of points trajectories are drawn at
    pub fn n_points(&self) -> usize {
        self.mean.len()
    }

    /// Number of kept eigen components, length of the `z` vector expected by [`PosteriorSampler::draw`]
    pub fn n_components(&self) -> usize {
        self.eigenvalues.len()
    }

    /// Kept eigenvalues sorted by decreasing value
    pub fn eigenvalues(&self) -> &Array1<F> {
        &self.eigenvalues
    }

    /// Factor `Q` (m, k) of the truncated posterior covariance
    pub fn factor(&self) -> &Array2<F> {
        &self.factor
    }

    /// Posterior mean at the points
    pub fn mean(&self) -> &Array1<F> {
        &self.mean
    }

    /// Frobenius norm of `Q.Q^t - cov`
    pub fn reconstruction_error(&self, cov: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<F> {
        let m = self.n_points();
        if cov.dim() != (m, m) {
            return Err(GpError::dimension("covariance rows", m, cov.nrows()));
        }
        let diff = self.factor.dot(&self.factor.t()) - cov;
        Ok(diff.iter().fold(F::zero(), |acc, &v| acc + v * v).sqrt())
    }

    /// Fail with [`GpError::NumericalInstability`] when `Q.Q^t` differs from the given covariance
    /// by more than `tolerance` relative to the largest covariance magnitude (at least 1)
    pub fn check(&self, cov: &ArrayBase<impl Data<Elem = F>, Ix2>, tolerance: F) -> Result<()> {
        let error = self.reconstruction_error(cov)?;
        let magnitude = cov.iter().fold(F::one(), |acc, v| acc.max(v.abs()));
        if error > tolerance * magnitude {
            return Err(GpError::NumericalInstability(format!(
                "truncated posterior covariance differs by {error} (tolerance {tolerance})"
            )));
        }
        Ok(())
    }

    /// Trajectory `Q.z + mean` for the given (k,) vector `z` of standard normal values
    pub fn draw(&self, z: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        if z.len() != self.n_components() {
            return Err(GpError::dimension("sampler draw", self.n_components(), z.len()));
        }
        Ok(self.factor.dot(z) + &self.mean)
    }

    /// Draw `n_traj` trajectories using the given random generator.
    /// Returns a (n_traj, m) matrix, one trajectory per row.
    pub fn sample<R: Rng + ?Sized>(&self, n_traj: usize, rng: &mut R) -> Array2<F> {
        let z = Array2::<f64>::random_using((self.n_components(), n_traj), StandardNormal, rng)
            .mapv(F::cast);
        let mut trajectories = z.t().dot(&self.factor.t());
        trajectories += &self.mean;
        trajectories
    }
}
