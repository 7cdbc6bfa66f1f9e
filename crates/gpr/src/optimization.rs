//! Hyperparameter search maximizing the Gaussian log likelihood.
//!
//! Kernel hyperparameters (and optionally the observation noise) are optimized
//! in log10 space with COBYLA, from the current values of the model and from
//! random starting points drawn within the bounds. Starts run in parallel.

use crate::algorithm::GaussianProcess;
use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::parameters::GpParams;

use cobyla::{minimize, Func, RhoBeg, StopTols};
use linfa::{Float, ParamGuard};
use log::{debug, warn};
use ndarray::{arr1, Array1, Array2};
use ndarray_rand::rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;
use rayon::prelude::*;

/// COBYLA settings of a local optimization
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CobylaParams {
    /// Initial step in log10 space
    pub rhobeg: f64,
    /// Relative tolerance on the objective
    pub ftol_rel: f64,
    /// Max number of objective evaluations
    pub maxeval: usize,
}

impl Default for CobylaParams {
    fn default() -> Self {
        CobylaParams {
            rhobeg: 0.5,
            ftol_rel: 1e-4,
            maxeval: 200,
        }
    }
}

/// Multistart hyperparameter search driver
#[derive(Clone, Debug)]
pub struct HyperSearch<F: Float> {
    n_start: usize,
    bounds: (F, F),
    sigma_bounds: Option<(F, F)>,
    cobyla: CobylaParams,
    seed: u64,
}

impl<F: Float> Default for HyperSearch<F> {
    fn default() -> Self {
        HyperSearch {
            n_start: 5,
            bounds: (F::cast(1e-3), F::cast(1e2)),
            sigma_bounds: None,
            cobyla: CobylaParams::default(),
            seed: 42,
        }
    }
}

impl<F: Float> HyperSearch<F> {
    /// Search with default settings: 5 random starts, kernel hyperparameters in [1e-3, 1e2],
    /// observation noise kept fixed
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the number of random starting points, added to the current hyperparameters
    pub fn n_start(mut self, n_start: usize) -> Self {
        self.n_start = n_start;
        self
    }

    /// Set the bounds of every kernel hyperparameter
    pub fn bounds(mut self, lower: F, upper: F) -> Self {
        self.bounds = (lower, upper);
        self
    }

    /// Optimize the observation noise as well, within the given bounds
    pub fn sigma_bounds(mut self, lower: F, upper: F) -> Self {
        self.sigma_bounds = Some((lower, upper));
        self
    }

    /// Set the COBYLA settings
    pub fn cobyla(mut self, cobyla: CobylaParams) -> Self {
        self.cobyla = cobyla;
        self
    }

    /// Set the seed of the random starting points
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    fn check(&self) -> Result<()> {
        let valid = |(lo, up): (F, F)| lo.is_finite() && up.is_finite() && F::zero() < lo && lo < up;
        if !valid(self.bounds) {
            return Err(GpError::InvalidValueError(format!(
                "hyperparameter bounds should verify 0 < lower < upper, got {:?}",
                self.bounds
            )));
        }
        if let Some(sigma_bounds) = self.sigma_bounds {
            if !valid(sigma_bounds) {
                return Err(GpError::InvalidValueError(format!(
                    "sigma bounds should verify 0 < lower < upper, got {sigma_bounds:?}"
                )));
            }
        }
        Ok(())
    }

    /// Search the hyperparameters maximizing the summed log likelihood of the outputs of `gp`
    /// and return a new initialized model using them.
    ///
    /// Candidate configurations for which the likelihood cannot be computed are skipped.
    pub fn optimize<K: Kernel<F>>(&self, gp: &GaussianProcess<F, K>) -> Result<GaussianProcess<F, K>> {
        self.check()?;
        if gp.n_samples() == 0 {
            return Err(GpError::EmptySampleStore);
        }
        let n_kernel = gp.kernel().n_hyperparameters();

        let mut bounds = vec![self.bounds; n_kernel];
        let mut x0: Vec<F> = gp
            .kernel()
            .hyperparameters()
            .iter()
            .map(|&p| clamp(p, self.bounds))
            .collect();
        if let Some(sigma_bounds) = self.sigma_bounds {
            bounds.push(sigma_bounds);
            x0.push(clamp(gp.sigma(), sigma_bounds));
        }
        // Use log10 of the parameters as optimization variables
        let bounds: Vec<(f64, f64)> = bounds
            .iter()
            .map(|(lo, up)| (into_f64(lo.log10()), into_f64(up.log10())))
            .collect();
        let x0 = Array1::from_iter(x0.iter().map(|v| into_f64(v.log10())));

        // Multistart: current values then random values within bounds, seeded for reproducibility
        let mut starts = Array2::zeros((self.n_start + 1, x0.len()));
        starts.row_mut(0).assign(&x0);
        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        for mut start in starts.rows_mut().into_iter().skip(1) {
            for (v, (lo, up)) in start.iter_mut().zip(bounds.iter()) {
                *v = rng.gen_range(*lo..*up);
            }
        }

        let objfn = |x: &[f64], _u: &mut ()| -> f64 {
            match self.candidate(gp, x, n_kernel).and_then(|c| c.log_likelihood()) {
                Ok(lkh) => {
                    let lkh = into_f64(lkh.sum());
                    if lkh.is_finite() {
                        -lkh
                    } else {
                        f64::INFINITY
                    }
                }
                Err(err) => {
                    warn!("Skip hyperparameters {:?}: {}", to_linear(x), err);
                    f64::INFINITY
                }
            }
        };

        let results: Vec<(f64, Array1<f64>)> = starts
            .outer_iter()
            .into_par_iter()
            .map(|start| optimize_params(&objfn, &start.to_vec(), &bounds, &self.cobyla))
            .collect();

        let (best_f, best_x) = results
            .into_iter()
            .fold((f64::INFINITY, None), |(best_f, best_x), (f, x)| {
                if f < best_f {
                    (f, Some(x))
                } else {
                    (best_f, best_x)
                }
            });
        let best_x = best_x.ok_or_else(|| {
            GpError::DegenerateMatrix(
                "no hyperparameter configuration gives a valid likelihood".to_string(),
            )
        })?;
        debug!(
            "Best hyperparameters {} with log likelihood {}",
            to_linear(best_x.as_slice().unwrap_or(&[])),
            -best_f
        );

        self.candidate(gp, &best_x.to_vec(), n_kernel)
    }

    /// Initialized model using `10^x` as hyperparameters
    fn candidate<K: Kernel<F>>(
        &self,
        gp: &GaussianProcess<F, K>,
        x: &[f64],
        n_kernel: usize,
    ) -> Result<GaussianProcess<F, K>> {
        let values: Vec<F> = x.iter().map(|v| F::cast(10f64.powf(*v))).collect();
        let kernel = gp.kernel().with_hyperparameters(&values[..n_kernel])?;
        let mut params = GpParams::new_from_valid(gp.parameters()).kernel(kernel);
        if self.sigma_bounds.is_some() {
            params = params.sigma(values[n_kernel]);
        }
        let mut candidate = gp.with_params(params.check()?);
        candidate.initialize()?;
        Ok(candidate)
    }
}

/// Optimize parameters given an initial guess and bounds with cobyla,
/// returns the objective value (+inf on failure) and the optimum
fn optimize_params<ObjF>(
    objfn: ObjF,
    param0: &[f64],
    bounds: &[(f64, f64)],
    cobyla: &CobylaParams,
) -> (f64, Array1<f64>)
where
    ObjF: Fn(&[f64], &mut ()) -> f64,
{
    let cons: Vec<&dyn Func<()>> = vec![];
    match minimize(
        |x: &[f64], u: &mut ()| objfn(x, u),
        param0,
        bounds,
        &cons,
        (),
        cobyla.maxeval,
        RhoBeg::All(cobyla.rhobeg),
        Some(StopTols {
            ftol_rel: cobyla.ftol_rel,
            ..StopTols::default()
        }),
    ) {
        Ok((_, x_opt, fval)) => {
            let fval = if f64::is_nan(fval) { f64::INFINITY } else { fval };
            (fval, arr1(&x_opt))
        }
        Err((status, x_opt, _)) => {
            warn!("Cobyla optimizer failed with status {status:?}");
            (f64::INFINITY, arr1(&x_opt))
        }
    }
}

fn clamp<F: Float>(v: F, (lo, up): (F, F)) -> F {
    v.max(lo).min(up)
}

fn into_f64<F: Float>(v: F) -> f64 {
    v.to_f64().unwrap_or(f64::NAN)
}

fn to_linear(x: &[f64]) -> Array1<f64> {
    x.iter().map(|v| 10f64.powf(*v)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GpErrorKind;
    use crate::kernels::{GaussianKernel, LinearKernel};
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};

    fn sinus_gp(kernel: GaussianKernel<f64>, sigma: f64) -> GaussianProcess<f64, GaussianKernel<f64>> {
        let mut gp = GaussianProcess::new(kernel);
        gp.set_sigma(sigma).unwrap();
        for x in Array::linspace(0f64, 6., 15).iter() {
            gp.add_sample(&array![*x], &array![x.sin()]).unwrap();
        }
        gp
    }

    #[test]
    fn test_search_improves_likelihood() {
        let mut gp = sinus_gp(GaussianKernel::new(0.1), 1e-3);
        gp.initialize().unwrap();
        let initial = gp.log_likelihood().unwrap()[0];

        let best = HyperSearch::new()
            .n_start(3)
            .bounds(1e-2, 1e2)
            .optimize(&gp)
            .expect("hyperparameter search");
        assert!(best.is_initialized());
        assert_eq!(1e-3, best.sigma());
        let optimized = best.log_likelihood().unwrap()[0];
        assert!(optimized > initial);

        let x = array![2.1_f64];
        assert_abs_diff_eq!(x[0].sin(), best.predict(&x).unwrap()[0], epsilon = 1e-2);
    }

    #[test]
    fn test_search_with_noise() {
        let gp = sinus_gp(GaussianKernel::new(1.), 1e-2);
        let best = HyperSearch::new()
            .n_start(2)
            .sigma_bounds(1e-8, 1e-1)
            .seed(0)
            .optimize(&gp)
            .expect("hyperparameter search");
        assert!(best.sigma() > 0. && best.sigma() < 0.2);
        assert_eq!(2, best.kernel().n_hyperparameters());
    }

    #[test]
    fn test_search_is_reproducible() {
        let gp = sinus_gp(GaussianKernel::new(1.), 1e-4);
        let search = HyperSearch::new().n_start(2).seed(7);
        let gp1 = search.optimize(&gp).unwrap();
        let gp2 = search.optimize(&gp).unwrap();
        assert_eq!(gp1.kernel(), gp2.kernel());
    }

    #[test]
    fn test_degenerate_configurations_are_skipped() {
        // every sample at the origin without noise: the linear Gram matrix is null
        // whatever the kernel scale
        let mut gp = GaussianProcess::<f64, _>::new(LinearKernel::new(1.));
        for y in [1., 2., 3.] {
            gp.add_sample(&array![0.], &array![y]).unwrap();
        }
        let err = HyperSearch::new().n_start(2).optimize(&gp).unwrap_err();
        assert_eq!(GpErrorKind::DegenerateMatrix, err.kind());
    }

    #[test]
    fn test_invalid_search() {
        let gp = sinus_gp(GaussianKernel::new(1.), 0.);
        assert!(HyperSearch::new().bounds(1., 0.1).optimize(&gp).is_err());
        assert!(HyperSearch::new().sigma_bounds(0., 1.).optimize(&gp).is_err());
        let empty = GaussianProcess::<f64, _>::new(GaussianKernel::new(1.));
        assert!(matches!(
            HyperSearch::new().optimize(&empty),
            Err(GpError::EmptySampleStore)
        ));
    }
}
