use crate::core_matrix::{kernel_vector, CoreMatrix, Determinant};
use crate::errors::{GpError, Result};
use crate::kernels::Kernel;
use crate::likelihood::{GaussianLogLikelihood, Likelihood};
use crate::parameters::{check_sigma, GpParams, GpValidParams};
use crate::samples::SampleStore;
use crate::sampling::PosteriorSampler;

use linfa::prelude::{DatasetBase, Fit, Float};
use log::{debug, warn};
use ndarray::{Array1, Array2, ArrayBase, ArrayView2, Axis, Data, Ix1, Ix2, Zip};
use rayon::prelude::*;
use std::fmt;
use std::time::Instant;

/// A Gaussian process regression engine.
///
/// The output is modeled as a zero mean gaussian process observed with noise:
///
/// `y(x) = f(x) + e`, with `f ~ GP(0, k(x, x'))` and `e ~ Normal(0, sigma)`
///
/// Given training samples `(X, Y)`, with `Y` a (n, ny) label matrix allowing
/// several outputs, the posterior is described by:
///
/// * the mean `m(x) = Y^t.C.k(x)`
/// * the covariance `cov(x, x') = k(x, x') - k(x)^t.C.k(x')`
///
/// where `C = inv(K + sigma.I)` is the core matrix, `K` the Gram matrix of the
/// training inputs and `k(x)` the vector of covariances between `x` and the training inputs.
///
/// # Lifecycle
///
/// Samples are appended with [`GaussianProcess::add_sample`], then
/// [`GaussianProcess::initialize`] computes the core matrix once. Queries
/// (prediction, covariance, likelihood, sampling) fail with [`GpError::Uninitialized`]
/// until initialization and after any later sample addition or noise change.
///
/// # Example
///
/// ```no_run
/// use gpr::{kernels::GaussianKernel, GaussianProcess};
/// use ndarray::array;
///
/// let mut gp = GaussianProcess::new(GaussianKernel::new(0.5));
/// gp.set_sigma(1e-5).expect("valid noise");
/// for i in 0..20 {
///     let x = i as f64 * 2. * std::f64::consts::PI / 20.;
///     gp.add_sample(&array![x], &array![x.sin()]).expect("sample added");
/// }
/// gp.initialize().expect("GP initialized");
///
/// let mean = gp.predict(&array![1.0]).expect("prediction");
/// let band = gp.credible_interval(&array![1.0]).expect("credible interval");
/// ```
#[derive(Clone, Debug)]
pub struct GaussianProcess<F: Float, K: Kernel<F>> {
    /// Parameters used to build this model
    params: GpValidParams<F, K>,
    /// Training samples
    samples: SampleStore<F>,
    /// Derived state, `None` until initialized or when invalidated
    core: Option<CoreMatrix<F>>,
}

impl<F: Float, K: Kernel<F>> fmt::Display for GaussianProcess<F, K> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "GP(kernel={}, sigma={}, n_samples={}, initialized={})",
            self.params.kernel,
            self.params.sigma,
            self.samples.len(),
            self.is_initialized()
        )
    }
}

impl<F: Float, K: Kernel<F>> GaussianProcess<F, K> {
    /// Gp parameters contructor
    pub fn params<NewK: Kernel<F>>(kernel: NewK) -> GpParams<F, NewK> {
        GpParams::new(kernel)
    }

    /// Empty GP with the given kernel and default parameters (no noise)
    pub fn new(kernel: K) -> Self {
        Self::from_params(GpParams::new(kernel).0)
    }

    /// Empty GP from validated parameters
    pub fn from_params(params: GpValidParams<F, K>) -> Self {
        GaussianProcess {
            params,
            samples: SampleStore::new(),
            core: None,
        }
    }

    /// Uninitialized GP sharing the samples of `self` with other parameters
    pub(crate) fn with_params(&self, params: GpValidParams<F, K>) -> Self {
        GaussianProcess {
            params,
            samples: self.samples.clone(),
            core: None,
        }
    }

    /// Append a training sample. Dimensions are fixed by the first sample.
    ///
    /// The model has to be initialized again before any query.
    pub fn add_sample(
        &mut self,
        x: &ArrayBase<impl Data<Elem = F>, Ix1>,
        y: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<()> {
        self.samples.push(x, y)?;
        self.core = None;
        Ok(())
    }

    /// Compute the core matrix from the current samples.
    ///
    /// On failure the model stays uninitialized.
    pub fn initialize(&mut self) -> Result<()> {
        self.core = None;
        let now = Instant::now();
        if has_duplicated_rows(self.samples.inputs()) {
            warn!("Multiple training samples share the same input (at least same row twice)");
        }
        let core = CoreMatrix::compute(&self.samples, &self.params.kernel, self.params.sigma)?;
        debug!(
            "GP initialized with {} samples in {:?}ms",
            self.samples.len(),
            now.elapsed().as_millis()
        );
        self.core = Some(core);
        Ok(())
    }

    /// Set observation noise, should be >= 0.
    ///
    /// The model has to be initialized again before any query.
    pub fn set_sigma(&mut self, sigma: F) -> Result<()> {
        check_sigma(sigma)?;
        self.params.sigma = sigma;
        self.core = None;
        Ok(())
    }

    /// Replace the covariance kernel.
    ///
    /// The model has to be initialized again before any query.
    pub fn set_kernel(&mut self, kernel: K) {
        self.params.kernel = kernel;
        self.core = None;
    }

    /// Observation noise
    pub fn sigma(&self) -> F {
        self.params.sigma
    }

    /// Covariance kernel
    pub fn kernel(&self) -> &K {
        &self.params.kernel
    }

    /// Parameters of this model
    pub fn parameters(&self) -> &GpValidParams<F, K> {
        &self.params
    }

    /// Training samples
    pub fn samples(&self) -> &SampleStore<F> {
        &self.samples
    }

    /// Number of training samples
    pub fn n_samples(&self) -> usize {
        self.samples.len()
    }

    /// Retrieve input and output dimensions
    pub fn dims(&self) -> (usize, usize) {
        (self.samples.input_dim(), self.samples.output_dim())
    }

    /// Whether the derived state is up to date with the samples
    pub fn is_initialized(&self) -> bool {
        self.core.is_some()
    }

    /// Core matrix with its determinant, available once initialized
    pub fn core_matrix(&self) -> Result<&CoreMatrix<F>> {
        self.core.as_ref().ok_or_else(|| {
            GpError::Uninitialized(
                "GP has to be initialized after adding samples or changing sigma".to_string(),
            )
        })
    }

    /// Label matrix Y (n, ny) the core matrix was computed with
    pub fn label_matrix(&self) -> Result<&Array2<F>> {
        self.core_matrix()?;
        Ok(self.samples.outputs())
    }

    /// Core matrix `C = inv(K + sigma.I)` and determinant of `K + sigma.I`
    pub fn core_matrix_and_determinant(&self) -> Result<(&Array2<F>, &Determinant<F>)> {
        let core = self.core_matrix()?;
        Ok((core.inverse(), core.determinant()))
    }

    fn check_input_dim(&self, dim: usize) -> Result<()> {
        if dim != self.samples.input_dim() {
            return Err(GpError::dimension(
                "query point",
                self.samples.input_dim(),
                dim,
            ));
        }
        Ok(())
    }

    /// Predict the posterior mean at `x`, returns a (ny,) vector
    pub fn predict(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<Array1<F>> {
        let core = self.core_matrix()?;
        self.check_input_dim(x.len())?;
        let kx = kernel_vector(&self.params.kernel, x, self.samples.inputs());
        Ok(kx.dot(core.alpha()))
    }

    /// Predict posterior means at n given `x` points specified as a (n, nx) matrix.
    /// Returns a (n, ny) matrix.
    pub fn predict_values(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let core = self.core_matrix()?;
        self.check_input_dim(x.ncols())?;
        Ok(self.kernel_matrix(&x.view()).dot(core.alpha()))
    }

    /// Posterior covariance between `x1` and `x2`
    ///
    /// Self covariance (`x1 == x2`) slightly negative due to machine precision
    /// is set to zero, a value below the instability tolerance is an error.
    pub fn covariance(
        &self,
        x1: &ArrayBase<impl Data<Elem = F>, Ix1>,
        x2: &ArrayBase<impl Data<Elem = F>, Ix1>,
    ) -> Result<F> {
        let core = self.core_matrix()?;
        self.check_input_dim(x1.len())?;
        self.check_input_dim(x2.len())?;
        let kernel = &self.params.kernel;
        let k1 = kernel_vector(kernel, x1, self.samples.inputs());
        let k2 = kernel_vector(kernel, x2, self.samples.inputs());
        let cov = kernel.value(x1, x2) - k1.dot(core.inverse()).dot(&k2);
        if x1 == x2 {
            self.checked_variance(cov, kernel.value(x1, x1))
        } else {
            Ok(cov)
        }
    }

    /// Posterior variances at n given `x` points specified as a (n, nx) matrix.
    pub fn predict_var(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array1<F>> {
        self.core_matrix()?;
        self.check_input_dim(x.ncols())?;
        x.rows().into_iter().map(|xi| self.covariance(&xi, &xi)).collect()
    }

    /// Width of the credible band at `x`: `credible_factor * sqrt(cov(x, x))`
    pub fn credible_interval(&self, x: &ArrayBase<impl Data<Elem = F>, Ix1>) -> Result<F> {
        let var = self.covariance(x, x)?;
        Ok(self.params.credible_factor * var.sqrt())
    }

    /// Posterior covariance matrix (m, m) at m given `x` points specified as a (m, nx) matrix.
    /// Rows are filled in parallel.
    pub fn covariance_matrix(&self, x: &ArrayBase<impl Data<Elem = F>, Ix2>) -> Result<Array2<F>> {
        let core = self.core_matrix()?;
        self.check_input_dim(x.ncols())?;
        let kernel = &self.params.kernel;
        let x = x.view();
        let kx = self.kernel_matrix(&x);
        let ckx = kx.dot(core.inverse());

        let m = x.nrows();
        let mut cov = Array2::<F>::zeros((m, m));
        cov.axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(i, mut row)| {
                for j in i..m {
                    row[j] = kernel.value(&x.row(i), &x.row(j)) - ckx.row(i).dot(&kx.row(j));
                }
            });
        for i in 0..m {
            cov[[i, i]] = self.checked_variance(cov[[i, i]], kernel.value(&x.row(i), &x.row(i)))?;
            for j in 0..i {
                cov[[i, j]] = cov[[j, i]];
            }
        }
        Ok(cov)
    }

    /// Posterior sampler over m given `x` points specified as a (m, nx) matrix
    /// for the first output
    pub fn posterior_sampler(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
    ) -> Result<PosteriorSampler<F>> {
        self.posterior_sampler_for_output(x, 0)
    }

    /// Posterior sampler over m given `x` points specified as a (m, nx) matrix
    /// for the given output index
    pub fn posterior_sampler_for_output(
        &self,
        x: &ArrayBase<impl Data<Elem = F>, Ix2>,
        output: usize,
    ) -> Result<PosteriorSampler<F>> {
        let mean = self.predict_values(x)?;
        if output >= mean.ncols() {
            return Err(GpError::InvalidValueError(format!(
                "output index {output} out of range, GP has {} outputs",
                mean.ncols()
            )));
        }
        let cov = self.covariance_matrix(x)?;
        let sampler = PosteriorSampler::new(
            mean.column(output).to_owned(),
            &cov,
            self.params.eigen_threshold,
        )?;
        sampler.check(&cov, self.params.instability_tolerance)?;
        Ok(sampler)
    }

    /// Gaussian log likelihood of the training outputs, one value per output
    pub fn log_likelihood(&self) -> Result<Array1<F>> {
        GaussianLogLikelihood.evaluate(self)
    }

    /// Covariances (n, nt) between given `x` points and the training inputs
    fn kernel_matrix(&self, x: &ArrayView2<F>) -> Array2<F> {
        let kernel = &self.params.kernel;
        let xt = self.samples.inputs();
        let mut kx = Array2::zeros((x.nrows(), xt.nrows()));
        Zip::from(kx.rows_mut())
            .and(x.rows())
            .par_for_each(|mut krow, xi| krow.assign(&kernel_vector(kernel, &xi, xt)));
        kx
    }

    fn checked_variance(&self, var: F, prior: F) -> Result<F> {
        let tol = self.params.instability_tolerance * prior.abs().max(F::one());
        if !var.is_finite() || var < -tol {
            return Err(GpError::NumericalInstability(format!(
                "posterior variance {var} is negative beyond tolerance {tol}, \
                core matrix lost positive definiteness"
            )));
        }
        Ok(var.max(F::zero()))
    }
}

fn has_duplicated_rows<F: Float>(x: &Array2<F>) -> bool {
    let n = x.nrows();
    (0..n).any(|i| ((i + 1)..n).any(|j| x.row(i) == x.row(j)))
}

impl<F: Float, K: Kernel<F>, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix2>, GpError>
    for GpValidParams<F, K>
{
    type Object = GaussianProcess<F, K>;

    /// Build a GP from the (n, nx) inputs and (n, ny) outputs of the dataset and initialize it
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix2>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() != y.nrows() {
            return Err(GpError::dimension("dataset targets", x.nrows(), y.nrows()));
        }
        let mut gp = GaussianProcess::from_params(self.clone());
        for (xi, yi) in x.rows().into_iter().zip(y.rows()) {
            gp.add_sample(&xi, &yi)?;
        }
        gp.initialize()?;
        Ok(gp)
    }
}

impl<F: Float, K: Kernel<F>, D: Data<Elem = F>> Fit<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>, GpError>
    for GpValidParams<F, K>
{
    type Object = GaussianProcess<F, K>;

    /// Build a single output GP from the (n, nx) inputs and (n,) outputs of the dataset
    fn fit(
        &self,
        dataset: &DatasetBase<ArrayBase<D, Ix2>, ArrayBase<D, Ix1>>,
    ) -> Result<Self::Object> {
        let x = dataset.records();
        let y = dataset.targets();
        if x.nrows() != y.len() {
            return Err(GpError::dimension("dataset targets", x.nrows(), y.len()));
        }
        let mut gp = GaussianProcess::from_params(self.clone());
        for (xi, yi) in x.rows().into_iter().zip(y.iter()) {
            gp.add_sample(&xi, &Array1::from_elem(1, *yi))?;
        }
        gp.initialize()?;
        Ok(gp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::GpErrorKind;
    use crate::kernels::GaussianKernel;
    use approx::assert_abs_diff_eq;
    use linfa::Dataset;
    use ndarray::{array, Array};
    use std::f64::consts::PI;

    fn sinus_gp(sigma: f64) -> GaussianProcess<f64, GaussianKernel<f64>> {
        let mut gp = GaussianProcess::new(GaussianKernel::new(0.5));
        gp.set_sigma(sigma).unwrap();
        let n = 20;
        for i in 0..n {
            let x = i as f64 * 2. * PI / n as f64;
            gp.add_sample(&array![x], &array![x.sin()]).unwrap();
        }
        gp.initialize().unwrap();
        gp
    }

    fn landmarks_gp() -> GaussianProcess<f64, GaussianKernel<f64>> {
        let mut gp = GaussianProcess::new(GaussianKernel::new(1.));
        gp.add_sample(&array![1.], &array![0.]).unwrap();
        gp.add_sample(&array![2.], &array![1.]).unwrap();
        gp.add_sample(&array![3.], &array![0.5]).unwrap();
        gp.add_sample(&array![4.], &array![1.]).unwrap();
        gp.initialize().unwrap();
        gp
    }

    #[test]
    fn test_sinus_credible_interval() {
        let gp = sinus_gp(1e-5);
        let n_tests = 50;
        for i in 0..n_tests {
            // goes beyond the training range to check extrapolation as well
            let x = array![i as f64 * 2. * PI / n_tests as f64 * 1.3];
            let cov = gp.covariance(&x, &x).unwrap();
            let ci = gp.credible_interval(&x).unwrap();
            assert_eq!(0., 2. * cov.sqrt() - ci);
        }
    }

    #[test]
    fn test_sinus_prediction() {
        let gp = sinus_gp(1e-5);
        let xtest = Array::linspace(0.1f64, 5.9, 30);
        for &x in xtest.iter() {
            let y = gp.predict(&array![x]).unwrap();
            assert_eq!(1, y.len());
            assert_abs_diff_eq!(x.sin(), y[0], epsilon = 1e-2);
        }
        // far from the data the posterior falls back to the prior
        let far = array![50.];
        assert_abs_diff_eq!(0., gp.predict(&far).unwrap()[0], epsilon = 1e-12);
        assert_abs_diff_eq!(2., gp.credible_interval(&far).unwrap(), epsilon = 1e-12);
    }

    #[test]
    fn test_zero_noise_interpolation() {
        let gp = landmarks_gp();
        let xt = gp.samples().inputs().to_owned();
        let yt = gp.samples().outputs().to_owned();
        for (x, y) in xt.rows().into_iter().zip(yt.rows()) {
            let pred = gp.predict(&x).unwrap();
            assert_abs_diff_eq!(y, pred.view(), epsilon = 1e-9);
            assert!(gp.credible_interval(&x).unwrap() < 1e-6);
        }
        assert!(gp.credible_interval(&array![2.5]).unwrap() > 1e-3);
    }

    #[test]
    fn test_small_noise_with_dense_inputs() {
        let mut gp = GaussianProcess::<f64, _>::new(GaussianKernel::new(1.));
        gp.set_sigma(1e-8).unwrap();
        for i in 0..60 {
            let x = i as f64 * 0.1;
            gp.add_sample(&array![x], &array![x.sin()]).unwrap();
        }
        gp.initialize().unwrap();
        let (_, det) = gp.core_matrix_and_determinant().unwrap();
        assert!(det.is_positive());
        let lkh: f64 = gp.log_likelihood().unwrap()[0];
        assert!(lkh.is_finite());
        assert_abs_diff_eq!(0., gp.predict(&array![0.]).unwrap()[0], epsilon = 1e-5);
        assert_abs_diff_eq!(
            2.5f64.sin(),
            gp.predict(&array![2.5]).unwrap()[0],
            epsilon = 1e-5
        );
    }

    #[test]
    fn test_uninitialized_queries() {
        let mut gp = GaussianProcess::new(GaussianKernel::new(1.));
        gp.add_sample(&array![0.], &array![1.]).unwrap();
        let err = gp.predict(&array![0.5]).unwrap_err();
        assert_eq!(GpErrorKind::Uninitialized, err.kind());

        gp.initialize().unwrap();
        assert!(gp.predict(&array![0.5]).is_ok());

        // adding a sample invalidates the core matrix
        gp.add_sample(&array![1.], &array![2.]).unwrap();
        assert!(!gp.is_initialized());
        for err in [
            gp.predict(&array![0.5]).unwrap_err(),
            gp.covariance(&array![0.5], &array![0.5]).unwrap_err(),
            gp.credible_interval(&array![0.5]).unwrap_err(),
            gp.log_likelihood().unwrap_err(),
            gp.label_matrix().unwrap_err(),
        ] {
            assert_eq!(GpErrorKind::Uninitialized, err.kind());
        }

        gp.initialize().unwrap();
        assert_eq!(2, gp.core_matrix().unwrap().size());

        // so does a noise change
        gp.set_sigma(0.1).unwrap();
        assert!(matches!(
            gp.core_matrix_and_determinant(),
            Err(GpError::Uninitialized(_))
        ));
        assert!(gp.set_sigma(-0.1).is_err());
        assert_eq!(0.1, gp.sigma());
        gp.initialize().unwrap();
        gp.set_kernel(GaussianKernel::new(2.));
        assert!(!gp.is_initialized());
        assert_eq!(&GaussianKernel::new(2.), gp.kernel());
    }

    #[test]
    fn test_initialize_without_samples() {
        let mut gp = GaussianProcess::<f64, _>::new(GaussianKernel::new(1.));
        assert!(matches!(gp.initialize(), Err(GpError::EmptySampleStore)));
        assert!(!gp.is_initialized());
        assert_eq!(GpErrorKind::Other, gp.initialize().unwrap_err().kind());
    }

    #[test]
    fn test_dimension_mismatch() {
        let mut gp = GaussianProcess::new(GaussianKernel::new(1.));
        gp.add_sample(&array![0., 1.], &array![1.]).unwrap();
        assert_eq!(
            GpErrorKind::DimensionMismatch,
            gp.add_sample(&array![0.], &array![1.]).unwrap_err().kind()
        );
        gp.initialize().unwrap();
        assert_eq!((2, 1), gp.dims());
        let err = gp.predict(&array![0.]).unwrap_err();
        assert!(matches!(
            err,
            GpError::DimensionMismatch {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert_eq!(
            GpErrorKind::DimensionMismatch,
            gp.covariance(&array![0., 1.], &array![0.]).unwrap_err().kind()
        );
        assert_eq!(
            GpErrorKind::DimensionMismatch,
            gp.covariance_matrix(&array![[0., 1., 2.]]).unwrap_err().kind()
        );
    }

    #[test]
    fn test_multi_output() {
        let xt = Array::linspace(0f64, 6., 13);
        let mut gp = GaussianProcess::new(GaussianKernel::new(0.7));
        let mut gp_sin = GaussianProcess::new(GaussianKernel::new(0.7));
        let mut gp_cos = GaussianProcess::new(GaussianKernel::new(0.7));
        for &x in xt.iter() {
            gp.add_sample(&array![x], &array![x.sin(), x.cos()]).unwrap();
            gp_sin.add_sample(&array![x], &array![x.sin()]).unwrap();
            gp_cos.add_sample(&array![x], &array![x.cos()]).unwrap();
        }
        gp.initialize().unwrap();
        gp_sin.initialize().unwrap();
        gp_cos.initialize().unwrap();

        let x = array![2.2];
        let y = gp.predict(&x).unwrap();
        assert_abs_diff_eq!(gp_sin.predict(&x).unwrap()[0], y[0], epsilon = 1e-12);
        assert_abs_diff_eq!(gp_cos.predict(&x).unwrap()[0], y[1], epsilon = 1e-12);
        assert_abs_diff_eq!(
            gp_sin.covariance(&x, &array![3.]).unwrap(),
            gp.covariance(&x, &array![3.]).unwrap(),
            epsilon = 1e-12
        );
        assert_eq!(2, gp.log_likelihood().unwrap().len());
    }

    #[test]
    fn test_batch_predictions() {
        let gp = sinus_gp(1e-3);
        let x = Array::linspace(-1., 8., 17).insert_axis(Axis(1));
        let values = gp.predict_values(&x).unwrap();
        let vars = gp.predict_var(&x).unwrap();
        let cov = gp.covariance_matrix(&x).unwrap();
        assert_eq!(&[17, 1], values.shape());
        assert_eq!(cov, cov.t());
        for (i, xi) in x.rows().into_iter().enumerate() {
            assert_abs_diff_eq!(gp.predict(&xi).unwrap()[0], values[[i, 0]], epsilon = 1e-12);
            assert_abs_diff_eq!(vars[i], cov[[i, i]], epsilon = 1e-10);
            for (j, xj) in x.rows().into_iter().enumerate() {
                assert_abs_diff_eq!(
                    gp.covariance(&xi, &xj).unwrap(),
                    cov[[i, j]],
                    epsilon = 1e-10
                );
            }
        }
    }

    #[test]
    fn test_fit_dataset() {
        let xt = array![[0.0], [1.0], [2.0], [3.0], [4.0]];
        let yt = array![0.0, 1.0, 1.5, 0.9, 1.0];
        let gp = GaussianProcess::<f64, GaussianKernel<f64>>::params(GaussianKernel::new(1.))
            .sigma(1e-6)
            .fit(&Dataset::new(xt.clone(), yt.clone()))
            .expect("GP fit error");
        assert!(gp.is_initialized());
        assert_eq!(5, gp.n_samples());
        assert_abs_diff_eq!(1.5, gp.predict(&array![2.0]).unwrap()[0], epsilon = 1e-4);

        let multi = GaussianProcess::<f64, GaussianKernel<f64>>::params(GaussianKernel::new(1.))
            .fit(&Dataset::new(xt, yt.insert_axis(Axis(1))))
            .expect("GP fit error");
        assert_eq!((1, 1), multi.dims());
        assert_eq!(
            "GP(kernel=GaussianKernel(sigma=1, scale=1), sigma=0, n_samples=5, initialized=true)",
            multi.to_string()
        );

        let invalid = GaussianProcess::<f64, GaussianKernel<f64>>::params(GaussianKernel::new(1.))
            .sigma(-1.)
            .fit(&Dataset::new(array![[0.]], array![0.]));
        assert!(matches!(invalid, Err(GpError::InvalidValueError(_))));
    }

    #[test]
    fn test_instability_is_reported() {
        let gp = landmarks_gp();
        assert!(gp.checked_variance(-1e-3, 1.).is_err());
        assert!(gp.checked_variance(f64::NAN, 1.).is_err());
        assert_eq!(0., gp.checked_variance(-1e-12, 1.).unwrap());
        assert_eq!(
            GpErrorKind::NumericalInstability,
            gp.checked_variance(-1e-3, 1.).unwrap_err().kind()
        );
    }
}
