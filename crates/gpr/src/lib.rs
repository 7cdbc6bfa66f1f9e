//! This library implements [Gaussian Process](https://en.wikipedia.org/wiki/Gaussian_process) regression
//! with noisy observations and several outputs sharing the same covariance kernel.
//!
//! A model is built by adding training samples to a [GaussianProcess] and initializing it:
//! the inverse `C = inv(K + sigma.I)` of the kernel matrix (the core matrix) and its determinant
//! are computed once, then used by every query:
//!
//! * posterior mean and covariance, credible intervals ([GaussianProcess::predict],
//!   [GaussianProcess::covariance], [GaussianProcess::credible_interval]),
//! * Gaussian log likelihood of the training outputs ([GaussianLogLikelihood]), used
//!   to score kernel hyperparameters ([HyperSearch]),
//! * posterior trajectories drawn from a truncated eigendecomposition of the
//!   posterior covariance ([PosteriorSampler]).
//!
//! Covariance kernels implement the [kernels::Kernel] trait.
//!
//! Adding a sample or changing the noise invalidates the model: queries then fail with
//! [GpError::Uninitialized] until [GaussianProcess::initialize] is called again.
#![warn(missing_docs)]
#![warn(rustdoc::broken_intra_doc_links)]
mod algorithm;
mod core_matrix;
mod errors;
pub mod kernels;
mod likelihood;
mod optimization;
mod parameters;
mod samples;
mod sampling;

pub use algorithm::*;
pub use core_matrix::*;
pub use errors::*;
pub use likelihood::*;
pub use optimization::*;
pub use parameters::*;
pub use samples::*;
pub use sampling::*;
