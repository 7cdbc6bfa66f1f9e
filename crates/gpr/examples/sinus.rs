use gpr::kernels::GaussianKernel;
use gpr::{GaussianProcess, HyperSearch};
use ndarray::{array, concatenate, Array, Array1, Axis};
use ndarray_rand::rand::SeedableRng;
use rand_xoshiro::Xoshiro256Plus;
use std::f64::consts::PI;

fn main() {
    env_logger::init();

    let n = 20;
    let mut gp = GaussianProcess::new(GaussianKernel::new(0.5));
    gp.set_sigma(1e-5).expect("valid noise");
    for i in 0..n {
        let x = i as f64 * 2. * PI / n as f64;
        gp.add_sample(&array![x], &array![x.sin()])
            .expect("sample added");
    }
    gp.initialize().expect("GP initialized");
    println!("{gp}");
    println!("log likelihood = {}", gp.log_likelihood().expect("likelihood"));

    // go beyond the training range where the credible interval widens
    let xtest = Array::linspace(0., 2. * PI * 1.3, 27).insert_axis(Axis(1));
    let ypred = gp.predict_values(&xtest).expect("GP prediction");
    let ci: Array1<f64> = xtest
        .rows()
        .into_iter()
        .map(|x| gp.credible_interval(&x).expect("credible interval"))
        .collect();
    println!("Prediction (x, sin(x), mean(x), credible interval(x))");
    println!(
        "{}",
        concatenate![
            Axis(1),
            xtest,
            xtest.mapv(f64::sin),
            ypred,
            ci.insert_axis(Axis(1))
        ]
    );

    let sampler = gp.posterior_sampler(&xtest).expect("posterior sampler");
    let mut rng = Xoshiro256Plus::seed_from_u64(42);
    println!(
        "Posterior trajectories ({} components kept)\n{}",
        sampler.n_components(),
        sampler.sample(3, &mut rng)
    );

    let best = HyperSearch::new()
        .n_start(4)
        .bounds(1e-2, 1e1)
        .optimize(&gp)
        .expect("hyperparameter search");
    println!(
        "Optimized {best}, log likelihood = {}",
        best.log_likelihood().expect("likelihood")
    );
}
