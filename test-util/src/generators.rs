use ndarray::{Array1, Array2};
use rand::prelude::*;
use rand_distr::{Normal, Uniform};

/// Seeded generator shared by tests and benchmarks
pub fn rng(seed: u64) -> StdRng {
    StdRng::seed_from_u64(seed)
}

/// Centers of `n` equal cells covering `[low, high)`
pub fn uniform_grid(n: usize, low: f64, high: f64) -> Array1<f64> {
    let step = (high - low) / n as f64;
    Array1::from_iter((0..n).map(|i| low + (i as f64 + 0.5) * step))
}

/// Cartesian product of two uniform grids, one point per row
pub fn grid_points_2d(nx: usize, x: (f64, f64), ny: usize, y: (f64, f64)) -> Array2<f64> {
    let gx = uniform_grid(nx, x.0, x.1);
    let gy = uniform_grid(ny, y.0, y.1);
    let mut points = Array2::zeros((nx * ny, 2));
    for (i, &xi) in gx.iter().enumerate() {
        for (j, &yj) in gy.iter().enumerate() {
            let mut row = points.row_mut(i * ny + j);
            row[0] = xi;
            row[1] = yj;
        }
    }
    points
}

pub fn gaussian_draws(rng: &mut StdRng, n: usize, mean: f64, sigma: f64) -> Array1<f64> {
    let normal = Normal::new(mean, sigma).expect("sigma must be positive and finite");
    Array1::from_iter((0..n).map(|_| normal.sample(rng)))
}

pub fn uniform_draws(rng: &mut StdRng, n: usize, low: f64, high: f64) -> Array1<f64> {
    let uniform = Uniform::new(low, high).expect("low must be smaller than high");
    Array1::from_iter((0..n).map(|_| uniform.sample(rng)))
}
