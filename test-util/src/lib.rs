pub use generators::{gaussian_draws, grid_points_2d, rng, uniform_draws, uniform_grid};

mod generators;
