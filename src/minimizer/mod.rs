//! Minimizer back-ends and error estimation
//!
//! Minimizers are configured by plain serializable structs collected in the [Minimizer] enum.
//! They see the objective as a function of a flat vector of free parameter values inside a
//! box; infinite bounds are allowed. After the minimum is found, [covariance] estimates the
//! parameter covariance from the Hessian of the objective and [minos] scans the profiled
//! objective for asymmetric intervals. Both take the error definition `up`: the objective
//! increase corresponding to one standard deviation, `0.5` for a negative log-likelihood and `1`
//! for a chi-square.

use enum_dispatch::enum_dispatch;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

mod bounds;

pub mod cobyla;
pub use self::cobyla::CobylaMinimizer;

pub mod hesse;
pub use hesse::{Covariance, CovarianceStatus, covariance, hessian};

pub mod minos;
pub use minos::{MinosInterval, minos};

pub mod nelder_mead;
pub use nelder_mead::NelderMeadMinimizer;

/// Outcome of a single minimization
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MinimumOutput {
    /// Best point found, always inside the bounds
    pub x: Vec<f64>,
    /// Objective value at `x`
    pub fval: f64,
    /// Number of objective evaluations
    pub nfev: usize,
    pub converged: bool,
    pub message: String,
}

#[enum_dispatch]
pub trait MinimizerTrait: Clone + Debug {
    /// Minimize `f` starting from `x0` inside `bounds`, one `(lower, upper)` pair per coordinate
    ///
    /// `steps` are initial step sizes per coordinate, usually the parameter errors. Missing,
    /// zero or non-finite entries are replaced by the minimizer's configured default.
    fn minimize(
        &self,
        f: &dyn Fn(&[f64]) -> f64,
        x0: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> MinimumOutput;
}

/// All minimizers are available as variants of this enum
#[enum_dispatch(MinimizerTrait)]
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Minimizer {
    Cobyla(CobylaMinimizer),
    NelderMead(NelderMeadMinimizer),
}

impl Minimizer {
    pub fn cobyla() -> Self {
        CobylaMinimizer::default().into()
    }

    pub fn nelder_mead() -> Self {
        NelderMeadMinimizer::default().into()
    }
}

impl Default for Minimizer {
    fn default() -> Self {
        Self::cobyla()
    }
}

/// Initial steps of `n` coordinates with `default` in place of unusable entries
fn step_sizes(steps: &[f64], n: usize, default: f64) -> Vec<f64> {
    (0..n)
        .map(|i| match steps.get(i) {
            Some(&step) if step.is_finite() && step > 0.0 => step,
            _ => default,
        })
        .collect()
}

/// Checked conversion for configuration values
///
/// # Panics
/// If `x` is NaN
fn not_nan(x: f64) -> NotNan<f64> {
    match NotNan::new(x) {
        Ok(x) => x,
        Err(_) => panic!("configuration value must not be NaN"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialization_round_trip() {
        let minimizer: Minimizer = CobylaMinimizer::new(
            200,
            0.1,
            1e-6,
            Some(NelderMeadMinimizer::new(100, 1e-8, 0.1, 1e3).into()),
        )
        .into();
        let json = serde_json::to_string(&minimizer).unwrap();
        assert!(json.contains("NelderMead"));
        let restored: Minimizer = serde_json::from_str(&json).unwrap();
        assert_eq!(minimizer, restored);
    }

    #[test]
    fn json_schema() {
        let schema = schemars::schema_for!(Minimizer);
        let json = serde_json::to_string(&schema).unwrap();
        assert!(json.contains("Cobyla"));
    }

    #[test]
    fn both_minimizers_agree() {
        let f = |x: &[f64]| (x[0] - 0.3).powi(2) + (x[1] - 0.7).powi(2) * 10.0;
        let bounds = [(0.0, 1.0); 2];
        for minimizer in [Minimizer::cobyla(), Minimizer::nelder_mead()] {
            let output = minimizer.minimize(&f, &[0.5, 0.5], &[], &bounds);
            assert!(output.converged, "{}", output.message);
            approx::assert_abs_diff_eq!(&output.x[..], &[0.3, 0.7][..], epsilon = 1e-3);
        }
    }

    #[test]
    fn unusable_steps_fall_back_to_default() {
        assert_eq!(
            step_sizes(&[0.2, 0.0, f64::NAN, -1.0], 5, 0.5),
            vec![0.2, 0.5, 0.5, 0.5, 0.5]
        );
    }
}
