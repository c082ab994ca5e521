use crate::minimizer::bounds::{bounds_violation, clamp_to_bounds};
use crate::minimizer::{MinimizerTrait, MinimumOutput};

use argmin::core::{CostFunction, Error, Executor, State, TerminationReason, TerminationStatus};
use argmin::solver::neldermead::NelderMead;
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Nelder-Mead downhill simplex minimizer from `argmin`
///
/// The simplex is unaware of bounds, so the objective is evaluated at the point clamped into
/// the bounds and a quadratic penalty proportional to the squared distance to the box is
/// added. The returned point is always inside the bounds.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "NelderMead")]
pub struct NelderMeadMinimizer {
    pub max_iters: u64,
    pub sd_tolerance: NotNan<f64>,
    pub simplex_size: NotNan<f64>,
    pub penalty: NotNan<f64>,
}

impl NelderMeadMinimizer {
    /// Create a new [NelderMeadMinimizer].
    ///
    /// # Arguments
    /// - `max_iters`: maximum number of simplex iterations
    /// - `sd_tolerance`: convergence threshold on the standard deviation of simplex vertex costs
    /// - `simplex_size`: offset of the initial simplex vertices from the starting point along
    ///   coordinates without a usable step of their own
    /// - `penalty`: coefficient of the squared distance to the bounds added to the objective
    ///
    /// # Panics
    /// If `max_iters` is zero or any other argument is not positive and finite.
    pub fn new(max_iters: u64, sd_tolerance: f64, simplex_size: f64, penalty: f64) -> Self {
        assert!(max_iters > 0, "max_iters must be positive");
        for (name, value) in [
            ("sd_tolerance", sd_tolerance),
            ("simplex_size", simplex_size),
            ("penalty", penalty),
        ] {
            assert!(
                value.is_finite() && value > 0.0,
                "{name} must be positive and finite"
            );
        }
        Self {
            max_iters,
            sd_tolerance: super::not_nan(sd_tolerance),
            simplex_size: super::not_nan(simplex_size),
            penalty: super::not_nan(penalty),
        }
    }

    #[inline]
    pub fn default_max_iters() -> u64 {
        2000
    }

    #[inline]
    pub fn default_sd_tolerance() -> f64 {
        1e-10
    }

    #[inline]
    pub fn default_simplex_size() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_penalty() -> f64 {
        1e6
    }

    /// Starting point and one vertex per dimension shifted by its step, shifted towards the
    /// inside of the bounds when the upper bound would be crossed
    fn initial_simplex(
        &self,
        x0: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> Vec<Vec<f64>> {
        let steps = super::step_sizes(steps, x0.len(), self.simplex_size.into_inner());
        let x0 = clamp_to_bounds(x0, bounds);
        let mut simplex = vec![x0.clone()];
        for (i, (&(lower, upper), &step)) in bounds.iter().zip(steps.iter()).enumerate() {
            let mut vertex = x0.clone();
            vertex[i] = if x0[i] + step <= upper || x0[i] - step < lower {
                x0[i] + step
            } else {
                x0[i] - step
            };
            simplex.push(vertex);
        }
        simplex
    }
}

impl Default for NelderMeadMinimizer {
    fn default() -> Self {
        Self::new(
            Self::default_max_iters(),
            Self::default_sd_tolerance(),
            Self::default_simplex_size(),
            Self::default_penalty(),
        )
    }
}

struct BoundedCost<'a> {
    f: &'a dyn Fn(&[f64]) -> f64,
    bounds: &'a [(f64, f64)],
    penalty: f64,
}

impl CostFunction for BoundedCost<'_> {
    type Param = Vec<f64>;
    type Output = f64;

    fn cost(&self, x: &Self::Param) -> Result<Self::Output, Error> {
        let clamped = clamp_to_bounds(x, self.bounds);
        let value = (self.f)(&clamped) + self.penalty * bounds_violation(x, self.bounds);
        // simplex ordering needs comparable costs
        Ok(if value.is_nan() { f64::INFINITY } else { value })
    }
}

impl MinimizerTrait for NelderMeadMinimizer {
    fn minimize(
        &self,
        f: &dyn Fn(&[f64]) -> f64,
        x0: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> MinimumOutput {
        let failed = |message: String, nfev: usize| {
            let x = clamp_to_bounds(x0, bounds);
            let fval = f(&x);
            MinimumOutput {
                x,
                fval,
                nfev: nfev + 1,
                converged: false,
                message,
            }
        };

        let problem = BoundedCost {
            f,
            bounds,
            penalty: self.penalty.into_inner(),
        };
        let solver = match NelderMead::new(self.initial_simplex(x0, steps, bounds))
            .with_sd_tolerance(self.sd_tolerance.into_inner())
        {
            Ok(solver) => solver,
            Err(error) => return failed(format!("Nelder-Mead: {error}"), 0),
        };
        let result = match Executor::new(problem, solver)
            .configure(|state| state.max_iters(self.max_iters))
            .run()
        {
            Ok(result) => result,
            Err(error) => return failed(format!("Nelder-Mead: {error}"), 0),
        };

        let state = result.state();
        let nfev = state
            .get_func_counts()
            .get("cost_count")
            .map_or(0, |&count| count as usize);
        let Some(best) = state.get_best_param() else {
            return failed("Nelder-Mead: no best point".to_owned(), nfev);
        };
        let x = clamp_to_bounds(best, bounds);
        let fval = f(&x);
        let status = state.get_termination_status();
        let converged = matches!(
            status,
            TerminationStatus::Terminated(TerminationReason::SolverConverged)
        );
        MinimumOutput {
            x,
            fval,
            nfev: nfev + 1,
            converged,
            message: format!(
                "Nelder-Mead: {status:?} after {} iterations",
                state.get_iter()
            ),
        }
    }
}
