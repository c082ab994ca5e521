use crate::minimizer::{Minimizer, MinimizerTrait, MinimumOutput};

use cobyla::{Func, RhoBeg, StopTols, minimize};
use ordered_float::NotNan;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cell::Cell;

/// COBYLA (Constrained Optimization BY Linear Approximations) minimizer
///
/// COBYLA is a derivative-free algorithm supporting parameter bounds through constraints. It
/// builds linear approximations of the objective and is described in M.J.D. Powell's 1994 paper
/// "A direct search optimization method that models the objective and constraint functions by
/// linear interpolation".
///
/// Optionally, if `fine_tuning` is `Some`, the best guess of COBYLA is sent to the next minimizer
/// as an initial guess and its result is returned.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
#[serde(rename = "Cobyla")]
pub struct CobylaMinimizer {
    pub niterations: u32,
    pub rhobeg: NotNan<f64>,
    pub ftol_rel: NotNan<f64>,
    pub fine_tuning: Option<Box<Minimizer>>,
}

impl CobylaMinimizer {
    /// Create a new [CobylaMinimizer].
    ///
    /// # Arguments
    /// - `niterations`: maximum number of objective evaluations
    /// - `rhobeg`: initial change to parameters without a usable step of their own
    /// - `ftol_rel`: relative tolerance on the objective value for convergence
    /// - `fine_tuning`: optional minimizer to refine COBYLA's result
    ///
    /// # Panics
    /// If `niterations` is zero, `rhobeg` is not positive and finite or `ftol_rel` is not
    /// non-negative and finite.
    pub fn new(
        niterations: u32,
        rhobeg: f64,
        ftol_rel: f64,
        fine_tuning: Option<Minimizer>,
    ) -> Self {
        assert!(niterations > 0, "niterations must be positive");
        assert!(
            rhobeg.is_finite() && rhobeg > 0.0,
            "rhobeg must be positive and finite"
        );
        assert!(
            ftol_rel.is_finite() && ftol_rel >= 0.0,
            "ftol_rel must be non-negative and finite"
        );
        Self {
            niterations,
            rhobeg: super::not_nan(rhobeg),
            ftol_rel: super::not_nan(ftol_rel),
            fine_tuning: fine_tuning.map(|x| x.into()),
        }
    }

    #[inline]
    pub fn default_niterations() -> u32 {
        1000
    }

    #[inline]
    pub fn default_rhobeg() -> f64 {
        0.5
    }

    #[inline]
    pub fn default_ftol_rel() -> f64 {
        1e-8
    }

    #[inline]
    pub fn default_fine_tuning() -> Option<Minimizer> {
        None
    }
}

impl Default for CobylaMinimizer {
    fn default() -> Self {
        Self::new(
            Self::default_niterations(),
            Self::default_rhobeg(),
            Self::default_ftol_rel(),
            Self::default_fine_tuning(),
        )
    }
}

impl MinimizerTrait for CobylaMinimizer {
    fn minimize(
        &self,
        f: &dyn Fn(&[f64]) -> f64,
        x0: &[f64],
        steps: &[f64],
        bounds: &[(f64, f64)],
    ) -> MinimumOutput {
        let nfev = Cell::new(0_usize);
        let objective = |x: &[f64], _user_data: &mut ()| -> f64 {
            nfev.set(nfev.get() + 1);
            f(x)
        };

        // Bounds are the only constraints
        let constraints: Vec<&dyn Func<()>> = vec![];

        let stop_tol = StopTols {
            ftol_rel: self.ftol_rel.into(),
            ..StopTols::default()
        };

        let result = minimize(
            objective,
            x0,
            bounds,
            &constraints,
            (),
            self.niterations as usize,
            RhoBeg::Set(super::step_sizes(steps, x0.len(), self.rhobeg.into())),
            Some(stop_tol),
        );

        let output = match result {
            Ok((status, x, fval)) => {
                let converged = matches!(
                    status,
                    cobyla::SuccessStatus::Success
                        | cobyla::SuccessStatus::FtolReached
                        | cobyla::SuccessStatus::XtolReached
                );
                MinimumOutput {
                    x,
                    fval,
                    nfev: nfev.get(),
                    converged,
                    message: format!("COBYLA: {status:?}"),
                }
            }
            Err((status, x, fval)) => MinimumOutput {
                x,
                fval,
                nfev: nfev.get(),
                converged: false,
                message: format!("COBYLA: {status:?}"),
            },
        };

        match &self.fine_tuning {
            Some(fine_tuning) => {
                let mut tuned = fine_tuning.minimize(f, &output.x, steps, bounds);
                tuned.nfev += output.nfev;
                tuned
            }
            None => output,
        }
    }
}
