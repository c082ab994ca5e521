use crate::error::MinimizerError;
use crate::minimizer::{CovarianceStatus, Minimizer};
use crate::parameter::ParameterId;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Fit configuration
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub struct FitOptions {
    pub minimizer: Minimizer,
    /// Estimate symmetric errors and the covariance from the Hessian
    pub hesse: bool,
    /// Scan the profiled objective for asymmetric errors
    pub minos: bool,
}

impl FitOptions {
    pub fn new(minimizer: Minimizer, hesse: bool, minos: bool) -> Self {
        Self {
            minimizer,
            hesse,
            minos,
        }
    }

    #[inline]
    pub fn default_minimizer() -> Minimizer {
        Minimizer::cobyla()
    }

    #[inline]
    pub fn default_hesse() -> bool {
        true
    }

    #[inline]
    pub fn default_minos() -> bool {
        false
    }

    pub fn with_minimizer(mut self, minimizer: Minimizer) -> Self {
        self.minimizer = minimizer;
        self
    }

    pub fn with_minos(mut self, minos: bool) -> Self {
        self.minos = minos;
        self
    }
}

impl Default for FitOptions {
    fn default() -> Self {
        Self::new(
            Self::default_minimizer(),
            Self::default_hesse(),
            Self::default_minos(),
        )
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum FitStatus {
    Converged,
    /// The minimizer stopped before convergence, the best values found are still written back
    NotConverged,
}

/// Free parameter after the fit
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FittedParameter {
    pub id: ParameterId,
    pub name: String,
    pub value: f64,
    pub error: f64,
    pub error_down: Option<f64>,
    pub error_up: Option<f64>,
}

/// Outcome of [crate::Objective::minimize]
///
/// Fitted values and errors are also written into the [crate::ParameterSet], a fit that did not
/// converge is reported here rather than raised.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct FitResult {
    pub status: FitStatus,
    /// Objective value at the best point
    pub fval: f64,
    /// Objective evaluations of the minimizer
    pub nfev: usize,
    pub message: String,
    /// Objective increase defining one standard deviation
    pub error_def: f64,
    /// Free parameters in the order of the objective
    pub parameters: Vec<FittedParameter>,
    /// Row-major covariance of the free parameters, if estimated
    pub covariance: Option<Vec<Vec<f64>>>,
    pub covariance_status: CovarianceStatus,
    /// Whether every profile scan found its crossings, `None` if no scan was requested
    pub minos_valid: Option<bool>,
}

impl FitResult {
    pub fn is_success(&self) -> bool {
        self.status == FitStatus::Converged
    }

    pub fn parameter(&self, id: ParameterId) -> Option<&FittedParameter> {
        self.parameters.iter().find(|p| p.id == id)
    }

    /// Correlation coefficient of two free parameters
    pub fn correlation(&self, i: usize, j: usize) -> Option<f64> {
        let covariance = self.covariance.as_ref()?;
        let cij = *covariance.get(i)?.get(j)?;
        let cii = covariance[i][i];
        let cjj = *covariance.get(j)?.get(j)?;
        Some(cij / (cii * cjj).sqrt())
    }

    /// Non-converged fits become [MinimizerError::NonConvergence]
    pub fn into_result(self) -> Result<Self, MinimizerError> {
        match self.status {
            FitStatus::Converged => Ok(self),
            FitStatus::NotConverged => Err(MinimizerError::NonConvergence {
                message: self.message,
                nfev: self.nfev,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(status: FitStatus) -> FitResult {
        FitResult {
            status,
            fval: 1.5,
            nfev: 42,
            message: "stopped".to_owned(),
            error_def: 1.0,
            parameters: vec![],
            covariance: Some(vec![vec![4.0, 1.0], vec![1.0, 1.0]]),
            covariance_status: CovarianceStatus::Accurate,
            minos_valid: None,
        }
    }

    #[test]
    fn non_convergence_on_request() {
        assert!(result(FitStatus::Converged).into_result().is_ok());
        assert_eq!(
            result(FitStatus::NotConverged).into_result().unwrap_err(),
            MinimizerError::NonConvergence {
                message: "stopped".to_owned(),
                nfev: 42
            }
        );
    }

    #[test]
    fn correlation() {
        let result = result(FitStatus::Converged);
        assert_eq!(result.correlation(0, 1), Some(0.5));
        assert_eq!(result.correlation(0, 2), None);
    }

    #[test]
    fn options_serialization() {
        let options = FitOptions::default()
            .with_minimizer(Minimizer::nelder_mead())
            .with_minos(true);
        let json = serde_json::to_string(&options).unwrap();
        let restored: FitOptions = serde_json::from_str(&json).unwrap();
        assert_eq!(options, restored);
        assert!(restored.hesse && restored.minos);
    }
}
