use nalgebra::DMatrix;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Quality of a covariance estimate
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum CovarianceStatus {
    /// Inverse of a positive-definite Hessian
    Accurate,
    /// Hessian needed diagonal damping or only its diagonal was used
    Approximate,
    /// Not computed
    NotAvailable,
}

/// Parameter covariance estimated from the curvature of the objective at its minimum
#[derive(Clone, Debug, PartialEq)]
pub struct Covariance {
    pub matrix: DMatrix<f64>,
    pub status: CovarianceStatus,
}

impl Covariance {
    pub fn not_available(n: usize) -> Self {
        Self {
            matrix: DMatrix::from_element(n, n, f64::NAN),
            status: CovarianceStatus::NotAvailable,
        }
    }

    /// Square roots of the diagonal
    pub fn errors(&self) -> Vec<f64> {
        self.matrix.diagonal().iter().map(|v| v.sqrt()).collect()
    }
}

/// Finite-difference step for the `i`-th coordinate
fn step(x: f64) -> f64 {
    1e-3 * x.abs().max(1.0)
}

/// Symmetric central-difference Hessian of `f` at `x`
pub fn hessian(f: &dyn Fn(&[f64]) -> f64, x: &[f64]) -> DMatrix<f64> {
    let n = x.len();
    let f0 = f(x);
    let steps: Vec<_> = x.iter().map(|&x| step(x)).collect();
    let shifted = |shifts: &[(usize, f64)]| {
        let mut point = x.to_vec();
        for &(i, delta) in shifts {
            point[i] += delta;
        }
        f(&point)
    };

    let mut hessian = DMatrix::zeros(n, n);
    for i in 0..n {
        let hi = steps[i];
        hessian[(i, i)] = (shifted(&[(i, hi)]) - 2.0 * f0 + shifted(&[(i, -hi)])) / (hi * hi);
        for j in 0..i {
            let hj = steps[j];
            let value = (shifted(&[(i, hi), (j, hj)])
                - shifted(&[(i, hi), (j, -hj)])
                - shifted(&[(i, -hi), (j, hj)])
                + shifted(&[(i, -hi), (j, -hj)]))
                / (4.0 * hi * hj);
            hessian[(i, j)] = value;
            hessian[(j, i)] = value;
        }
    }
    hessian
}

/// Damped Cholesky inverse, the flag is set when damping was required
fn invert_hessian(hessian: &DMatrix<f64>) -> Option<(DMatrix<f64>, bool)> {
    let n = hessian.nrows();
    let identity = DMatrix::identity(n, n);
    let diag_scale = (0..n)
        .map(|i| hessian[(i, i)].abs())
        .fold(0.0_f64, f64::max)
        .max(1.0);

    let mut damped = hessian.clone();
    let mut damping = 0.0_f64;
    let max_attempts = 10;
    for attempt in 0..max_attempts {
        if let Some(cholesky) = damped.clone().cholesky() {
            let inverse = cholesky.solve(&identity);
            if inverse.iter().all(|v| v.is_finite()) {
                return Some((inverse, damping > 0.0));
            }
        }
        if attempt + 1 == max_attempts {
            break;
        }
        let next_damping = if damping == 0.0 {
            diag_scale * 1e-9
        } else {
            damping * 10.0
        };
        for i in 0..n {
            damped[(i, i)] += next_damping - damping;
        }
        damping = next_damping;
    }
    None
}

/// Covariance `2 up H⁻¹` of the parameters minimizing `f`
///
/// `up` is the objective increase defining one standard deviation. If the Hessian is not
/// positive definite even after damping, the inverse of its diagonal is used.
pub fn covariance(f: &dyn Fn(&[f64]) -> f64, x: &[f64], up: f64) -> Covariance {
    let n = x.len();
    if n == 0 {
        return Covariance {
            matrix: DMatrix::zeros(0, 0),
            status: CovarianceStatus::Accurate,
        };
    }
    let hessian = hessian(f, x);
    if !hessian.iter().all(|v| v.is_finite()) {
        log::warn!("objective Hessian is not finite, covariance is not available");
        return Covariance::not_available(n);
    }
    match invert_hessian(&hessian) {
        Some((inverse, damped)) => {
            if damped {
                log::warn!("objective Hessian is not positive definite, damping applied");
            }
            Covariance {
                matrix: inverse * (2.0 * up),
                status: if damped {
                    CovarianceStatus::Approximate
                } else {
                    CovarianceStatus::Accurate
                },
            }
        }
        None => {
            log::warn!("objective Hessian cannot be inverted, using its diagonal");
            let diagonal = hessian
                .diagonal()
                .map(|h| 2.0 * up / h.abs().max(1e-12));
            Covariance {
                matrix: DMatrix::from_diagonal(&diagonal),
                status: CovarianceStatus::Approximate,
            }
        }
    }
}
