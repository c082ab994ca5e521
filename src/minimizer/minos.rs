use crate::minimizer::{Minimizer, MinimizerTrait};

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Asymmetric interval of one parameter from a profile scan
///
/// `lower` is non-positive and `upper` is non-negative, both are offsets from the best-fit
/// value at which the profiled objective rises by `up`.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct MinosInterval {
    pub lower: f64,
    pub upper: f64,
    /// Both crossings were found within the iteration limit
    pub valid: bool,
}

#[derive(Clone, Copy, Debug)]
struct Crossing {
    offset: f64,
    valid: bool,
}

const MAX_ITERATIONS: usize = 20;
const TOLERANCE: f64 = 1e-2;

/// Profile scan of every coordinate of the minimum `x` of `f`
///
/// For each coordinate and direction the offset is searched at which the minimum of `f` over
/// all other coordinates exceeds `fmin` by `up`. Offsets are limited by the bounds. `errors`
/// are initial guesses of the offsets, usually the symmetric errors.
pub fn minos(
    f: &dyn Fn(&[f64]) -> f64,
    minimizer: &Minimizer,
    x: &[f64],
    fmin: f64,
    bounds: &[(f64, f64)],
    errors: &[f64],
    up: f64,
) -> Vec<MinosInterval> {
    (0..x.len())
        .map(|i| {
            let guess = if errors[i].is_finite() && errors[i] > 0.0 {
                errors[i]
            } else {
                0.1 * x[i].abs().max(1.0)
            };
            let scan = |value: f64| profile(f, minimizer, x, errors, bounds, i, value);
            let (lower, upper) = bounds[i];
            let below = find_crossing(&scan, x[i], -1.0, x[i] - lower, guess, fmin, up);
            let above = find_crossing(&scan, x[i], 1.0, upper - x[i], guess, fmin, up);
            log::debug!(
                "profile scan of parameter {i}: {:+} {:+}",
                -below.offset,
                above.offset
            );
            MinosInterval {
                lower: -below.offset,
                upper: above.offset,
                valid: below.valid && above.valid,
            }
        })
        .collect()
}

/// Minimum of `f` with the `i`-th coordinate fixed to `value`
fn profile(
    f: &dyn Fn(&[f64]) -> f64,
    minimizer: &Minimizer,
    x: &[f64],
    steps: &[f64],
    bounds: &[(f64, f64)],
    i: usize,
    value: f64,
) -> f64 {
    let with_fixed = |others: &[f64]| {
        let mut point = Vec::with_capacity(others.len() + 1);
        point.extend_from_slice(&others[..i]);
        point.push(value);
        point.extend_from_slice(&others[i..]);
        point
    };
    if x.len() == 1 {
        return f(&with_fixed(&[]));
    }
    let others: Vec<_> = x[..i].iter().chain(x[i + 1..].iter()).copied().collect();
    let other_steps: Vec<_> = steps[..i]
        .iter()
        .chain(steps[i + 1..].iter())
        .copied()
        .collect();
    let other_bounds: Vec<_> = bounds[..i]
        .iter()
        .chain(bounds[i + 1..].iter())
        .copied()
        .collect();
    let reduced = |others: &[f64]| f(&with_fixed(others));
    minimizer
        .minimize(&reduced, &others, &other_steps, &other_bounds)
        .fval
}

/// Offset along `direction` where `profile` crosses `fmin + up`
///
/// Uses the quadratic approximation of the profile to update the offset, doubling it while the
/// profile does not rise.
fn find_crossing(
    profile: &dyn Fn(f64) -> f64,
    center: f64,
    direction: f64,
    limit: f64,
    guess: f64,
    fmin: f64,
    up: f64,
) -> Crossing {
    let mut offset = guess;
    for _ in 0..MAX_ITERATIONS {
        let at_limit = offset >= limit;
        offset = offset.min(limit);
        let delta = profile(center + direction * offset) - fmin;
        if (delta - up).abs() <= TOLERANCE * up {
            return Crossing {
                offset,
                valid: true,
            };
        }
        if at_limit && delta < up {
            log::debug!("profile scan reached the parameter limit");
            return Crossing {
                offset,
                valid: true,
            };
        }
        offset = if delta > 0.0 {
            offset * (up / delta).sqrt().clamp(0.1, 10.0)
        } else {
            2.0 * offset
        };
    }
    log::warn!("profile scan did not find the crossing in {MAX_ITERATIONS} iterations");
    Crossing {
        offset,
        valid: false,
    }
}
