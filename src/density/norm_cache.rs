use crate::data::Sample;
use crate::error::DensityError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::cell::RefCell;
use std::rc::Rc;

/// Outcome of the last normalization attempt
#[derive(Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash)]
pub enum NormStatus {
    /// Normalization sample is absent or empty
    NoSample,
    Ok,
    /// Density integrates to zero over the normalization sample
    ZeroIntegral,
}

impl NormStatus {
    /// Numeric status code: -1 no sample, 0 ok, 1 zero integral
    pub fn code(self) -> i32 {
        match self {
            Self::NoSample => -1,
            Self::Ok => 0,
            Self::ZeroIntegral => 1,
        }
    }

    pub fn error(self) -> Option<DensityError> {
        match self {
            Self::NoSample => Some(DensityError::UnnormalizableModel),
            Self::Ok => None,
            Self::ZeroIntegral => Some(DensityError::DegenerateNormalization),
        }
    }
}

/// How parameter changes invalidate a cached normalization
///
/// [ChangeDetection::Exact] recomputes after any change of a parameter value, however small.
/// A tolerance skips recomputation for changes not exceeding it and must be opted in
/// explicitly.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub enum ChangeDetection {
    #[default]
    Exact,
    Tolerance(f64),
}

impl ChangeDetection {
    #[inline]
    fn changed(self, current: f64, last: f64) -> bool {
        match self {
            Self::Exact => current != last,
            // NaN never compares as unchanged
            Self::Tolerance(eps) => !((current - last).abs() <= eps),
        }
    }
}

#[derive(Clone, Debug)]
struct CacheState {
    normalized: bool,
    norm: f64,
    status: NormStatus,
    last_values: Vec<f64>,
    recomputations: usize,
}

/// Lazily recomputed normalization constant of a density model
///
/// The cached value is valid iff the last computation succeeded and no parameter value
/// changed since then, according to [ChangeDetection].
#[derive(Clone, Debug)]
pub struct NormCache {
    sample: Option<Rc<Sample>>,
    change_detection: ChangeDetection,
    state: RefCell<CacheState>,
}

impl NormCache {
    pub fn new(sample: Option<Rc<Sample>>) -> Self {
        Self {
            sample,
            change_detection: ChangeDetection::default(),
            state: RefCell::new(CacheState {
                normalized: false,
                norm: 1.0,
                status: NormStatus::NoSample,
                last_values: vec![],
                recomputations: 0,
            }),
        }
    }

    pub fn sample(&self) -> Option<&Rc<Sample>> {
        self.sample.as_ref()
    }

    /// Replace the normalization sample, the cache is always invalidated
    pub fn set_sample(&mut self, sample: Option<Rc<Sample>>) {
        self.sample = sample;
        self.invalidate();
    }

    pub fn invalidate(&self) {
        self.state.borrow_mut().normalized = false;
    }

    pub fn change_detection(&self) -> ChangeDetection {
        self.change_detection
    }

    pub fn set_change_detection(&mut self, change_detection: ChangeDetection) {
        self.change_detection = change_detection;
    }

    pub fn status(&self) -> NormStatus {
        self.state.borrow().status
    }

    /// Number of times the normalization integral was evaluated
    pub fn recomputations(&self) -> usize {
        self.state.borrow().recomputations
    }

    /// Whether any value differs from the one recorded at the last successful normalization
    pub fn parameter_changed(&self, values: &[f64]) -> bool {
        let state = self.state.borrow();
        values.len() != state.last_values.len()
            || values
                .iter()
                .zip(state.last_values.iter())
                .any(|(&current, &last)| self.change_detection.changed(current, last))
    }

    pub fn is_stale(&self, values: &[f64]) -> bool {
        !self.state.borrow().normalized || self.parameter_changed(values)
    }

    /// Cached normalization, recomputed with `weighted_sum` when stale
    ///
    /// `weighted_sum` receives the normalization sample and returns the weighted sum of the
    /// unnormalized density over it.
    pub fn get_or_compute<F>(&self, values: &[f64], weighted_sum: F) -> f64
    where
        F: FnOnce(&Sample) -> f64,
    {
        if !self.is_stale(values) {
            return self.state.borrow().norm;
        }

        let sample = self.sample.as_deref().filter(|s| !s.is_empty());
        // Evaluate before borrowing the state, the sum may consult other caches
        let outcome = sample.map(|sample| (sample.weighted_size(), weighted_sum(sample)));

        let mut state = self.state.borrow_mut();
        state.normalized = false;
        state.norm = 1.0;
        state.recomputations += 1;
        match outcome {
            None => {
                state.status = NormStatus::NoSample;
                log::warn!("density is not normalized: normalization sample is absent or empty");
            }
            Some((_, sum)) if sum == 0.0 => {
                state.status = NormStatus::ZeroIntegral;
                log::warn!("density is not normalized: integral over the sample is zero");
            }
            Some((size, sum)) => {
                state.norm = size / sum;
                state.normalized = true;
                state.status = NormStatus::Ok;
                state.last_values.clear();
                state.last_values.extend_from_slice(values);
                log::debug!("density normalization recomputed: {}", state.norm);
            }
        }
        state.norm
    }
}
