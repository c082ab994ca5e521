use crate::data::{Binning, Histogram, Sample};
use crate::error::DensityError;
use crate::fit::{FitOptions, FitResult};
use crate::objective::{Chi2Objective, NllObjective};
use crate::parameter::{ParameterId, ParameterSet};

pub use composite::CompositeDensity;
pub use kernel::KernelDensity;
pub use norm_cache::{ChangeDetection, NormCache, NormStatus};
pub use projection::ProjectionDensity;

use enum_dispatch::enum_dispatch;
use ndarray::ArrayView1;
use std::fmt::Debug;
use std::rc::Rc;

pub mod composite;
pub mod kernel;
pub mod norm_cache;
pub mod projection;

/// Trait each density model implements
///
/// A model is an unnormalized function of a point, [DensityTrait::evaluate], together with a
/// normalization constant computed over a normalization sample: the constant makes the
/// weighted mean of the density over the sample equal to unity. The constant is cached and
/// recomputed only after a change of any of the model's parameters.
#[enum_dispatch]
pub trait DensityTrait: Clone + Debug {
    /// Dimensionality of points the model is evaluated at
    fn ndim(&self) -> usize;

    /// Parameters the model value depends on
    fn parameters(&self) -> &[ParameterId];

    /// Unnormalized model value
    fn evaluate(&self, point: ArrayView1<f64>, params: &ParameterSet) -> f64;

    fn norm_cache(&self) -> &NormCache;

    fn norm_cache_mut(&mut self) -> &mut NormCache;

    /// Replace the normalization sample, the cached normalization is always invalidated
    fn retarget(&mut self, sample: Option<Rc<Sample>>);

    fn normalization_sample(&self) -> Option<&Rc<Sample>> {
        self.norm_cache().sample()
    }

    /// Whether any parameter value differs from the one used for the cached normalization
    fn parameter_changed(&self, params: &ParameterSet) -> bool {
        self.norm_cache()
            .parameter_changed(&params.values(self.parameters()))
    }

    fn set_change_detection(&mut self, change_detection: ChangeDetection) {
        self.norm_cache_mut().set_change_detection(change_detection);
    }

    /// Normalization constant, unity if the model cannot be normalized
    ///
    /// Failures are recorded in [DensityTrait::norm_status] and logged, they are not raised.
    fn normalization(&self, params: &ParameterSet) -> f64 {
        let values = params.values(self.parameters());
        self.norm_cache()
            .get_or_compute(&values, |sample| self.weighted_sum(sample, params))
    }

    /// Normalization constant or the reason it cannot be computed
    fn try_normalization(&self, params: &ParameterSet) -> Result<f64, DensityError> {
        let norm = self.normalization(params);
        match self.norm_status().error() {
            Some(error) => Err(error),
            None => Ok(norm),
        }
    }

    fn norm_status(&self) -> NormStatus {
        self.norm_cache().status()
    }

    /// Number of normalization recomputations so far
    fn normalization_count(&self) -> usize {
        self.norm_cache().recomputations()
    }

    /// Normalized model value
    fn density(&self, point: ArrayView1<f64>, params: &ParameterSet) -> f64 {
        self.normalization(params) * self.evaluate(point, params)
    }

    /// Weighted sum of unnormalized values over a sample, negative values are skipped
    fn weighted_sum(&self, sample: &Sample, params: &ParameterSet) -> f64 {
        sample
            .iter()
            .map(|(point, w)| (self.evaluate(point, params), w))
            .filter(|(value, _)| *value >= 0.0)
            .map(|(value, w)| value * w)
            .sum()
    }

    /// Weighted sum of log-densities over a sample, non-positive densities are skipped
    fn log_sum(&self, sample: &Sample, params: &ParameterSet) -> f64 {
        let norm = self.normalization(params);
        sample
            .iter()
            .map(|(point, w)| (norm * self.evaluate(point, params), w))
            .filter(|(density, _)| *density > 0.0)
            .map(|(density, w)| w * density.ln())
            .sum()
    }

    /// Probability of `low < x[dim] < high` estimated over the normalization sample
    ///
    /// The result changes sign when `low > high` and is zero without a usable sample.
    fn integral(&self, low: f64, high: f64, dim: usize, params: &ParameterSet) -> f64 {
        let (min, max, sign) = if low <= high {
            (low, high, 1.0)
        } else {
            (high, low, -1.0)
        };
        let Some(sample) = self.normalization_sample() else {
            return 0.0;
        };
        if dim >= sample.ndim() || sample.weighted_size() <= 0.0 {
            return 0.0;
        }
        let norm = self.normalization(params);
        let sum: f64 = sample
            .iter()
            .filter(|(point, _)| point[dim] > min && point[dim] < max)
            .map(|(point, w)| w * norm * self.evaluate(point, params))
            .sum();
        sign * sum / sample.weighted_size()
    }

    /// Weighted sum of densities of the normalization sample points falling into each bin of
    /// the `dim` coordinate
    fn project(&self, binning: &Binning, dim: usize, params: &ParameterSet) -> Vec<f64> {
        let mut projection = vec![0.0; binning.nbins()];
        let Some(sample) = self.normalization_sample() else {
            return projection;
        };
        if dim >= sample.ndim() {
            return projection;
        }
        let norm = self.normalization(params);
        for (point, w) in sample.iter() {
            if let Some(bin) = binning.find_bin(point[dim]) {
                projection[bin] += w * norm * self.evaluate(point, params);
            }
        }
        projection
    }
}

/// All density models are available as variants of this enum
///
/// Consider to import [crate::DensityTrait] as well
#[enum_dispatch(DensityTrait)]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Density {
    Composite(CompositeDensity),
    Kernel(KernelDensity),
    Projection(ProjectionDensity),
}

impl Density {
    /// Unbinned maximum-likelihood fit of the model to a sample
    pub fn fit_unbinned(
        &self,
        sample: &Sample,
        params: &mut ParameterSet,
        options: &FitOptions,
    ) -> FitResult {
        let mut objective = NllObjective::new();
        objective.attach(self, sample, params);
        objective.minimize(params, options)
    }

    /// Chi-square fit of the model projection to a histogram
    pub fn fit_binned(
        &self,
        histogram: &Histogram,
        params: &mut ParameterSet,
        options: &FitOptions,
    ) -> FitResult {
        let mut objective = Chi2Objective::new();
        objective.attach(self, histogram, params);
        objective.minimize(params, options)
    }
}
