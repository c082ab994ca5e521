use crate::data::Sample;
use crate::density::{Density, DensityTrait, NormCache};
use crate::error::ModelError;
use crate::parameter::{ParameterId, ParameterSet};

use ndarray::ArrayView1;
use std::rc::Rc;

/// Mixture of normalized density models
///
/// With models `m_0..m_n` and fractions `f_0..f_{n-1}` the value is
/// `Σ_{i<n} f_i density_i + (1 - Σ f_i) density_n`. Fractions are not required to sum to less
/// than unity.
#[derive(Clone, Debug)]
pub struct CompositeDensity {
    models: Vec<Density>,
    fractions: Vec<ParameterId>,
    parameters: Vec<ParameterId>,
    cache: NormCache,
}

impl CompositeDensity {
    /// Mixture of `models` with `models.len() - 1` fractions
    ///
    /// Every sub-model is retargeted to `normset`.
    pub fn new(
        models: Vec<Density>,
        fractions: Vec<ParameterId>,
        normset: Rc<Sample>,
    ) -> Result<Self, ModelError> {
        if models.len() < 2 || models.len() != fractions.len() + 1 {
            return Err(ModelError::InvalidComposition {
                models: models.len(),
                fractions: fractions.len(),
            });
        }
        let parameters = models
            .iter()
            .flat_map(|model| model.parameters().iter().copied())
            .chain(fractions.iter().copied())
            .collect();
        let mut composite = Self {
            models,
            fractions,
            parameters,
            cache: NormCache::new(None),
        };
        composite.retarget(Some(normset));
        Ok(composite)
    }

    pub fn models(&self) -> &[Density] {
        &self.models
    }

    pub fn fractions(&self) -> &[ParameterId] {
        &self.fractions
    }
}

impl DensityTrait for CompositeDensity {
    fn ndim(&self) -> usize {
        self.models.last().map_or(0, |model| model.ndim())
    }

    fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn evaluate(&self, point: ArrayView1<f64>, params: &ParameterSet) -> f64 {
        let mut fraction_sum = 0.0;
        let mut value = 0.0;
        for (model, &fraction) in self.models.iter().zip(self.fractions.iter()) {
            let fraction = params.value(fraction);
            fraction_sum += fraction;
            value += fraction * model.density(point, params);
        }
        if let Some(last) = self.models.last() {
            value += (1.0 - fraction_sum) * last.density(point, params);
        }
        value
    }

    fn norm_cache(&self) -> &NormCache {
        &self.cache
    }

    fn norm_cache_mut(&mut self) -> &mut NormCache {
        &mut self.cache
    }

    fn retarget(&mut self, sample: Option<Rc<Sample>>) {
        for model in self.models.iter_mut() {
            model.retarget(sample.clone());
        }
        self.cache.set_sample(sample);
    }
}
