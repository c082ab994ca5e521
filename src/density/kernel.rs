use crate::data::Sample;
use crate::density::{DensityTrait, NormCache};
use crate::error::ModelError;
use crate::parameter::{ParameterId, ParameterSet};
use crate::shapes::{Shape, ShapeTrait};

use ndarray::ArrayView1;
use std::rc::Rc;

/// Primitive density: a [Shape] evaluated at a single coordinate of the point
#[derive(Clone, Debug)]
pub struct KernelDensity {
    shape: Shape,
    parameters: Vec<ParameterId>,
    coord: usize,
    ndim: usize,
    cache: NormCache,
}

impl KernelDensity {
    /// Model of `ndim`-dimensional points depending on their `coord` coordinate only
    ///
    /// The model has no normalization sample, attach one with
    /// [KernelDensity::with_normalization_sample] or [DensityTrait::retarget].
    pub fn new(
        shape: Shape,
        parameters: Vec<ParameterId>,
        coord: usize,
        ndim: usize,
    ) -> Result<Self, ModelError> {
        if coord >= ndim {
            return Err(ModelError::DimensionOutOfRange { dim: coord, ndim });
        }
        check_parameter_count(&shape, &parameters)?;
        Ok(Self {
            shape,
            parameters,
            coord,
            ndim,
            cache: NormCache::new(None),
        })
    }

    pub fn with_normalization_sample(mut self, sample: Rc<Sample>) -> Self {
        self.retarget(Some(sample));
        self
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn coord(&self) -> usize {
        self.coord
    }
}

pub(super) fn check_parameter_count(
    shape: &Shape,
    parameters: &[ParameterId],
) -> Result<(), ModelError> {
    if shape.npars() != parameters.len() {
        return Err(ModelError::ParameterCount {
            shape: shape.name().to_owned(),
            expected: shape.npars(),
            actual: parameters.len(),
        });
    }
    Ok(())
}

impl DensityTrait for KernelDensity {
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn evaluate(&self, point: ArrayView1<f64>, params: &ParameterSet) -> f64 {
        match point.get(self.coord) {
            Some(&x) => self.shape.eval(x, &params.values(&self.parameters)),
            None => 0.0,
        }
    }

    fn norm_cache(&self) -> &NormCache {
        &self.cache
    }

    fn norm_cache_mut(&mut self) -> &mut NormCache {
        &mut self.cache
    }

    fn retarget(&mut self, sample: Option<Rc<Sample>>) {
        self.cache.set_sample(sample);
    }
}
