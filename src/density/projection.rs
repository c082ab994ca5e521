use crate::data::{Binning, Sample};
use crate::density::kernel::check_parameter_count;
use crate::density::{DensityTrait, NormCache};
use crate::error::ModelError;
use crate::parameter::{ParameterId, ParameterSet};
use crate::shapes::{Shape, ShapeTrait};

use macro_const::macro_const;
use ndarray::ArrayView1;
use std::rc::Rc;

macro_const! {
    const DOC: &str = r"
Binned projection of a reference sample

The normalization sample is partitioned once along the projection dimension $d$ into the bins
of a [Binning]; bins are half-open, $[e_j; e_{j+1})$, and points outside of the edges are
dropped. The model value at a point $x$ is the weighted mean of the kernel over the sample
points sharing its bin:
$$
f(x) = \frac{\sum_{i \in \mathrm{bin}(x_d)} w_i\, g(y_{i,d})}{\sum_{i \in \mathrm{bin}(x_d)} w_i},
$$
where $g$ is the [Shape] kernel of the single projected coordinate. A point outside of the
binning or in a bin of zero weight has zero value.
";
}

#[derive(Clone, Debug, Default, PartialEq)]
struct ProjectionBin {
    coords: Vec<f64>,
    weights: Vec<f64>,
    total_weight: f64,
}

#[doc = DOC!()]
#[derive(Clone, Debug)]
pub struct ProjectionDensity {
    shape: Shape,
    parameters: Vec<ParameterId>,
    projdim: usize,
    ndim: usize,
    binning: Binning,
    bins: Vec<ProjectionBin>,
    cache: NormCache,
}

impl ProjectionDensity {
    pub fn new(
        shape: Shape,
        parameters: Vec<ParameterId>,
        normset: Rc<Sample>,
        projdim: usize,
        binning: Binning,
    ) -> Result<Self, ModelError> {
        let ndim = normset.ndim();
        if projdim >= ndim {
            return Err(ModelError::DimensionOutOfRange { dim: projdim, ndim });
        }
        check_parameter_count(&shape, &parameters)?;
        let mut density = Self {
            shape,
            parameters,
            projdim,
            ndim,
            binning,
            bins: vec![],
            cache: NormCache::new(None),
        };
        density.retarget(Some(normset));
        Ok(density)
    }

    pub const fn doc() -> &'static str {
        DOC
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn projdim(&self) -> usize {
        self.projdim
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    /// Bin containing `value`, `None` outside of the edges
    pub fn find_bin(&self, value: f64) -> Option<usize> {
        self.binning.find_bin(value)
    }

    /// Projected coordinates and weights of the normalization sample points inside `bin`
    pub fn bin_content(&self, bin: usize) -> Option<(&[f64], &[f64])> {
        self.bins
            .get(bin)
            .map(|bin| (bin.coords.as_slice(), bin.weights.as_slice()))
    }

    /// Sum of the weights of the normalization sample points inside `bin`
    pub fn bin_weight(&self, bin: usize) -> f64 {
        self.bins.get(bin).map_or(0.0, |bin| bin.total_weight)
    }

    fn partition(&mut self) {
        let mut bins = vec![ProjectionBin::default(); self.binning.nbins()];
        if let Some(sample) = self.cache.sample() {
            for (point, w) in sample.iter() {
                let Some(&x) = point.get(self.projdim) else {
                    continue;
                };
                if let Some(bin) = self.binning.find_bin(x) {
                    let bin = &mut bins[bin];
                    bin.coords.push(x);
                    bin.weights.push(w);
                    bin.total_weight += w;
                }
            }
        }
        self.bins = bins;
    }
}

impl DensityTrait for ProjectionDensity {
    fn ndim(&self) -> usize {
        self.ndim
    }

    fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    fn evaluate(&self, point: ArrayView1<f64>, params: &ParameterSet) -> f64 {
        let Some(bin) = point
            .get(self.projdim)
            .and_then(|&x| self.find_bin(x))
            .and_then(|bin| self.bins.get(bin))
        else {
            return 0.0;
        };
        if bin.total_weight == 0.0 {
            return 0.0;
        }
        let pars = params.values(&self.parameters);
        let sum: f64 = bin
            .coords
            .iter()
            .zip(bin.weights.iter())
            .map(|(&x, &w)| w * self.shape.eval(x, &pars))
            .sum();
        sum / bin.total_weight
    }

    fn norm_cache(&self) -> &NormCache {
        &self.cache
    }

    fn norm_cache_mut(&mut self) -> &mut NormCache {
        &mut self.cache
    }

    fn retarget(&mut self, sample: Option<Rc<Sample>>) {
        self.cache.set_sample(sample);
        self.partition();
    }
}
