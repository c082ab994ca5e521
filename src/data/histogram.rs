use crate::data::binning::Binning;
use crate::data::sample::Sample;
use crate::error::ModelError;

use serde::{Deserialize, Serialize};

/// Binned target of chi-square fits
///
/// `dim` is the sample coordinate the histogram was filled from, a model is compared to the
/// histogram by projecting its normalization sample onto this coordinate.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Histogram {
    dim: usize,
    binning: Binning,
    contents: Vec<f64>,
    errors: Vec<f64>,
}

impl Histogram {
    pub fn new(
        dim: usize,
        binning: Binning,
        contents: Vec<f64>,
        errors: Vec<f64>,
    ) -> Result<Self, ModelError> {
        if contents.len() != binning.nbins() || errors.len() != binning.nbins() {
            return Err(ModelError::InvalidBinning(
                "contents and errors must have one entry per bin",
            ));
        }
        if errors.iter().any(|e| !(*e >= 0.0)) {
            return Err(ModelError::InvalidBinning("bin errors must be non-negative"));
        }
        Ok(Self {
            dim,
            binning,
            contents,
            errors,
        })
    }

    /// Histogram of counts with Poisson errors `sqrt(content)`
    pub fn with_poisson_errors(
        dim: usize,
        binning: Binning,
        contents: Vec<f64>,
    ) -> Result<Self, ModelError> {
        let errors = contents.iter().map(|c| c.abs().sqrt()).collect();
        Self::new(dim, binning, contents, errors)
    }

    /// Weighted fill of the `dim` coordinate of a sample, errors are `sqrt(Σ w²)`
    pub fn from_sample(sample: &Sample, dim: usize, binning: Binning) -> Result<Self, ModelError> {
        if dim >= sample.ndim() {
            return Err(ModelError::DimensionOutOfRange {
                dim,
                ndim: sample.ndim(),
            });
        }
        let mut contents = vec![0.0; binning.nbins()];
        let mut sumw2 = vec![0.0; binning.nbins()];
        for (point, w) in sample.iter() {
            if let Some(bin) = binning.find_bin(point[dim]) {
                contents[bin] += w;
                sumw2[bin] += w * w;
            }
        }
        let errors = sumw2.into_iter().map(f64::sqrt).collect();
        Self::new(dim, binning, contents, errors)
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn binning(&self) -> &Binning {
        &self.binning
    }

    pub fn nbins(&self) -> usize {
        self.binning.nbins()
    }

    pub fn contents(&self) -> &[f64] {
        &self.contents
    }

    pub fn errors(&self) -> &[f64] {
        &self.errors
    }

    /// Sum of bin contents
    pub fn total(&self) -> f64 {
        self.contents.iter().sum()
    }
}
