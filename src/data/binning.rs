use crate::error::ModelError;

use conv::ConvUtil;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

/// Ordered bin edges defining half-open intervals `[edges[k], edges[k + 1])`
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct Binning {
    edges: Vec<f64>,
}

impl Binning {
    /// `nbins` equal-width bins covering `[low, high)`
    pub fn uniform(nbins: usize, low: f64, high: f64) -> Result<Self, ModelError> {
        if nbins == 0 {
            return Err(ModelError::InvalidBinning("number of bins must be positive"));
        }
        if !(low.is_finite() && high.is_finite() && low < high) {
            return Err(ModelError::InvalidBinning(
                "range must be finite with low < high",
            ));
        }
        let as_float = |i: usize| -> Result<f64, ModelError> {
            i.approx_as()
                .map_err(|_| ModelError::InvalidBinning("number of bins is too large"))
        };
        let n = as_float(nbins)?;
        let edges = (0..=nbins)
            .map(|i| {
                if i == nbins {
                    Ok(high)
                } else {
                    Ok(low + (high - low) * as_float(i)? / n)
                }
            })
            .collect::<Result<_, ModelError>>()?;
        Ok(Self { edges })
    }

    /// Bins from explicit strictly ascending edges
    pub fn from_edges(edges: impl Into<Vec<f64>>) -> Result<Self, ModelError> {
        let edges = edges.into();
        if edges.len() < 2 {
            return Err(ModelError::InvalidBinning("at least two edges are required"));
        }
        if edges.iter().any(|x| !x.is_finite()) {
            return Err(ModelError::InvalidBinning("edges must be finite"));
        }
        if !edges.iter().tuple_windows().all(|(a, b)| a < b) {
            return Err(ModelError::InvalidBinning("edges must be strictly ascending"));
        }
        Ok(Self { edges })
    }

    /// Index of the bin containing `x`, `None` outside of `[first edge, last edge)`
    #[inline]
    pub fn find_bin(&self, x: f64) -> Option<usize> {
        let k = self.edges.partition_point(|&e| e <= x);
        if k == 0 || k == self.edges.len() {
            None
        } else {
            Some(k - 1)
        }
    }

    pub fn nbins(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn low(&self) -> f64 {
        self.edges[0]
    }

    pub fn high(&self) -> f64 {
        self.edges[self.edges.len() - 1]
    }

    pub fn bin_width(&self, bin: usize) -> f64 {
        self.edges[bin + 1] - self.edges[bin]
    }

    pub fn bin_center(&self, bin: usize) -> f64 {
        0.5 * (self.edges[bin] + self.edges[bin + 1])
    }
}

impl TryFrom<Vec<f64>> for Binning {
    type Error = ModelError;

    fn try_from(edges: Vec<f64>) -> Result<Self, Self::Error> {
        Self::from_edges(edges)
    }
}

impl From<Binning> for Vec<f64> {
    fn from(binning: Binning) -> Self {
        binning.edges
    }
}
