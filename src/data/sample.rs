use crate::data::source::{ColumnRef, ColumnSource};
use crate::error::SampleError;

use ndarray::{Array1, Array2, ArrayView1, ArrayView2, Axis};
use ndarray_stats::QuantileExt;

/// Weighted multi-dimensional points
///
/// Coordinates are stored one event per row, so every point is a contiguous slice. Weights
/// are finite and non-negative. Samples are read-only once built and are usually shared
/// between density models through [std::rc::Rc].
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    points: Array2<f64>,
    weights: Array1<f64>,
    weighted_size: f64,
}

impl Sample {
    /// Sample from an `(events, dimensions)` array, `weights = None` gives unit weights
    pub fn new(points: Array2<f64>, weights: Option<Array1<f64>>) -> Result<Self, SampleError> {
        let n = points.nrows();
        let weights = match weights {
            Some(weights) => {
                if weights.len() != n {
                    return Err(SampleError::LengthMismatch {
                        field: "weight".to_owned(),
                        expected: n,
                        actual: weights.len(),
                    });
                }
                if let Some((index, &weight)) = weights
                    .iter()
                    .enumerate()
                    .find(|(_, w)| !(w.is_finite() && **w >= 0.0))
                {
                    return Err(SampleError::InvalidWeight { index, weight });
                }
                weights
            }
            None => Array1::ones(n),
        };
        // Owned standard layout keeps every event contiguous
        let points = points.as_standard_layout().into_owned();
        let weighted_size = weights.sum();
        Ok(Self {
            points,
            weights,
            weighted_size,
        })
    }

    /// Unit-weight sample
    pub fn from_points(points: Array2<f64>) -> Self {
        let weights = Array1::ones(points.nrows());
        let weighted_size = weights.sum();
        Self {
            points: points.as_standard_layout().into_owned(),
            weights,
            weighted_size,
        }
    }

    /// One-dimensional sample
    pub fn from_values(
        values: impl Into<Vec<f64>>,
        weights: Option<Vec<f64>>,
    ) -> Result<Self, SampleError> {
        let values = Array1::from(values.into());
        let points = values.insert_axis(Axis(1));
        Self::new(points, weights.map(Array1::from))
    }

    /// Load a sample from a columnar source
    ///
    /// Every field in `fields` becomes a dimension in the given order. `f64` and `f32` columns
    /// are accepted. When `weight` is `None` every event has unit weight.
    pub fn from_source<S>(
        source: &S,
        fields: &[&str],
        weight: Option<&str>,
    ) -> Result<Self, SampleError>
    where
        S: ColumnSource + ?Sized,
    {
        if fields.is_empty() {
            return Err(SampleError::NoFields);
        }
        let n = source.n_rows();
        let mut points = Array2::zeros((n, fields.len()));
        for (dim, &field) in fields.iter().enumerate() {
            let column = read_column(source, field, n)?;
            points.column_mut(dim).assign(&column);
        }
        let weights = weight
            .map(|field| read_column(source, field, n))
            .transpose()?;
        Self::new(points, weights)
    }

    /// Dimensionality of every point
    #[inline]
    pub fn ndim(&self) -> usize {
        self.points.ncols()
    }

    /// Number of events
    #[inline]
    pub fn len(&self) -> usize {
        self.points.nrows()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Sum of all weights
    #[inline]
    pub fn weighted_size(&self) -> f64 {
        self.weighted_size
    }

    #[inline]
    pub fn point(&self, i: usize) -> ArrayView1<'_, f64> {
        self.points.row(i)
    }

    #[inline]
    pub fn weight(&self, i: usize) -> f64 {
        self.weights[i]
    }

    pub fn points(&self) -> ArrayView2<'_, f64> {
        self.points.view()
    }

    pub fn weights(&self) -> ArrayView1<'_, f64> {
        self.weights.view()
    }

    /// Iterate over `(point, weight)` pairs
    pub fn iter(&self) -> impl Iterator<Item = (ArrayView1<'_, f64>, f64)> + '_ {
        self.points
            .axis_iter(Axis(0))
            .zip(self.weights.iter().copied())
    }

    /// Minimum coordinate along `dim`, `None` for an empty sample or a wrong dimension
    pub fn min(&self, dim: usize) -> Option<f64> {
        if self.is_empty() || dim >= self.ndim() {
            return None;
        }
        Some(*self.points.column(dim).min_skipnan())
    }

    /// Maximum coordinate along `dim`, `None` for an empty sample or a wrong dimension
    pub fn max(&self, dim: usize) -> Option<f64> {
        if self.is_empty() || dim >= self.ndim() {
            return None;
        }
        Some(*self.points.column(dim).max_skipnan())
    }
}

fn read_column<S>(source: &S, field: &str, n: usize) -> Result<Array1<f64>, SampleError>
where
    S: ColumnSource + ?Sized,
{
    let column: Array1<f64> = match source.column(field) {
        Some(ColumnRef::F64(v)) => v.iter().copied().collect(),
        Some(ColumnRef::F32(v)) => v.iter().map(|&x| f64::from(x)).collect(),
        Some(ColumnRef::Unsupported(type_name)) => {
            return Err(SampleError::UnsupportedFieldType {
                field: field.to_owned(),
                type_name,
            });
        }
        None => return Err(SampleError::MissingField(field.to_owned())),
    };
    if column.len() != n {
        return Err(SampleError::LengthMismatch {
            field: field.to_owned(),
            expected: n,
            actual: column.len(),
        });
    }
    Ok(column)
}
