#![doc = include_str!("../README.md")]


mod data;
pub use data::{Binning, ColumnData, ColumnRef, ColumnSource, Columns, Histogram, Sample};

mod density;
pub use density::{
    ChangeDetection, CompositeDensity, Density, DensityTrait, KernelDensity, NormCache,
    NormStatus, ProjectionDensity,
};

mod error;
pub use error::{DensityError, MinimizerError, ModelError, SampleError};

mod fit;
pub use fit::{FitOptions, FitResult, FitStatus, FittedParameter};

pub mod minimizer;
pub use minimizer::{
    CobylaMinimizer, CovarianceStatus, Minimizer, MinimizerTrait, MinosInterval,
    NelderMeadMinimizer,
};

mod objective;
pub use objective::{Chi2Objective, NllObjective, Objective, ObjectiveTerm};

mod parameter;
pub use parameter::{Parameter, ParameterId, ParameterSet};

pub mod shapes;
pub use shapes::{Shape, ShapeTrait};

pub use ndarray;
