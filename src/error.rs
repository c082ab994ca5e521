/// Normalization failure recorded by a density model
///
/// These are never raised by [crate::DensityTrait::normalization], they are kept as the model
/// status and surfaced through [crate::DensityTrait::try_normalization]
#[derive(Debug, thiserror::Error, Clone, Copy, PartialEq, Eq)]
pub enum DensityError {
    #[error("density cannot be normalized: normalization sample is absent or empty")]
    UnnormalizableModel,

    #[error("density cannot be normalized: integral over the normalization sample is zero")]
    DegenerateNormalization,
}

/// Construction-time error of parameters, binnings and density models
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum ModelError {
    #[error(
        "composite density needs at least two sub-models and one fraction less than sub-models, got {models} sub-models and {fractions} fractions"
    )]
    InvalidComposition { models: usize, fractions: usize },

    #[error("dimension {dim} is out of range for a {ndim}-dimensional space")]
    DimensionOutOfRange { dim: usize, ndim: usize },

    #[error("shape {shape} takes {expected} parameters, {actual} given")]
    ParameterCount {
        shape: String,
        expected: usize,
        actual: usize,
    },

    #[error("invalid binning: {0}")]
    InvalidBinning(&'static str),

    #[error("parameter {0:?} is already registered")]
    DuplicateParameter(String),

    #[error("parameter {name:?} has invalid bounds [{lower}, {upper}]")]
    InvalidParameterBounds { name: String, lower: f64, upper: f64 },
}

/// Error returned from [crate::Sample] constructors
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum SampleError {
    #[error("field {0:?} is not found in the source")]
    MissingField(String),

    #[error("field {field:?} has unsupported type {type_name}")]
    UnsupportedFieldType {
        field: String,
        type_name: &'static str,
    },

    #[error("field {field:?} has {actual} entries, {expected} expected")]
    LengthMismatch {
        field: String,
        expected: usize,
        actual: usize,
    },

    #[error("weight {weight} of event {index} is negative or not finite")]
    InvalidWeight { index: usize, weight: f64 },

    #[error("at least one coordinate field is required")]
    NoFields,
}

/// Error produced on request from a non-converged [crate::FitResult]
#[derive(Debug, thiserror::Error, Clone, PartialEq)]
pub enum MinimizerError {
    #[error("minimizer did not converge after {nfev} evaluations: {message}")]
    NonConvergence { message: String, nfev: usize },
}
