use crate::error::ModelError;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Named scalar parameter of density models
///
/// Parameters live in a [ParameterSet] and models refer to them by [ParameterId], so a single
/// parameter may be shared by several models.
#[derive(Clone, Debug, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct Parameter {
    name: String,
    value: f64,
    error: f64,
    error_down: Option<f64>,
    error_up: Option<f64>,
    lower: f64,
    upper: f64,
    constant: bool,
}

impl Parameter {
    /// Free parameter with the given initial value and bounds
    ///
    /// The initial error, used by minimizers as a step-size hint, is a tenth of the value's
    /// magnitude (or of unity for zero), limited by half of the bounded range.
    pub fn new(name: impl Into<String>, value: f64, lower: f64, upper: f64) -> Self {
        Self {
            name: name.into(),
            value,
            error: Self::default_error(value, lower, upper),
            error_down: None,
            error_up: None,
            lower,
            upper,
            constant: false,
        }
    }

    /// Unbounded free parameter
    pub fn unbounded(name: impl Into<String>, value: f64) -> Self {
        Self::new(name, value, f64::NEG_INFINITY, f64::INFINITY)
    }

    /// Parameter excluded from minimization
    pub fn constant(name: impl Into<String>, value: f64) -> Self {
        let mut parameter = Self::unbounded(name, value);
        parameter.constant = true;
        parameter.error = 0.0;
        parameter
    }

    pub fn default_error(value: f64, lower: f64, upper: f64) -> f64 {
        let error = 0.1 * if value == 0.0 { 1.0 } else { value.abs() };
        let range = upper - lower;
        if range.is_finite() && range > 0.0 {
            error.min(0.5 * range)
        } else {
            error
        }
    }

    pub fn with_error(mut self, error: f64) -> Self {
        self.error = error.abs();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value(&self) -> f64 {
        self.value
    }

    pub fn set_value(&mut self, value: f64) {
        self.value = value;
    }

    pub fn error(&self) -> f64 {
        self.error
    }

    pub fn set_error(&mut self, error: f64) {
        self.error = error;
    }

    /// Lower asymmetric error, non-positive, if profiled
    pub fn error_down(&self) -> Option<f64> {
        self.error_down
    }

    /// Upper asymmetric error, non-negative, if profiled
    pub fn error_up(&self) -> Option<f64> {
        self.error_up
    }

    pub fn set_asymmetric_errors(&mut self, down: f64, up: f64) {
        self.error_down = Some(-down.abs());
        self.error_up = Some(up.abs());
    }

    pub fn lower(&self) -> f64 {
        self.lower
    }

    pub fn upper(&self) -> f64 {
        self.upper
    }

    pub fn bounds(&self) -> (f64, f64) {
        (self.lower, self.upper)
    }

    pub fn is_constant(&self) -> bool {
        self.constant
    }

    pub fn set_constant(&mut self, constant: bool) {
        self.constant = constant;
    }
}

/// Stable handle of a [Parameter] inside its [ParameterSet]
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, JsonSchema, PartialEq, Eq, Hash, PartialOrd, Ord,
)]
pub struct ParameterId(usize);

impl ParameterId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Registry owning all parameters of a fit
#[derive(Clone, Debug, Default, Serialize, Deserialize, JsonSchema, PartialEq)]
pub struct ParameterSet {
    parameters: Vec<Parameter>,
}

impl ParameterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a parameter, names must be unique within the set
    pub fn add(&mut self, parameter: Parameter) -> Result<ParameterId, ModelError> {
        if self.find(parameter.name()).is_some() {
            return Err(ModelError::DuplicateParameter(parameter.name));
        }
        if parameter.lower.is_nan() || parameter.upper.is_nan() || parameter.lower > parameter.upper
        {
            return Err(ModelError::InvalidParameterBounds {
                name: parameter.name,
                lower: parameter.lower,
                upper: parameter.upper,
            });
        }
        self.parameters.push(parameter);
        Ok(ParameterId(self.parameters.len() - 1))
    }

    pub fn find(&self, name: &str) -> Option<ParameterId> {
        self.parameters
            .iter()
            .position(|p| p.name == name)
            .map(ParameterId)
    }

    pub fn get(&self, id: ParameterId) -> Option<&Parameter> {
        self.parameters.get(id.0)
    }

    pub fn get_mut(&mut self, id: ParameterId) -> Option<&mut Parameter> {
        self.parameters.get_mut(id.0)
    }

    #[inline]
    pub fn value(&self, id: ParameterId) -> f64 {
        self[id].value
    }

    #[inline]
    pub fn set_value(&mut self, id: ParameterId, value: f64) {
        self[id].value = value;
    }

    /// Current values of the given parameters, in order
    pub fn values(&self, ids: &[ParameterId]) -> Vec<f64> {
        ids.iter().map(|&id| self.value(id)).collect()
    }

    pub fn len(&self) -> usize {
        self.parameters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (ParameterId, &Parameter)> {
        self.parameters
            .iter()
            .enumerate()
            .map(|(i, p)| (ParameterId(i), p))
    }
}

impl Index<ParameterId> for ParameterSet {
    type Output = Parameter;

    fn index(&self, id: ParameterId) -> &Self::Output {
        &self.parameters[id.0]
    }
}

impl IndexMut<ParameterId> for ParameterSet {
    fn index_mut(&mut self, id: ParameterId) -> &mut Self::Output {
        &mut self.parameters[id.0]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_name_is_rejected() {
        let mut params = ParameterSet::new();
        params.add(Parameter::new("m", 1.0, -10.0, 10.0)).unwrap();
        assert_eq!(
            params.add(Parameter::new("m", 2.0, -10.0, 10.0)),
            Err(ModelError::DuplicateParameter("m".to_owned()))
        );
        assert_eq!(params.len(), 1);
    }

    #[test]
    fn inverted_bounds_are_rejected() {
        let mut params = ParameterSet::new();
        assert!(matches!(
            params.add(Parameter::new("w", 1.0, 5.0, 0.1)),
            Err(ModelError::InvalidParameterBounds { .. })
        ));
    }

    #[test]
    fn handles_are_stable() {
        let mut params = ParameterSet::new();
        let m = params.add(Parameter::new("m", 1.0, -10.0, 10.0)).unwrap();
        let w = params.add(Parameter::new("w", 4.0, 0.1, 20.0)).unwrap();
        params.set_value(w, 3.5);
        assert_eq!(params.find("w"), Some(w));
        assert_eq!(params.values(&[w, m]), vec![3.5, 1.0]);
        assert_eq!(params[m].name(), "m");
    }

    #[test]
    fn default_error_is_limited_by_range() {
        assert_eq!(Parameter::default_error(0.0, -1.0, 1.0), 0.1);
        assert_eq!(Parameter::default_error(100.0, 99.0, 101.0), 1.0);
        assert_eq!(Parameter::default_error(-4.0, f64::NEG_INFINITY, 0.0), 0.4);
    }

    #[test]
    fn asymmetric_errors_keep_sign_convention() {
        let mut p = Parameter::unbounded("a", 0.0);
        p.set_asymmetric_errors(0.3, -0.5);
        assert_eq!(p.error_down(), Some(-0.3));
        assert_eq!(p.error_up(), Some(0.5));
    }
}
