pub(super) use enum_dispatch::enum_dispatch;
pub(super) use std::fmt::Debug;

/// One-dimensional kernel of density models
///
/// A shape is an unnormalized function of a single coordinate controlled by `npars()`
/// parameters. Normalization is done by the density models over their samples.
#[enum_dispatch]
pub trait ShapeTrait: Clone + Debug {
    fn name(&self) -> &str;

    /// Number of parameters `eval` reads
    fn npars(&self) -> usize;

    /// Evaluate the kernel at `x`, `pars` has exactly `npars()` entries
    fn eval(&self, x: f64, pars: &[f64]) -> f64;
}

/// All kernels are available as variants of this enum
///
/// [Shape::Custom] wraps a user function and is the extension point for kernels not listed
/// here.
#[enum_dispatch(ShapeTrait)]
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Shape {
    BreitWigner(super::breit_wigner::BreitWignerShape),
    Custom(super::custom::CustomShape),
    Exponential(super::exponential::ExponentialShape),
    Gaussian(super::gaussian::GaussianShape),
    Polynomial(super::polynomial::PolynomialShape),
}

impl Shape {
    pub fn breit_wigner() -> Self {
        super::breit_wigner::BreitWignerShape::new().into()
    }

    pub fn exponential() -> Self {
        super::exponential::ExponentialShape::new().into()
    }

    pub fn gaussian() -> Self {
        super::gaussian::GaussianShape::new().into()
    }

    pub fn polynomial(degree: usize) -> Self {
        super::polynomial::PolynomialShape::new(degree).into()
    }

    pub fn custom<F>(name: impl Into<String>, npars: usize, func: F) -> Self
    where
        F: Fn(f64, &[f64]) -> f64 + 'static,
    {
        super::custom::CustomShape::new(name, npars, func).into()
    }
}
