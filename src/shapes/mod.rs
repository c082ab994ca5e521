use shape::*;
pub use shape::{Shape, ShapeTrait};

use paste::paste;

pub mod custom;
pub mod polynomial;
pub mod shape;

macro_rules! shape {
    ($module:ident, [$($par:ident),* $(,)?], $func:expr, $doc:literal $(,)?) => {
        paste! {
            pub mod $module {
                use super::*;

                #[doc = $doc]
                #[derive(Clone, Debug, Default, PartialEq, Eq)]
                pub struct [<$module:camel Shape>] {}

                impl [<$module:camel Shape>] {
                    pub fn new() -> Self {
                        Self {}
                    }

                    pub const fn doc() -> &'static str {
                        $doc
                    }

                    /// Parameter names in the order `eval` reads them
                    pub const fn parameter_names() -> &'static [&'static str] {
                        &[$(stringify!($par)),*]
                    }
                }

                impl ShapeTrait for [<$module:camel Shape>] {
                    fn name(&self) -> &str {
                        stringify!($module)
                    }

                    #[inline]
                    fn npars(&self) -> usize {
                        Self::parameter_names().len()
                    }

                    #[inline]
                    fn eval(&self, x: f64, pars: &[f64]) -> f64 {
                        let func = $func;
                        func(x, pars)
                    }
                }
            }
        }
    };
}

shape!(
    gaussian,
    [mean, sigma],
    |x: f64, p: &[f64]| {
        let (mean, sigma) = (p[0], p[1]);
        f64::exp(-(x - mean) * (x - mean) / 2.0 / sigma / sigma)
    },
    "Gaussian peak $\\exp(-(x - \\mu)^2 / 2\\sigma^2)$",
);

shape!(
    breit_wigner,
    [mass, width],
    |x: f64, p: &[f64]| {
        let (mass, width) = (p[0], p[1]);
        1.0 / ((x - mass) * (x - mass) + 0.25 * width * width)
    },
    "Non-relativistic Breit-Wigner resonance $1 / ((x - m)^2 + \\Gamma^2 / 4)$",
);

shape!(
    exponential,
    [slope],
    |x: f64, p: &[f64]| f64::exp(p[0] * x),
    "Exponential $\\exp(\\lambda x)$",
);

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn gaussian_peak() {
        let shape = Shape::gaussian();
        assert_eq!(shape.npars(), 2);
        assert_eq!(shape.name(), "gaussian");
        assert_relative_eq!(shape.eval(1.0, &[1.0, 4.0]), 1.0);
        assert_relative_eq!(shape.eval(5.0, &[1.0, 4.0]), f64::exp(-0.5));
    }

    #[test]
    fn breit_wigner_peak() {
        let shape = Shape::breit_wigner();
        assert_eq!(
            breit_wigner::BreitWignerShape::parameter_names(),
            &["mass", "width"]
        );
        assert_relative_eq!(shape.eval(1.0, &[1.0, 4.0]), 0.25);
        // half maximum at m ± Γ/2
        assert_relative_eq!(shape.eval(3.0, &[1.0, 4.0]), 0.125);
    }

    #[test]
    fn exponential_slope() {
        let shape = Shape::exponential();
        assert_eq!(shape.npars(), 1);
        assert_relative_eq!(shape.eval(2.0, &[-0.5]), f64::exp(-1.0));
    }
}
