use crate::shapes::shape::*;

/// Polynomial kernel with unit constant term
///
/// $f(x) = 1 + \sum_{k=1}^{n} c_k x^k$, parameters are $c_1, \dots, c_n$.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PolynomialShape {
    degree: usize,
}

impl PolynomialShape {
    pub fn new(degree: usize) -> Self {
        Self { degree }
    }

    pub fn degree(&self) -> usize {
        self.degree
    }
}

impl ShapeTrait for PolynomialShape {
    fn name(&self) -> &str {
        "polynomial"
    }

    fn npars(&self) -> usize {
        self.degree
    }

    fn eval(&self, x: f64, pars: &[f64]) -> f64 {
        // Horner scheme over c_n, ..., c_1, 1
        pars.iter()
            .rev()
            .fold(0.0, |acc, &c| (acc + c) * x)
            + 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use approx::assert_relative_eq;

    #[test]
    fn quadratic() {
        let shape = PolynomialShape::new(2);
        // 1 + 2x - 0.5x^2
        assert_relative_eq!(shape.eval(3.0, &[2.0, -0.5]), 1.0 + 6.0 - 4.5);
        assert_relative_eq!(shape.eval(0.0, &[2.0, -0.5]), 1.0);
    }

    #[test]
    fn degree_zero_is_flat() {
        let shape = PolynomialShape::new(0);
        assert_eq!(shape.npars(), 0);
        assert_eq!(shape.eval(42.0, &[]), 1.0);
    }
}
