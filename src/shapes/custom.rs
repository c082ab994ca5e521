use crate::shapes::shape::*;

use std::rc::Rc;

type ShapeFn = dyn Fn(f64, &[f64]) -> f64;

/// User-supplied kernel
#[derive(Clone)]
pub struct CustomShape {
    name: String,
    npars: usize,
    func: Rc<ShapeFn>,
}

impl CustomShape {
    pub fn new<F>(name: impl Into<String>, npars: usize, func: F) -> Self
    where
        F: Fn(f64, &[f64]) -> f64 + 'static,
    {
        Self {
            name: name.into(),
            npars,
            func: Rc::new(func),
        }
    }
}

impl Debug for CustomShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomShape")
            .field("name", &self.name)
            .field("npars", &self.npars)
            .finish_non_exhaustive()
    }
}

impl ShapeTrait for CustomShape {
    fn name(&self) -> &str {
        &self.name
    }

    fn npars(&self) -> usize {
        self.npars
    }

    #[inline]
    fn eval(&self, x: f64, pars: &[f64]) -> f64 {
        (self.func)(x, pars)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shapes::Shape;

    #[test]
    fn closure_is_called() {
        let shape = Shape::custom("line", 2, |x, p| p[0] + p[1] * x);
        assert_eq!(shape.name(), "line");
        assert_eq!(shape.npars(), 2);
        assert_eq!(shape.eval(2.0, &[1.0, 3.0]), 7.0);
        assert!(format!("{shape:?}").contains("line"));
    }
}
