pub(super) fn within_bounds(x: &[f64], bounds: &[(f64, f64)]) -> bool {
    x.iter()
        .zip(bounds.iter())
        .all(|(&x, &(lower, upper))| x >= lower && x <= upper)
}

pub(super) fn clamp_to_bounds(x: &[f64], bounds: &[(f64, f64)]) -> Vec<f64> {
    x.iter()
        .zip(bounds.iter())
        .map(|(&x, &(lower, upper))| x.max(lower).min(upper))
        .collect()
}

/// Sum of squared distances of `x` to the box
pub(super) fn bounds_violation(x: &[f64], bounds: &[(f64, f64)]) -> f64 {
    x.iter()
        .zip(bounds.iter())
        .map(|(&x, &(lower, upper))| {
            let excess = if x < lower {
                lower - x
            } else if x > upper {
                x - upper
            } else {
                0.0
            };
            excess * excess
        })
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamp_and_violation() {
        let bounds = [(0.0, 1.0), (f64::NEG_INFINITY, f64::INFINITY)];
        assert!(within_bounds(&[0.5, -1e300], &bounds));
        assert!(!within_bounds(&[1.5, 0.0], &bounds));
        assert_eq!(clamp_to_bounds(&[1.5, 7.0], &bounds), vec![1.0, 7.0]);
        assert_eq!(clamp_to_bounds(&[-2.0, 7.0], &bounds), vec![0.0, 7.0]);
        assert_eq!(bounds_violation(&[-2.0, 7.0], &bounds), 4.0);
        assert_eq!(bounds_violation(&[0.25, 7.0], &bounds), 0.0);
    }
}
