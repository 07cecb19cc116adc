//! Numeric conversion helpers centralizing safe numeric casts.

use num_traits::cast::cast;

/// Multiply an unsigned quantity by a factor and floor the result.
///
/// Negative or non-finite products collapse to zero; overflow saturates.
#[must_use]
pub fn floor_scale(value: u32, factor: f64) -> u32 {
    let product = f64::from(value) * factor;
    if !product.is_finite() || product <= 0.0 {
        return 0;
    }
    let max = f64::from(u32::MAX);
    cast::<f64, u32>(product.min(max).floor()).unwrap_or(u32::MAX)
}

/// Raise `base` to `exponent` and multiply `value` by it, flooring the result.
#[must_use]
pub fn floor_scale_pow(value: u32, base: f64, exponent: u8) -> u32 {
    floor_scale(value, base.powi(i32::from(exponent)))
}

/// Share of `part` in `whole`, returning 0.0 for an empty whole.
#[must_use]
pub fn ratio(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        return 0.0;
    }
    let part = cast::<usize, f64>(part).unwrap_or(0.0);
    let whole = cast::<usize, f64>(whole).unwrap_or(f64::MAX);
    part / whole
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floor_scale_rounds_down() {
        assert_eq!(floor_scale(120, 0.7), 84);
        assert_eq!(floor_scale(120, 0.8), 96);
        assert_eq!(floor_scale(75, 0.5), 37);
        assert_eq!(floor_scale(0, 0.9), 0);
    }

    #[test]
    fn floor_scale_handles_degenerate_factors() {
        assert_eq!(floor_scale(10, f64::NAN), 0);
        assert_eq!(floor_scale(10, -1.0), 0);
        assert_eq!(floor_scale(u32::MAX, 2.0), u32::MAX);
    }

    #[test]
    fn floor_scale_pow_matches_upgrade_curve() {
        assert_eq!(floor_scale_pow(100, 1.5, 0), 100);
        assert_eq!(floor_scale_pow(100, 1.5, 1), 150);
        assert_eq!(floor_scale_pow(25, 1.5, 2), 56);
    }

    #[test]
    fn ratio_handles_empty_whole() {
        assert!((ratio(7, 10) - 0.7).abs() < f64::EPSILON);
        assert!(ratio(3, 0).abs() < f64::EPSILON);
    }
}
