//! Guards that keep infinities and NaNs out of computed tables.
//!
//! Every division in the engine goes through [`checked_div`], which tests the
//! denominator first; anything non-finite that still slips through is mapped
//! to `None` by [`finite`].

/// `Some(v)` if `v` is finite.
pub fn finite(v: f64) -> Option<f64> {
    if v.is_finite() { Some(v) } else { None }
}

/// `num / den`, or `None` when either side is missing, the denominator is zero,
/// or the quotient is not finite.
pub fn checked_div(num: Option<f64>, den: Option<f64>) -> Option<f64> {
    let (num, den) = (num?, den?);
    if den == 0.0 || !den.is_finite() || !num.is_finite() {
        return None;
    }
    finite(num / den)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_denominator_is_missing() {
        assert_eq!(checked_div(Some(1.0), Some(0.0)), None);
        assert_eq!(checked_div(Some(0.0), Some(0.0)), None);
        assert_eq!(checked_div(Some(1.0), Some(-0.0)), None);
    }

    #[test]
    fn missing_sides_propagate() {
        assert_eq!(checked_div(None, Some(2.0)), None);
        assert_eq!(checked_div(Some(2.0), None), None);
        assert_eq!(checked_div(Some(3.0), Some(2.0)), Some(1.5));
    }

    #[test]
    fn overflowing_quotient_is_missing() {
        assert_eq!(checked_div(Some(f64::MAX), Some(1e-300)), None);
        assert_eq!(finite(f64::NAN), None);
    }
}
