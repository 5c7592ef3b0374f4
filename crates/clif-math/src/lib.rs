#![warn(missing_docs)]

//! Math types for CLI slice files.
//!
//! Thin wrappers around nalgebra providing the point types used by the
//! decoder, plus the precision helpers every decoded value goes through:
//! raw-to-millimeter scaling, 3-decimal rounding, and fixed-precision
//! display formatting.

/// A point in the XY plane of a layer (mm).
pub type Point2 = nalgebra::Point2<f64>;

/// A point in 3D space (mm).
pub type Point3 = nalgebra::Point3<f64>;

/// Number of decimal places that the format guarantees for millimeter values.
pub const DECIMALS: u32 = 3;

/// Scale factor matching [`DECIMALS`].
const DECIMAL_SCALE: f64 = 1000.0;

/// Convert a raw encoded value to millimeters.
///
/// `units` is the header's mm-per-raw-unit factor. This is the only place a
/// raw value becomes a length; callers must not apply it twice.
#[inline]
pub fn to_mm(raw: f64, units: f64) -> f64 {
    raw * units
}

/// Round a value to `decimals` decimal places.
pub fn round_to(value: f64, decimals: u32) -> f64 {
    let scale = 10f64.powi(decimals as i32);
    (value * scale).round() / scale
}

/// Round a millimeter value to the format's precision (3 decimals).
#[inline]
pub fn round3(value: f64) -> f64 {
    (value * DECIMAL_SCALE).round() / DECIMAL_SCALE
}

/// Integer key for a millimeter value at the format's precision.
///
/// Two values share a key exactly when they round to the same 3-decimal
/// number, so the key can be compared with `==` without float pitfalls.
#[inline]
pub fn precision_key(value: f64) -> i64 {
    (value * DECIMAL_SCALE).round() as i64
}

/// [`precision_key`], or `None` when the scaled value does not fit in `i64`.
///
/// Out-of-range values would saturate and share a key.
pub fn checked_precision_key(value: f64) -> Option<i64> {
    let scaled = (value * DECIMAL_SCALE).round();
    // i64::MAX as f64 is 2^63, one past the largest i64
    if scaled.is_finite() && scaled >= i64::MIN as f64 && scaled < i64::MAX as f64 {
        Some(scaled as i64)
    } else {
        None
    }
}

/// Format a value with the format's fixed precision, e.g. `12.500`.
pub fn format_fixed(value: f64) -> String {
    format_fixed_with(value, DECIMALS)
}

/// Format a value with `decimals` fixed decimal places.
pub fn format_fixed_with(value: f64, decimals: u32) -> String {
    // -0.000 reads badly in reports
    let rounded = round_to(value, decimals);
    let value = if rounded == 0.0 { 0.0 } else { rounded };
    format!("{:.*}", decimals as usize, value)
}

/// Check that `a` is strictly below `b` on every axis.
pub fn strictly_less(a: &Point3, b: &Point3) -> bool {
    a.x < b.x && a.y < b.y && a.z < b.z
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn test_to_mm() {
        assert_abs_diff_eq!(to_mm(1500.0, 0.001), 1.5, epsilon = 1e-12);
        assert_abs_diff_eq!(to_mm(5.0, 0.5), 2.5, epsilon = 1e-12);
        assert_eq!(to_mm(42.0, 1.0), 42.0);
    }

    #[test]
    fn test_round3() {
        assert_abs_diff_eq!(round3(1.23449), 1.234, epsilon = 1e-12);
        assert_abs_diff_eq!(round3(1.2346), 1.235, epsilon = 1e-12);
        assert_abs_diff_eq!(round3(-0.0004), 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_round_to() {
        assert_abs_diff_eq!(round_to(3.14159, 2), 3.14, epsilon = 1e-12);
        assert_abs_diff_eq!(round_to(3.14159, 0), 3.0, epsilon = 1e-12);
    }

    #[test]
    fn test_precision_key() {
        assert_eq!(precision_key(0.1), 100);
        assert_eq!(precision_key(0.1f32 as f64), 100);
        assert_eq!(precision_key(1.0001), precision_key(1.0003));
        assert_ne!(precision_key(1.0), precision_key(1.0006));
    }

    #[test]
    fn test_checked_precision_key() {
        assert_eq!(checked_precision_key(1.0004), Some(1000));
        assert_eq!(checked_precision_key(-2.5), Some(-2500));
        assert_eq!(checked_precision_key(1e12), Some(1_000_000_000_000_000));
        assert_eq!(checked_precision_key(1e20), None);
        assert_eq!(checked_precision_key(-1e20), None);
        assert_eq!(checked_precision_key(f64::NAN), None);
    }

    #[test]
    fn test_format_fixed() {
        assert_eq!(format_fixed(100.0), "100.000");
        assert_eq!(format_fixed(2.5), "2.500");
        assert_eq!(format_fixed(-0.0001), "0.000");
        assert_eq!(format_fixed_with(1.23456, 1), "1.2");
    }

    #[test]
    fn test_strictly_less() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 1.0, 1.0);
        assert!(strictly_less(&a, &b));
        assert!(!strictly_less(&b, &a));
        assert!(!strictly_less(&a, &Point3::new(1.0, 0.0, 1.0)));
    }
}
