//! Coercion of free-form numeric input.
//!
//! Form fields arrive as text. Anything that does not parse, is not finite, or
//! is negative becomes zero instead of an error.

/// Parses a price. Malformed or negative input yields `0.0`.
#[must_use]
pub fn coerce_price(raw: &str) -> f64 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value > 0.0 => value,
        _ => 0.0,
    }
}

/// Parses a stock count. Fractions are truncated; malformed or negative input
/// yields `0`.
#[must_use]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn coerce_stock(raw: &str) -> u32 {
    match raw.trim().parse::<f64>() {
        Ok(value) if value.is_finite() && value >= 1.0 => {
            if value >= f64::from(u32::MAX) {
                u32::MAX
            } else {
                value.trunc() as u32
            }
        }
        _ => 0,
    }
}

/// Clamps an already-numeric price to the non-negative range.
#[must_use]
pub fn sanitize_price(value: f64) -> f64 {
    if value.is_finite() && value > 0.0 {
        value
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::float_cmp)]
    use super::*;

    #[test]
    fn test_coerce_price() {
        assert_eq!(coerce_price("12.50"), 12.5);
        assert_eq!(coerce_price(" 7 "), 7.0);
        assert_eq!(coerce_price(""), 0.0);
        assert_eq!(coerce_price("abc"), 0.0);
        assert_eq!(coerce_price("-3"), 0.0);
        assert_eq!(coerce_price("NaN"), 0.0);
        assert_eq!(coerce_price("inf"), 0.0);
    }

    #[test]
    fn test_coerce_stock() {
        assert_eq!(coerce_stock("5"), 5);
        assert_eq!(coerce_stock("3.9"), 3);
        assert_eq!(coerce_stock("0.4"), 0);
        assert_eq!(coerce_stock("-2"), 0);
        assert_eq!(coerce_stock("lots"), 0);
        assert_eq!(coerce_stock("1e12"), u32::MAX);
    }

    #[test]
    fn test_sanitize_price() {
        assert_eq!(sanitize_price(-1.0), 0.0);
        assert_eq!(sanitize_price(f64::NAN), 0.0);
        assert_eq!(sanitize_price(4.25), 4.25);
    }
}
