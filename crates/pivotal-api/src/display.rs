use num::rational::Rational64;

/// Largest denominator still shown as a fraction.
const MAX_DENOMINATOR: i64 = 1000;

/// Format a tableau cell as a short fraction (`3/2`, `-7`, `0`) when one represents it
/// exactly, otherwise as a decimal with at most four places.
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return value.to_string();
    }
    if value.abs() < 1e-9 {
        return "0".to_string();
    }

    match small_fraction(value) {
        Some(ratio) => ratio.to_string(),
        None => format_decimal(value),
    }
}

/// The fraction with the smallest denominator up to [`MAX_DENOMINATOR`] that equals `value`.
fn small_fraction(value: f64) -> Option<Rational64> {
    if value.abs() > 1e12 {
        return None;
    }
    (1..=MAX_DENOMINATOR).find_map(|d| {
        let scaled = value * d as f64;
        let numer = scaled.round();
        ((scaled - numer).abs() <= 1e-9 * scaled.abs().max(1.0)).then(|| Rational64::new(numer as i64, d))
    })
}

/// Decimal form with at most four places and no trailing zeros.
pub fn format_decimal(value: f64) -> String {
    let text = format!("{:.4}", value);
    let text = text.trim_end_matches('0').trim_end_matches('.');
    match text {
        "-0" | "" => "0".to_string(),
        _ => text.to_string(),
    }
}
