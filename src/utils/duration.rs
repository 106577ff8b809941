//! Duration parsing utilities.
//!
//! ns-3 serializes `Time` values as sign-prefixed, unit-suffixed strings
//! (e.g. "+1234.0ns", "+1.5e+09ns"). This module turns them into
//! nanoseconds.

/// Nanoseconds per unit, longest suffix first so "ns" is not read as "s".
const UNITS: [(&str, f64); 4] = [("ns", 1.0), ("us", 1e3), ("ms", 1e6), ("s", 1e9)];

/// Parse a signed duration string (e.g. "+1234ns", "-2.5us", "3s") to nanoseconds
///
/// Supported formats:
/// - Optional leading sign: "+" or "-"
/// - Units: "ns", "us", "ms", "s"
/// - Raw numbers without a unit are taken as nanoseconds
/// - Mantissa may use exponent notation: "+1.5e+09ns"
///
/// # Examples
/// ```
/// use occamy_analyzer::utils::duration::parse_duration_to_ns;
///
/// assert_eq!(parse_duration_to_ns("+1234ns"), Ok(1234.0));
/// assert_eq!(parse_duration_to_ns("+2.5us"), Ok(2500.0));
/// assert!(parse_duration_to_ns("abc").is_err());
/// ```
pub fn parse_duration_to_ns(duration: &str) -> Result<f64, String> {
    let trimmed = duration.trim();

    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'+') => (false, &trimmed[1..]),
        Some(b'-') => (true, &trimmed[1..]),
        _ => (false, trimmed),
    };

    let (number, scale) = split_unit(unsigned);
    // One sign only; the mantissa parse would accept a second one
    if number.is_empty() || number.starts_with(&['+', '-'][..]) {
        return Err(format!("Invalid duration format: {}", duration));
    }

    let magnitude: f64 = number
        .parse()
        .map_err(|_| format!("Invalid duration format: {}", duration))?;
    if !magnitude.is_finite() {
        return Err(format!("Invalid duration format: {}", duration));
    }

    let ns = magnitude * scale;
    Ok(if negative { -ns } else { ns })
}

/// Split the numeric part from its unit suffix, returning the unit's scale in ns
fn split_unit(value: &str) -> (&str, f64) {
    for (suffix, scale) in UNITS {
        if let Some(number) = value.strip_suffix(suffix) {
            return (number, scale);
        }
    }
    (value, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_duration_units() {
        assert_eq!(parse_duration_to_ns("+1234ns"), Ok(1234.0));
        assert_eq!(parse_duration_to_ns("+1234.0ns"), Ok(1234.0));
        assert_eq!(parse_duration_to_ns("1234"), Ok(1234.0));
        assert_eq!(parse_duration_to_ns("+80us"), Ok(80_000.0));
        assert_eq!(parse_duration_to_ns("3ms"), Ok(3_000_000.0));
        assert_eq!(parse_duration_to_ns("2s"), Ok(2e9));
        assert_eq!(parse_duration_to_ns("  +5ns  "), Ok(5.0));
    }

    #[test]
    fn test_parse_duration_exponent_and_sign() {
        assert_eq!(parse_duration_to_ns("+1.5e+09ns"), Ok(1.5e9));
        assert_eq!(parse_duration_to_ns("-250ns"), Ok(-250.0));
        assert_eq!(parse_duration_to_ns("+0ns"), Ok(0.0));
    }

    #[test]
    fn test_parse_duration_invalid() {
        assert!(parse_duration_to_ns("").is_err());
        assert!(parse_duration_to_ns("+").is_err());
        assert!(parse_duration_to_ns("ns").is_err());
        assert!(parse_duration_to_ns("+12xs").is_err());
        assert!(parse_duration_to_ns("+inf").is_err());
        assert!(parse_duration_to_ns("+NaNns").is_err());
    }

    #[test]
    fn test_parse_duration_rejects_double_sign() {
        assert!(parse_duration_to_ns("+-5ns").is_err());
        assert!(parse_duration_to_ns("-+5ns").is_err());
        assert!(parse_duration_to_ns("--5").is_err());
        assert_eq!(parse_duration_to_ns("-5ns"), Ok(-5.0));
    }
}
