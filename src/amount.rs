//! Decimal amount parsing and formatting
//!
//! User input is converted to a token's smallest unit with integer arithmetic
//! only, so the ledger sees exactly the value that was typed.

use crate::error::{Error, Result};

/// Parse a user-entered decimal string into raw token units.
///
/// Accepts `1,234.56`, `1234.56`, `.5` and `5.`. Rejects signs, scientific
/// notation, misplaced separators, more fractional digits than `decimals`,
/// zero, and anything above `u64::MAX`.
pub fn parse_to_raw_amount(text: &str, decimals: u8) -> Result<u64> {
    let text = text.trim();
    if text.is_empty() {
        return Err(invalid("amount is empty"));
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(invalid("amount has no digits"));
    }
    if !fraction.chars().all(|c| c.is_ascii_digit()) {
        return Err(invalid(format!("malformed fractional part in {:?}", text)));
    }
    if fraction.len() > decimals as usize {
        return Err(invalid(format!(
            "at most {} decimal places are supported",
            decimals
        )));
    }

    let whole_digits = strip_separators(whole)
        .ok_or_else(|| invalid(format!("malformed whole part in {:?}", text)))?;

    let scale = 10u128
        .checked_pow(decimals as u32)
        .ok_or_else(|| invalid(format!("unsupported decimal precision {}", decimals)))?;

    let whole_value = parse_digits(&whole_digits)?;
    let fraction_value = parse_digits(&format!("{:0<width$}", fraction, width = decimals as usize))?;

    let raw = whole_value
        .checked_mul(scale)
        .and_then(|v| v.checked_add(fraction_value))
        .ok_or_else(|| invalid("amount is too large"))?;

    if raw == 0 {
        return Err(invalid("amount must be greater than zero"));
    }

    u64::try_from(raw).map_err(|_| invalid("amount is too large"))
}

/// Format raw token units as a decimal string, trimming trailing zeros.
pub fn format_raw_amount(raw: u64, decimals: u8) -> String {
    if decimals == 0 {
        return raw.to_string();
    }

    let digits = format!("{:0>width$}", raw, width = decimals as usize + 1);
    let (whole, fraction) = digits.split_at(digits.len() - decimals as usize);
    let fraction = fraction.trim_end_matches('0');

    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// Remove thousands separators, checking that groups are well formed.
fn strip_separators(whole: &str) -> Option<String> {
    if !whole.contains(',') {
        return whole.chars().all(|c| c.is_ascii_digit()).then(|| whole.to_string());
    }

    let mut groups = whole.split(',');
    let first = groups.next()?;
    if first.is_empty() || first.len() > 3 || !first.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }

    let mut digits = first.to_string();
    for group in groups {
        if group.len() != 3 || !group.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        digits.push_str(group);
    }
    Some(digits)
}

fn parse_digits(digits: &str) -> Result<u128> {
    if digits.is_empty() {
        return Ok(0);
    }
    digits
        .parse::<u128>()
        .map_err(|_| invalid("amount is too large"))
}

fn invalid(reason: impl Into<String>) -> Error {
    Error::InvalidAmount(reason.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(parse_to_raw_amount("1", 9).unwrap(), 1_000_000_000);
        assert_eq!(parse_to_raw_amount("1.5", 6).unwrap(), 1_500_000);
        assert_eq!(parse_to_raw_amount("0.000001", 6).unwrap(), 1);
        assert_eq!(parse_to_raw_amount(".5", 2).unwrap(), 50);
        assert_eq!(parse_to_raw_amount("5.", 2).unwrap(), 500);
        assert_eq!(parse_to_raw_amount("  42 ", 0).unwrap(), 42);
    }

    #[test]
    fn test_parse_thousands_separators() {
        assert_eq!(parse_to_raw_amount("1,234.5", 2).unwrap(), 123_450);
        assert_eq!(parse_to_raw_amount("12,345,678", 0).unwrap(), 12_345_678);
        assert!(parse_to_raw_amount("1,23", 2).is_err());
        assert!(parse_to_raw_amount(",123", 2).is_err());
        assert!(parse_to_raw_amount("1234,567", 2).is_err());
        assert!(parse_to_raw_amount("1.2,3", 2).is_err());
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in ["", "   ", ".", "-1", "+1", "1e5", "1..2", "1.2.3", "abc", "0x10"] {
            let err = parse_to_raw_amount(input, 9).unwrap_err();
            assert!(matches!(err, Error::InvalidAmount(_)), "{input:?} -> {err:?}");
        }
    }

    #[test]
    fn test_parse_rejects_excess_precision() {
        assert!(matches!(
            parse_to_raw_amount("0.1234567", 6),
            Err(Error::InvalidAmount(_))
        ));
        assert!(matches!(
            parse_to_raw_amount("1.5", 0),
            Err(Error::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_rejects_zero_and_overflow() {
        assert!(parse_to_raw_amount("0", 9).is_err());
        assert!(parse_to_raw_amount("0.000", 3).is_err());
        assert_eq!(
            parse_to_raw_amount("18446744073709551615", 0).unwrap(),
            u64::MAX
        );
        assert!(parse_to_raw_amount("18446744073709551616", 0).is_err());
        assert!(parse_to_raw_amount("18446744074", 9).is_err());
        assert!(parse_to_raw_amount("999999999999999999999999999999999999999999", 0).is_err());
    }

    #[test]
    fn test_format_raw_amount() {
        assert_eq!(format_raw_amount(1_500_000, 6), "1.5");
        assert_eq!(format_raw_amount(1, 6), "0.000001");
        assert_eq!(format_raw_amount(1_000_000_000, 9), "1");
        assert_eq!(format_raw_amount(42, 0), "42");
        assert_eq!(format_raw_amount(u64::MAX, 9), "18446744073.709551615");
    }

    #[test]
    fn test_round_trip() {
        let cases = [
            ("1.5", 6),
            ("0.000001", 6),
            ("1234567.891", 9),
            ("18446744073.709551615", 9),
            ("7", 0),
            ("0.1", 1),
        ];
        for (text, decimals) in cases {
            let raw = parse_to_raw_amount(text, decimals).unwrap();
            assert_eq!(format_raw_amount(raw, decimals), text);
            assert_eq!(parse_to_raw_amount(&format_raw_amount(raw, decimals), decimals).unwrap(), raw);
        }
    }
}
