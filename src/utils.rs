use crate::error::{ReclassificationError, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::cmp::Ordering;
use std::str::FromStr;

/// Parses a plain decimal amount (`1500`, `-200.75`, `1e3`). No thousands
/// separators are accepted; spreadsheets export raw numbers.
pub fn parse_amount(text: &str) -> Option<Decimal> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Canonical text form of a numeric code: no trailing zeros, no decimal
/// point for integral values.
pub fn decimal_key(value: Decimal) -> String {
    value.normalize().to_string()
}

/// Renders an amount with comma digit grouping (`1500` → `1,500`,
/// `-1234567.5` → `-1,234,567.50`). Integral values carry no decimals.
pub fn format_grouped(value: Decimal) -> String {
    let rounded = value.round_dp(2);
    let negative = rounded.is_sign_negative() && !rounded.is_zero();
    let abs = rounded.abs();

    let integral = abs.trunc();
    let fraction = abs - integral;

    let digits = integral.normalize().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&grouped);
    if !fraction.is_zero() {
        let cents = (fraction * Decimal::ONE_HUNDRED).trunc().normalize().to_string();
        out.push('.');
        if cents.len() < 2 {
            out.push('0');
        }
        out.push_str(&cents);
    }
    out
}

/// Output order of debtor codes. Numeric codes sort by value and come before
/// the rest, which sort as text. Equal values such as `"0101"` and `"101"`
/// fall back to text order so distinct codes never compare equal.
pub fn compare_codes(a: &str, b: &str) -> Ordering {
    match (parse_amount(a), parse_amount(b)) {
        (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => a.cmp(b),
    }
}

/// Parses a user-supplied cutoff date in the configured `chrono` format.
pub fn parse_cutoff_date(input: &str, format: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(input.trim(), format).map_err(|_| {
        ReclassificationError::DateFormat {
            input: input.to_string(),
            expected: format.to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_compare_codes() {
        let mut codes = vec!["B2", "10", "9", "A1", "0101", "101", "9.5"];
        codes.sort_by(|a, b| compare_codes(a, b));
        assert_eq!(codes, vec!["9", "9.5", "10", "0101", "101", "A1", "B2"]);
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1500"), Some(dec!(1500)));
        assert_eq!(parse_amount(" -200.75 "), Some(dec!(-200.75)));
        assert_eq!(parse_amount("1e3"), Some(dec!(1000)));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_decimal_key_drops_trailing_zeros() {
        assert_eq!(decimal_key(dec!(4135.00)), "4135");
        assert_eq!(decimal_key(dec!(13.50)), "13.5");
    }

    #[test]
    fn test_format_grouped() {
        assert_eq!(format_grouped(dec!(0)), "0");
        assert_eq!(format_grouped(dec!(999)), "999");
        assert_eq!(format_grouped(dec!(1500)), "1,500");
        assert_eq!(format_grouped(dec!(1234567)), "1,234,567");
        assert_eq!(format_grouped(dec!(1500.5)), "1,500.50");
        assert_eq!(format_grouped(dec!(-1234567.25)), "-1,234,567.25");
    }

    #[test]
    fn test_parse_cutoff_date() {
        let date = parse_cutoff_date("31/12/2024", "%d/%m/%Y").unwrap();
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 12, 31).unwrap());

        let err = parse_cutoff_date("2024-12-31", "%d/%m/%Y").unwrap_err();
        assert!(matches!(err, ReclassificationError::DateFormat { .. }));

        assert!(parse_cutoff_date("31/02/2024", "%d/%m/%Y").is_err());
    }
}
