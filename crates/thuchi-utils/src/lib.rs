//! Formatting helpers for VND amounts

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};

/// Format a number with thousands separators
pub fn format_number<T: ToString>(n: T, separator: char) -> String {
    let s = n.to_string();
    let (sign, digits) = match s.strip_prefix('-') {
        Some(rest) => ("-", rest),
        None => ("", s.as_str()),
    };
    let mut result = String::new();
    let mut count = 0;
    for c in digits.chars().rev() {
        if count == 3 {
            result.push(separator);
            count = 0;
        }
        result.push(c);
        count += 1;
    }
    let grouped: String = result.chars().rev().collect();
    format!("{}{}", sign, grouped)
}

/// Whole-dong currency string, e.g. `1.234.567 ₫`
pub fn format_vnd(amount: Decimal) -> String {
    let rounded = amount.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero);
    format!("{} ₫", format_number(rounded.trunc(), '.'))
}

/// Compact label used in chart legends: `1.5 tỷ`, `2.3 triệu`, `450k`
pub fn format_short(amount: Decimal) -> String {
    let value = amount.to_f64().unwrap_or(0.0);
    if value >= 1_000_000_000.0 {
        format!("{:.1} tỷ", value / 1_000_000_000.0)
    } else if value >= 1_000_000.0 {
        format!("{:.1} triệu", value / 1_000_000.0)
    } else if value >= 1_000.0 {
        format!("{:.0}k", value / 1_000.0)
    } else {
        amount.normalize().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1234567, ','), "1,234,567");
        assert_eq!(format_number(999, '.'), "999");
        assert_eq!(format_number(-1500, '.'), "-1.500");
    }

    #[test]
    fn test_format_vnd() {
        assert_eq!(format_vnd(Decimal::from(1234567)), "1.234.567 ₫");
        assert_eq!(format_vnd(Decimal::from_str("999.6").unwrap()), "1.000 ₫");
        assert_eq!(format_vnd(Decimal::ZERO), "0 ₫");
    }

    #[test]
    fn test_format_short() {
        assert_eq!(format_short(Decimal::from(1_500_000_000u64)), "1.5 tỷ");
        assert_eq!(format_short(Decimal::from(2_300_000)), "2.3 triệu");
        assert_eq!(format_short(Decimal::from(450_000)), "450k");
        assert_eq!(format_short(Decimal::from(120)), "120");
    }
}
