//! Conversions between decimal strings and fixed-point token units.

use alloy_primitives::U256;
use haus_core::{HausError, HausResult};

/// Decimals of CELO and the Mento stables.
pub const TOKEN_DECIMALS: usize = 18;
/// Decimals of gwei relative to wei.
pub const GWEI_DECIMALS: usize = 9;

/// Parses a decimal string like `"1.25"` into base units. Digits past
/// `decimals` are truncated.
pub fn parse_units(amount: &str, decimals: usize) -> HausResult<U256> {
    let trimmed = amount.trim();
    let (whole, frac) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };
    if whole.is_empty() && frac.is_empty() {
        return Err(HausError::Validation(format!("'{amount}' is not a number")));
    }
    if !whole.bytes().all(|b| b.is_ascii_digit()) || !frac.bytes().all(|b| b.is_ascii_digit()) {
        return Err(HausError::Validation(format!(
            "'{amount}' is not a non-negative decimal number"
        )));
    }

    let frac: String = frac.chars().take(decimals).collect();
    let digits = format!("{whole}{frac:0<decimals$}");
    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::ZERO);
    }
    U256::from_str_radix(digits, 10)
        .map_err(|e| HausError::Validation(format!("'{amount}' is out of range: {e}")))
}

/// Formats base units as a decimal string without trailing zeros.
pub fn format_units(value: U256, decimals: usize) -> String {
    let digits = value.to_string();
    let padded = format!("{digits:0>width$}", width = decimals + 1);
    let (whole, frac) = padded.split_at(padded.len() - decimals);
    let frac = frac.trim_end_matches('0');
    if frac.is_empty() {
        whole.to_string()
    } else {
        format!("{whole}.{frac}")
    }
}

/// Lossy conversion for display and rate arithmetic.
pub fn to_f64(value: U256) -> f64 {
    value.to_string().parse::<f64>().unwrap_or(f64::MAX)
}

/// Parses a positive, finite amount as written by the agent.
pub fn parse_amount(raw: &str) -> HausResult<f64> {
    let amount: f64 = raw
        .trim()
        .parse()
        .map_err(|_| HausError::Validation(format!("'{raw}' is not a valid amount")))?;
    if !amount.is_finite() || amount <= 0.0 {
        return Err(HausError::Validation(format!(
            "amount must be a positive number, got '{raw}'"
        )));
    }
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_whole_and_fraction() {
        assert_eq!(
            parse_units("1.5", 18).unwrap(),
            U256::from(1_500_000_000_000_000_000u128)
        );
        assert_eq!(parse_units("100", 2).unwrap(), U256::from(10_000u64));
        assert_eq!(parse_units(".5", 1).unwrap(), U256::from(5u64));
        assert_eq!(parse_units("0.000", 18).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_truncates_excess_precision() {
        assert_eq!(parse_units("1.239", 2).unwrap(), U256::from(123u64));
    }

    #[test]
    fn test_parse_rejects_garbage() {
        assert!(parse_units("abc", 18).is_err());
        assert!(parse_units("-1", 18).is_err());
        assert!(parse_units("", 18).is_err());
        assert!(parse_units("1.2.3", 18).is_err());
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u128), 18), "1.5");
        assert_eq!(format_units(U256::from(5u64), 9), "0.000000005");
        assert_eq!(format_units(U256::from(2_000_000_000u64), 9), "2");
        assert_eq!(format_units(U256::ZERO, 18), "0");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount(" 2.5 ").unwrap(), 2.5);
        assert!(parse_amount("0").is_err());
        assert!(parse_amount("NaN").is_err());
        assert!(parse_amount("ten").is_err());
    }
}
