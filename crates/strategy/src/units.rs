//! Conversions between on-chain integers and human-readable values.
//!
//! Rate quotes carry 8 fractional digits of a percentage, so `300_000_000`
//! is 3%. Token amounts carry the token's decimals (6 for the stablecoin).

use std::str::FromStr;

use alloy_primitives::U256;
use rust_decimal::Decimal;

use crate::error::{Result, StrategyError};

/// Fractional digits of a rate quote.
pub const RATE_DECIMALS: u32 = 8;

/// Rate quote of exactly 1%.
pub const RATE_SCALE: u64 = 100_000_000;

/// Convert a rate quote to a percentage (e.g. `300_000_000` -> `3`).
pub fn rate_to_percent(rate: U256) -> Result<Decimal> {
    let out_of_range = || StrategyError::RateOutOfRange(rate.to_string());
    let raw = u128::try_from(rate).map_err(|_| out_of_range())?;
    let raw = i128::try_from(raw).map_err(|_| out_of_range())?;
    Decimal::try_from_i128_with_scale(raw, RATE_DECIMALS)
        .map(|d| d.normalize())
        .map_err(|_| out_of_range())
}

/// Convert a percentage to a rate quote (e.g. `2.5` -> `250_000_000`).
///
/// Fails for negative values and for more than 8 fractional digits.
pub fn percent_to_rate(percent: Decimal) -> Result<U256> {
    if percent.is_sign_negative() && !percent.is_zero() {
        return Err(StrategyError::InvalidRate(percent));
    }
    let scaled = percent
        .checked_mul(Decimal::from(RATE_SCALE))
        .ok_or(StrategyError::InvalidRate(percent))?
        .normalize();
    if scaled.scale() != 0 {
        return Err(StrategyError::InvalidRate(percent));
    }
    let raw = u128::try_from(scaled.mantissa().abs()).map_err(|_| StrategyError::InvalidRate(percent))?;
    Ok(U256::from(raw))
}

/// Parse a percentage string such as `"3"`, `"2.5"` or `"4.25%"`.
pub fn parse_percent(value: &str) -> Result<U256> {
    let trimmed = value.trim().trim_end_matches('%').trim();
    let percent =
        Decimal::from_str(trimmed).map_err(|_| StrategyError::InvalidAmount(value.to_string()))?;
    percent_to_rate(percent)
}

/// Parse a human-readable amount string to base units given decimals.
///
/// The conversion is exact: more fractional digits than `decimals` (other
/// than trailing zeros) is an error rather than a truncation.
pub fn parse_amount(amount: &str, decimals: u8) -> Result<U256> {
    let invalid = || StrategyError::InvalidAmount(amount.to_string());
    let trimmed = amount.trim();

    let (integer_part, fractional_part) = trimmed.split_once('.').unwrap_or((trimmed, ""));

    let is_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (integer_part.is_empty() && fractional_part.is_empty())
        || !is_digits(integer_part)
        || !is_digits(fractional_part)
    {
        return Err(invalid());
    }

    let fractional_part = fractional_part.trim_end_matches('0');
    if fractional_part.len() > decimals as usize {
        return Err(StrategyError::TooPrecise {
            value: amount.to_string(),
            decimals,
        });
    }

    let fractional_padded = format!("{:0<width$}", fractional_part, width = decimals as usize);
    let combined = format!("{}{}", integer_part, fractional_padded);
    let combined = combined.trim_start_matches('0');

    if combined.is_empty() {
        return Ok(U256::ZERO);
    }

    U256::from_str_radix(combined, 10).map_err(|_| invalid())
}

/// Format base units as a decimal string, dropping trailing zeros.
pub fn format_amount(amount: U256, decimals: u8) -> String {
    let digits = amount.to_string();
    let decimals = decimals as usize;
    if decimals == 0 {
        return digits;
    }

    let padded = format!("{:0>width$}", digits, width = decimals + 1);
    let (integer_part, fractional_part) = padded.split_at(padded.len() - decimals);
    let fractional_part = fractional_part.trim_end_matches('0');

    if fractional_part.is_empty() {
        integer_part.to_string()
    } else {
        format!("{}.{}", integer_part, fractional_part)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_rate_to_percent() {
        assert_eq!(rate_to_percent(U256::from(300_000_000u64)).unwrap(), dec!(3));
        assert_eq!(rate_to_percent(U256::from(250_000_000u64)).unwrap(), dec!(2.5));
        assert_eq!(rate_to_percent(U256::from(1u64)).unwrap(), dec!(0.00000001));
        assert_eq!(rate_to_percent(U256::ZERO).unwrap(), Decimal::ZERO);
    }

    #[test]
    fn test_rate_to_percent_out_of_range() {
        assert!(matches!(
            rate_to_percent(U256::MAX),
            Err(StrategyError::RateOutOfRange(_))
        ));
    }

    #[test]
    fn test_percent_to_rate() {
        assert_eq!(percent_to_rate(dec!(3)).unwrap(), U256::from(300_000_000u64));
        assert_eq!(percent_to_rate(dec!(4.25)).unwrap(), U256::from(425_000_000u64));
        assert_eq!(percent_to_rate(dec!(0)).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_percent_to_rate_rejects_bad_values() {
        assert_eq!(
            percent_to_rate(dec!(-1)),
            Err(StrategyError::InvalidRate(dec!(-1)))
        );
        assert!(percent_to_rate(dec!(0.000000001)).is_err());
    }

    #[test]
    fn test_parse_percent() {
        assert_eq!(parse_percent("5").unwrap(), U256::from(500_000_000u64));
        assert_eq!(parse_percent(" 2.5% ").unwrap(), U256::from(250_000_000u64));
        assert!(matches!(
            parse_percent("five"),
            Err(StrategyError::InvalidAmount(_))
        ));
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("10000", 6).unwrap(), U256::from(10_000_000_000u64));
        assert_eq!(parse_amount("1.5", 6).unwrap(), U256::from(1_500_000u64));
        assert_eq!(parse_amount("0.000001", 6).unwrap(), U256::from(1u64));
        assert_eq!(parse_amount(".5", 6).unwrap(), U256::from(500_000u64));
        assert_eq!(parse_amount("1.2500000", 6).unwrap(), U256::from(1_250_000u64));
        assert_eq!(parse_amount("0", 6).unwrap(), U256::ZERO);
    }

    #[test]
    fn test_parse_amount_rejects_garbage() {
        for input in ["", ".", "abc", "1.2.3", "-5", "1e6", "1,000"] {
            assert!(
                matches!(parse_amount(input, 6), Err(StrategyError::InvalidAmount(_))),
                "accepted {input:?}"
            );
        }
    }

    #[test]
    fn test_parse_amount_rejects_excess_precision() {
        assert_eq!(
            parse_amount("0.0000001", 6),
            Err(StrategyError::TooPrecise {
                value: "0.0000001".to_string(),
                decimals: 6,
            })
        );
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(U256::from(10_000_000_000u64), 6), "10000");
        assert_eq!(format_amount(U256::from(1_500_000u64), 6), "1.5");
        assert_eq!(format_amount(U256::from(1u64), 6), "0.000001");
        assert_eq!(format_amount(U256::ZERO, 6), "0");
        assert_eq!(format_amount(U256::from(42u64), 0), "42");
    }
}
