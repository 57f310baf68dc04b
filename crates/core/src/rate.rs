//! Tokens-per-day to per-second flow rate conversion
//!
//! The daily amount is scaled to smallest units first, exactly, and only
//! then divided by [`SECONDS_PER_DAY`], truncating toward zero. All
//! arithmetic is 256-bit integer; no floating point is involved.

use std::fmt;

use alloy_primitives::U256;
use serde::{Deserialize, Serialize};

use crate::{FlowError, Result};

pub const SECONDS_PER_DAY: u64 = 86_400;

/// Decimal precision of super tokens
pub const DEFAULT_TOKEN_DECIMALS: u8 = 18;

/// Largest rate representable as a positive `int96`
pub const MAX_FLOW_RATE: u128 = (1u128 << 95) - 1;

/// Smallest token units streamed per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct FlowRate(u128);

impl FlowRate {
    pub const ZERO: FlowRate = FlowRate(0);

    pub fn from_raw(per_second: u128) -> Result<Self> {
        if per_second > MAX_FLOW_RATE {
            return Err(FlowError::InvalidInput(
                "flow rate exceeds the on-chain int96 range".to_string(),
            ));
        }
        Ok(Self(per_second))
    }

    pub fn per_second(&self) -> u128 {
        self.0
    }

    /// Amount streamed over one day at this rate, rendered in display units.
    ///
    /// Truncation during conversion means this can be slightly below the
    /// figure that was entered.
    pub fn tokens_per_day(&self, decimals: u8) -> String {
        let per_day = U256::from(self.0) * U256::from(SECONDS_PER_DAY);
        format_units(per_day, decimals)
    }
}

impl fmt::Display for FlowRate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Convert tokens-per-day for an 18-decimal token.
pub fn convert(tokens_per_day: &str) -> Result<FlowRate> {
    tokens_per_day_to_flow_rate(tokens_per_day, DEFAULT_TOKEN_DECIMALS)
}

/// Convert a decimal tokens-per-day figure into a per-second flow rate.
pub fn tokens_per_day_to_flow_rate(tokens_per_day: &str, decimals: u8) -> Result<FlowRate> {
    let per_day = parse_units(tokens_per_day, decimals)?;
    let per_second = per_day / U256::from(SECONDS_PER_DAY);
    FlowRate::from_raw(per_second.saturating_to::<u128>())
}

/// Parse a non-negative decimal string into smallest units.
pub fn parse_units(text: &str, decimals: u8) -> Result<U256> {
    let text = text.trim();
    if text.is_empty() {
        return Err(FlowError::InvalidInput("amount is empty".to_string()));
    }
    if text.starts_with('-') {
        return Err(FlowError::InvalidInput(format!("amount '{}' is negative", text)));
    }

    let (whole, frac) = text.split_once('.').unwrap_or((text, ""));
    let digits_only = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if !digits_only(whole) || !digits_only(frac) || (whole.is_empty() && frac.is_empty()) {
        return Err(FlowError::InvalidInput(format!("amount '{}' is not a decimal number", text)));
    }
    if frac.len() > decimals as usize {
        return Err(FlowError::InvalidInput(format!(
            "amount '{}' has more than {} decimal places",
            text, decimals
        )));
    }

    let too_large = || FlowError::InvalidInput(format!("amount '{}' is too large", text));
    let scale = U256::from(10u8)
        .checked_pow(U256::from(decimals))
        .ok_or_else(too_large)?;

    let whole = if whole.is_empty() {
        U256::ZERO
    } else {
        U256::from_str_radix(whole, 10).map_err(|_| too_large())?
    };
    let frac = if frac.is_empty() {
        U256::ZERO
    } else {
        let padded = format!("{:0<width$}", frac, width = decimals as usize);
        U256::from_str_radix(&padded, 10).map_err(|_| too_large())?
    };

    whole
        .checked_mul(scale)
        .and_then(|v| v.checked_add(frac))
        .ok_or_else(too_large)
}

/// Render smallest units as a decimal display amount.
pub fn format_units(amount: U256, decimals: u8) -> String {
    let scale = U256::from(10u8).pow(U256::from(decimals));
    let whole = amount / scale;
    let frac = amount % scale;
    if frac.is_zero() {
        return format!("{}.0", whole);
    }
    let frac = format!("{:0>width$}", frac.to_string(), width = decimals as usize);
    format!("{}.{}", whole, frac.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_token_per_day() {
        assert_eq!(convert("1.0").unwrap().per_second(), 11_574_074_074_074);
        assert_eq!(convert("1").unwrap().per_second(), 11_574_074_074_074);
    }

    #[test]
    fn test_zero() {
        assert_eq!(convert("0").unwrap(), FlowRate::ZERO);
        assert_eq!(convert("0.0").unwrap(), FlowRate::ZERO);
    }

    #[test]
    fn test_scales_before_dividing() {
        // 1 smallest unit per day truncates to zero; dividing first would too,
        // but 86_400 smallest units per day must give exactly 1.
        assert_eq!(convert("0.000000000000000001").unwrap().per_second(), 0);
        assert_eq!(convert("0.0000000000000864").unwrap().per_second(), 1);
    }

    #[test]
    fn test_matches_floor_formula() {
        for (input, scaled) in [
            ("1.5", 1_500_000_000_000_000_000u128),
            ("0.000001", 1_000_000_000_000u128),
            ("123.456789", 123_456_789_000_000_000_000u128),
            (".5", 500_000_000_000_000_000u128),
            ("2.", 2_000_000_000_000_000_000u128),
        ] {
            assert_eq!(convert(input).unwrap().per_second(), scaled / 86_400, "input {}", input);
        }
    }

    #[test]
    fn test_full_precision_fraction() {
        let rate = convert("0.123456789012345678").unwrap();
        assert_eq!(rate.per_second(), 123_456_789_012_345_678u128 / 86_400);
    }

    #[test]
    fn test_too_many_decimals_rejected() {
        let err = convert("0.1234567890123456789").unwrap_err();
        assert!(err.is_format());
    }

    #[test]
    fn test_negative_rejected() {
        assert!(convert("-1").unwrap_err().is_format());
        assert!(convert("-0.5").unwrap_err().is_format());
    }

    #[test]
    fn test_non_numeric_rejected() {
        for input in ["", "  ", "abc", "1e18", "1.2.3", ".", "+1", "1,5", "NaN", "inf"] {
            assert!(convert(input).unwrap_err().is_format(), "input {:?}", input);
        }
    }

    #[test]
    fn test_deterministic() {
        assert_eq!(convert("42.42").unwrap(), convert("42.42").unwrap());
    }

    #[test]
    fn test_int96_bound() {
        // 2^95 - 1 per second is ~3.4e15 tokens per day
        assert!(convert("1000000000000").is_ok());
        assert!(convert("100000000000000000000").unwrap_err().is_format());
        // beyond u128 after scaling
        assert!(convert("10000000000000000000000000000000000000000").unwrap_err().is_format());
    }

    #[test]
    fn test_custom_decimals() {
        let rate = tokens_per_day_to_flow_rate("864", 6).unwrap();
        assert_eq!(rate.per_second(), 10_000);
        assert!(tokens_per_day_to_flow_rate("0.0000001", 6).is_err());
    }

    #[test]
    fn test_tokens_per_day_projection() {
        let rate = convert("1").unwrap();
        assert_eq!(rate.tokens_per_day(18), "0.9999999999999936");
        assert_eq!(FlowRate::ZERO.tokens_per_day(18), "0.0");
    }

    #[test]
    fn test_format_units() {
        assert_eq!(format_units(U256::from(1_500_000_000_000_000_000u128), 18), "1.5");
        assert_eq!(format_units(U256::from(1u8), 18), "0.000000000000000001");
        assert_eq!(format_units(U256::from(10_000_000u64), 6), "10.0");
    }

    #[test]
    fn test_from_raw_bound() {
        assert!(FlowRate::from_raw(MAX_FLOW_RATE).is_ok());
        assert!(FlowRate::from_raw(MAX_FLOW_RATE + 1).is_err());
    }
}
