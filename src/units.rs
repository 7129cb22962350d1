//! Unit conversion between wall-clock durations, block counts and STX amounts.
//!
//! # Design Decisions
//! - Stacks produces roughly one block every ten minutes, so a day is a
//!   fixed 144 blocks
//! - Day/block conversion is lossy: `blocks_to_days` rounds to one decimal,
//!   callers must not expect exact round trips
//! - STX amounts are parsed from decimal strings, never through floats

use thiserror::Error;

/// Blocks produced per hour.
pub const BLOCKS_PER_HOUR: u64 = 6;

/// Blocks produced per day.
pub const BLOCKS_PER_DAY: u64 = BLOCKS_PER_HOUR * 24;

/// Micro-STX in one STX.
pub const MICRO_STX_PER_STX: u64 = 1_000_000;

const STX_DECIMALS: usize = 6;

/// Convert a day count into a block count: `floor(days * 144)`.
///
/// Negative and non-finite input maps to zero blocks.
pub fn days_to_blocks(days: f64) -> u64 {
    if !days.is_finite() || days <= 0.0 {
        return 0;
    }
    (days * BLOCKS_PER_DAY as f64).floor() as u64
}

/// Convert a block count into days, rounded to one decimal place.
pub fn blocks_to_days(blocks: u64) -> f64 {
    ((blocks as f64 / BLOCKS_PER_DAY as f64) * 10.0).round() / 10.0
}

/// Errors produced when parsing a user-entered STX amount.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("amount is empty")]
    Empty,

    #[error("amount '{0}' is not a number")]
    NotNumeric(String),

    #[error("amount has more than 6 decimal places")]
    TooPrecise,

    #[error("amount is too large")]
    Overflow,
}

/// Parse a decimal STX amount (e.g. `"1.5"`) into micro-STX.
pub fn stx_to_micro(input: &str) -> Result<u64, AmountError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match trimmed.split_once('.') {
        Some((w, f)) => (w, f),
        None => (trimmed, ""),
    };

    let is_digits = |s: &str| s.chars().all(|c| c.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !is_digits(whole) || !is_digits(fraction) {
        return Err(AmountError::NotNumeric(trimmed.to_string()));
    }
    if fraction.len() > STX_DECIMALS {
        return Err(AmountError::TooPrecise);
    }

    let whole: u64 = if whole.is_empty() {
        0
    } else {
        whole.parse().map_err(|_| AmountError::Overflow)?
    };
    let fraction: u64 = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{:0<width$}", fraction, width = STX_DECIMALS);
        padded.parse().map_err(|_| AmountError::NotNumeric(trimmed.to_string()))?
    };

    whole
        .checked_mul(MICRO_STX_PER_STX)
        .and_then(|micro| micro.checked_add(fraction))
        .ok_or(AmountError::Overflow)
}

/// Format micro-STX as a decimal STX string without trailing zeros.
pub fn micro_to_stx_string(micro: u64) -> String {
    let whole = micro / MICRO_STX_PER_STX;
    let fraction = micro % MICRO_STX_PER_STX;
    if fraction == 0 {
        return whole.to_string();
    }
    let fraction = format!("{:06}", fraction);
    format!("{}.{}", whole, fraction.trim_end_matches('0'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_days_to_blocks_known_values() {
        assert_eq!(days_to_blocks(365.0), 52_560);
        assert_eq!(days_to_blocks(30.0), 4_320);
        assert_eq!(days_to_blocks(7.0), 1_008);
        assert_eq!(days_to_blocks(0.0), 0);
    }

    #[test]
    fn test_days_to_blocks_floors_fractions() {
        // 0.5 days = 72 blocks exactly, 0.01 days = 1.44 blocks
        assert_eq!(days_to_blocks(0.5), 72);
        assert_eq!(days_to_blocks(0.01), 1);
        assert_eq!(days_to_blocks(-3.0), 0);
        assert_eq!(days_to_blocks(f64::NAN), 0);
    }

    #[test]
    fn test_days_to_blocks_matches_floor_formula() {
        for days in 0..=3650u32 {
            let expected = (days as f64 * 144.0).floor() as u64;
            assert_eq!(days_to_blocks(days as f64), expected);
        }
    }

    #[test]
    fn test_blocks_to_days() {
        assert_eq!(blocks_to_days(52_560), 365.0);
        assert_eq!(blocks_to_days(4_320), 30.0);
        assert_eq!(blocks_to_days(100), 0.7);
        assert_eq!(blocks_to_days(0), 0.0);
    }

    #[test]
    fn test_round_trip_is_within_tolerance() {
        for blocks in [1u64, 77, 143, 1_000, 4_321, 99_999] {
            let days = blocks_to_days(blocks);
            let back = days_to_blocks(days);
            // One decimal of a day is 14.4 blocks
            assert!((back as i64 - blocks as i64).abs() <= 15, "blocks={blocks} back={back}");
        }
    }

    #[test]
    fn test_stx_to_micro() {
        assert_eq!(stx_to_micro("1"), Ok(1_000_000));
        assert_eq!(stx_to_micro("1.5"), Ok(1_500_000));
        assert_eq!(stx_to_micro(" 0.000001 "), Ok(1));
        assert_eq!(stx_to_micro(".25"), Ok(250_000));
        assert_eq!(stx_to_micro("10."), Ok(10_000_000));
    }

    #[test]
    fn test_stx_to_micro_rejects_bad_input() {
        assert_eq!(stx_to_micro(""), Err(AmountError::Empty));
        assert!(matches!(stx_to_micro("abc"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(stx_to_micro("-1"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(stx_to_micro("1.2.3"), Err(AmountError::NotNumeric(_))));
        assert!(matches!(stx_to_micro("."), Err(AmountError::NotNumeric(_))));
        assert_eq!(stx_to_micro("0.0000001"), Err(AmountError::TooPrecise));
        assert_eq!(stx_to_micro("99999999999999999999"), Err(AmountError::Overflow));
    }

    #[test]
    fn test_micro_to_stx_string() {
        assert_eq!(micro_to_stx_string(1_000_000), "1");
        assert_eq!(micro_to_stx_string(1_500_000), "1.5");
        assert_eq!(micro_to_stx_string(1), "0.000001");
    }
}
