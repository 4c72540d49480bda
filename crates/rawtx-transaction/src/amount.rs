//! Decimal coin amounts.
//!
//! Amounts travel through the RPC surface as decimal coin values with up
//! to eight fractional digits and are held internally as integer base
//! units.

use serde_json::Value;

use crate::TransactionError;

/// Base units in one coin.
pub const COIN: u64 = 100_000_000;

/// Largest value any single amount may carry.
pub const MAX_MONEY: u64 = 21_000_000 * COIN;

/// Fractional digits of a coin value.
const DECIMALS: i64 = 8;

/// Mantissas must stay below 10^18.
const UPPER_BOUND: i64 = 1_000_000_000_000_000_000 - 1;

pub fn money_range(value: i64) -> bool {
    value >= 0 && value as u64 <= MAX_MONEY
}

/// Parse a decimal string such as `"0.5"`, `"12"` or `"1e-3"` into
/// base units.
///
/// The grammar is an optional `-`, either a single `0` or a non-zero
/// digit run, an optional `.` with at least one digit, and an optional
/// exponent. Values finer than 1e-8 or of magnitude 10^10 and above
/// are rejected. The result may be negative; range checking is left to
/// the caller.
pub fn parse_fixed_point(text: &str) -> Option<i64> {
    let bytes = text.as_bytes();
    let mut pos = 0;
    let mut mantissa: i64 = 0;
    let mut trailing_zeros: i64 = 0;
    let mut point_offset: i64 = 0;
    let mut exponent: i64 = 0;

    let negative = bytes.first() == Some(&b'-');
    if negative {
        pos += 1;
    }

    let is_digit = |pos: usize| bytes.get(pos).map_or(false, u8::is_ascii_digit);

    match bytes.get(pos) {
        Some(b'0') => pos += 1,
        Some(b'1'..=b'9') => {
            while is_digit(pos) {
                push_digit(bytes[pos], &mut mantissa, &mut trailing_zeros)?;
                pos += 1;
            }
        }
        _ => return None,
    }

    if bytes.get(pos) == Some(&b'.') {
        pos += 1;
        if !is_digit(pos) {
            return None;
        }
        while is_digit(pos) {
            push_digit(bytes[pos], &mut mantissa, &mut trailing_zeros)?;
            pos += 1;
            point_offset += 1;
        }
    }

    if matches!(bytes.get(pos), Some(b'e') | Some(b'E')) {
        pos += 1;
        let mut exponent_negative = false;
        match bytes.get(pos) {
            Some(b'+') => pos += 1,
            Some(b'-') => {
                exponent_negative = true;
                pos += 1;
            }
            _ => {}
        }
        if !is_digit(pos) {
            return None;
        }
        while is_digit(pos) {
            if exponent > UPPER_BOUND / 10 {
                return None;
            }
            exponent = exponent * 10 + i64::from(bytes[pos] - b'0');
            pos += 1;
        }
        if exponent_negative {
            exponent = -exponent;
        }
    }

    if pos != bytes.len() {
        return None;
    }

    let scale = exponent - point_offset + trailing_zeros + DECIMALS;
    if !(0..18).contains(&scale) {
        return None;
    }
    for _ in 0..scale {
        if mantissa > UPPER_BOUND / 10 {
            return None;
        }
        mantissa *= 10;
    }
    if mantissa > UPPER_BOUND {
        return None;
    }
    Some(if negative { -mantissa } else { mantissa })
}

/// Zeros are deferred so that `"1.10"` and `"1.1"` need the same headroom.
fn push_digit(ch: u8, mantissa: &mut i64, trailing_zeros: &mut i64) -> Option<()> {
    if ch == b'0' {
        *trailing_zeros += 1;
        return Some(());
    }
    for _ in 0..=*trailing_zeros {
        if *mantissa > UPPER_BOUND / 10 {
            return None;
        }
        *mantissa *= 10;
    }
    *mantissa += i64::from(ch - b'0');
    *trailing_zeros = 0;
    Some(())
}

/// Parse a decimal coin string into base units, enforcing the money range.
pub fn parse_amount(text: &str) -> Result<u64, TransactionError> {
    let value = parse_fixed_point(text).ok_or(TransactionError::InvalidAmount)?;
    if !money_range(value) {
        return Err(TransactionError::AmountOutOfRange);
    }
    Ok(value as u64)
}

/// Parse a JSON number or numeric string into base units.
pub fn amount_from_json(value: &Value) -> Result<u64, TransactionError> {
    match value {
        Value::Number(n) => parse_amount(&n.to_string()),
        Value::String(s) => parse_amount(s),
        _ => Err(TransactionError::InvalidAmount),
    }
}

/// Render base units as a coin value.
pub fn value_from_amount(amount: i64) -> f64 {
    amount as f64 / COIN as f64
}
