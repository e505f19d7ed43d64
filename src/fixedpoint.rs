//! Signed fixed-point numbers at 2^-64 resolution.
//!
//! The raw representation is an `i128` interpreted as a multiple of 2^-64.
//! Addition and subtraction are exact; multiplication and division truncate
//! toward zero. The rounding discipline is part of the protocol: conversions
//! from exact rationals must name `floor` or `ceil` at the call site, and
//! every controller equation selects `floor`.

use core::fmt;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

use crate::ratio::Ratio;

/// Number of fractional bits.
pub const SCALING_EXPONENT: u32 = 64;

/// 2^64 as the raw-unit scale.
pub const SCALING_FACTOR: i128 = 1i128 << SCALING_EXPONENT;

/// A signed fixed-point number scaled by 2^64.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct FixedPoint(i128);

/// Failure cases for [`FixedPoint::of_hex_string`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HexParseError {
    /// No digits at all.
    Empty,
    /// A character outside `[0-9a-fA-F]` (or a misplaced sign/point).
    BadDigit,
}

impl FixedPoint {
    pub const ZERO: FixedPoint = FixedPoint(0);
    pub const ONE: FixedPoint = FixedPoint(SCALING_FACTOR);

    /// Wrap a raw 2^-64-scaled value.
    #[inline]
    pub fn from_raw(raw: i128) -> FixedPoint {
        FixedPoint(raw)
    }

    /// The raw 2^-64-scaled value.
    #[inline]
    pub fn raw(self) -> i128 {
        self.0
    }

    /// Whole number as fixed-point.
    pub fn of_int(n: i64) -> FixedPoint {
        // i64::MIN * 2^64 == i128::MIN, still representable.
        FixedPoint((n as i128) << SCALING_EXPONENT)
    }

    /// Truncating multiplication: `(x * y) / 2^64`, rounded toward zero.
    /// The double-width product is taken in arbitrary precision so the
    /// intermediate cannot overflow.
    pub fn mul(self, other: FixedPoint) -> FixedPoint {
        let product = BigInt::from(self.0) * BigInt::from(other.0);
        FixedPoint(narrow(product / BigInt::from(SCALING_FACTOR)))
    }

    /// Truncating division: `(x * 2^64) / y`, rounded toward zero.
    /// Aborts on a zero divisor; the callers' preconditions make that a
    /// programming error, never a user error.
    pub fn div(self, other: FixedPoint) -> FixedPoint {
        assert!(other.0 != 0, "fixed-point division by zero");
        let widened = BigInt::from(self.0) * BigInt::from(SCALING_FACTOR);
        FixedPoint(narrow(widened / BigInt::from(other.0)))
    }

    /// Integer power: `pow(x, 0) = 1`, `pow(x, n) = x^n / 2^(64*(n-1))`
    /// for `n >= 1`, truncated toward zero.
    pub fn pow(self, n: u64) -> FixedPoint {
        if n == 0 {
            return FixedPoint::ONE;
        }
        let raw = num_traits::pow(BigInt::from(self.0), n as usize);
        let shift = BigInt::from(1u8) << (SCALING_EXPONENT as usize * (n as usize - 1));
        FixedPoint(narrow(raw / shift))
    }

    /// First-order Taylor approximation of the exponential: `exp(a) = 1 + a`.
    pub fn exp(self) -> FixedPoint {
        FixedPoint::ONE + self
    }

    /// Exact rational view: `raw / 2^64`.
    pub fn to_ratio(self) -> Ratio {
        Ratio::new(BigInt::from(self.0), BigInt::from(SCALING_FACTOR))
    }

    /// Largest fixed-point value not greater than `r`.
    pub fn of_ratio_floor(r: &Ratio) -> FixedPoint {
        FixedPoint(narrow(
            (r.numer() * BigInt::from(SCALING_FACTOR)).div_floor(r.denom()),
        ))
    }

    /// Smallest fixed-point value not less than `r`.
    pub fn of_ratio_ceil(r: &Ratio) -> FixedPoint {
        FixedPoint(narrow(
            (r.numer() * BigInt::from(SCALING_FACTOR)).div_ceil(r.denom()),
        ))
    }

    /// Parse `[-]HEX[.HEX]`. A fractional part of length `k` contributes its
    /// value divided by `16^k`, so any parsed string is represented exactly
    /// as long as `k <= 16`.
    pub fn of_hex_string(s: &str) -> Result<FixedPoint, HexParseError> {
        let (negative, body) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s),
        };
        let (int_part, frac_part) = match body.split_once('.') {
            Some((i, f)) => (i, f),
            None => (body, ""),
        };
        if int_part.is_empty() && frac_part.is_empty() {
            return Err(HexParseError::Empty);
        }
        let int = parse_hex_digits(int_part)?;
        let frac = parse_hex_digits(frac_part)?;
        let scale = BigInt::from(1u8) << (4 * frac_part.len());
        let magnitude = ((int * &scale + frac) << (SCALING_EXPONENT as usize)) / &scale;
        let raw = narrow(if negative { -magnitude } else { magnitude });
        Ok(FixedPoint(raw))
    }
}

/// Narrow an arbitrary-precision result back to the i128 representation.
/// Exceeding the representation is an invariant violation.
fn narrow(v: BigInt) -> i128 {
    v.to_i128().unwrap_or_else(|| {
        panic!("fixed-point overflow: |value| exceeds the i128 representation")
    })
}

fn parse_hex_digits(s: &str) -> Result<BigInt, HexParseError> {
    let mut acc = BigInt::from(0u8);
    for c in s.chars() {
        let d = c.to_digit(16).ok_or(HexParseError::BadDigit)?;
        acc = acc * 16u8 + d;
    }
    Ok(acc)
}

impl core::ops::Add for FixedPoint {
    type Output = FixedPoint;
    fn add(self, rhs: FixedPoint) -> FixedPoint {
        FixedPoint(self.0.checked_add(rhs.0).expect("fixed-point overflow in add"))
    }
}

impl core::ops::Sub for FixedPoint {
    type Output = FixedPoint;
    fn sub(self, rhs: FixedPoint) -> FixedPoint {
        FixedPoint(self.0.checked_sub(rhs.0).expect("fixed-point overflow in sub"))
    }
}

impl core::ops::Neg for FixedPoint {
    type Output = FixedPoint;
    fn neg(self) -> FixedPoint {
        FixedPoint(self.0.checked_neg().expect("fixed-point overflow in neg"))
    }
}

/// Serialised form: `[-]HEX.HEX` with exactly 16 fractional hex digits
/// (scaling_exponent / 4).
impl fmt::Display for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let magnitude = self.0.unsigned_abs();
        let int = magnitude >> SCALING_EXPONENT;
        let frac = magnitude & ((1u128 << SCALING_EXPONENT) - 1);
        if self.0 < 0 {
            write!(f, "-")?;
        }
        write!(f, "{:x}.{:016x}", int, frac)
    }
}

impl fmt::Debug for FixedPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FixedPoint({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ratio::ratio;

    #[test]
    fn add_sub_are_exact() {
        let a = FixedPoint::of_int(3);
        let b = FixedPoint::of_int(5);
        assert_eq!(a + b, FixedPoint::of_int(8));
        assert_eq!(a - b, FixedPoint::of_int(-2));
        assert_eq!(-(a - b), FixedPoint::of_int(2));
    }

    #[test]
    fn mul_truncates_toward_zero() {
        let half = FixedPoint::from_raw(SCALING_FACTOR / 2);
        // 3 raw units * 0.5 = 1.5 raw units, truncated to 1.
        assert_eq!(FixedPoint::from_raw(3).mul(half).raw(), 1);
        // Negative operand truncates toward zero, not toward -inf.
        assert_eq!(FixedPoint::from_raw(-3).mul(half).raw(), -1);
    }

    #[test]
    fn div_truncates_toward_zero() {
        let third = FixedPoint::of_int(3);
        assert_eq!(
            FixedPoint::from_raw(1).div(third).raw(),
            SCALING_FACTOR / 3
        );
        assert_eq!(
            FixedPoint::from_raw(-1).div(third).raw(),
            -(SCALING_FACTOR / 3)
        );
    }

    #[test]
    #[should_panic(expected = "division by zero")]
    fn div_by_zero_aborts() {
        let _ = FixedPoint::ONE.div(FixedPoint::ZERO);
    }

    #[test]
    fn pow_matches_contract() {
        let x = FixedPoint::from_raw(3 * (SCALING_FACTOR / 2)); // 1.5
        assert_eq!(x.pow(0), FixedPoint::ONE);
        assert_eq!(x.pow(1), x);
        // 1.5^3 = 3.375, exactly representable.
        assert_eq!(x.pow(3), FixedPoint::of_ratio_floor(&ratio(27, 8)));
        assert_eq!(FixedPoint::ZERO.pow(5), FixedPoint::ZERO);
    }

    #[test]
    fn exp_is_first_order() {
        let a = FixedPoint::of_ratio_floor(&ratio(1, 100));
        assert_eq!(a.exp(), FixedPoint::ONE + a);
        assert_eq!(FixedPoint::ZERO.exp(), FixedPoint::ONE);
    }

    #[test]
    fn ratio_conversions_floor_and_ceil() {
        let r = ratio(1, 3);
        let fl = FixedPoint::of_ratio_floor(&r);
        let ce = FixedPoint::of_ratio_ceil(&r);
        assert_eq!(ce.raw() - fl.raw(), 1);
        // Negative: floor goes down, ceil goes up.
        let n = ratio(-1, 3);
        assert_eq!(FixedPoint::of_ratio_floor(&n).raw(), -fl.raw() - 1);
        assert_eq!(FixedPoint::of_ratio_ceil(&n).raw(), -fl.raw());
        // Exact values convert without adjustment.
        assert_eq!(FixedPoint::of_ratio_floor(&ratio(5, 4)), FixedPoint::of_ratio_ceil(&ratio(5, 4)));
    }

    #[test]
    fn hex_string_parses_exactly() {
        assert_eq!(
            FixedPoint::of_hex_string("0.8").unwrap(),
            FixedPoint::from_raw(SCALING_FACTOR / 2)
        );
        assert_eq!(
            FixedPoint::of_hex_string("-1.8").unwrap(),
            FixedPoint::from_raw(-(SCALING_FACTOR + SCALING_FACTOR / 2))
        );
        assert_eq!(FixedPoint::of_hex_string("f").unwrap(), FixedPoint::of_int(15));
        assert_eq!(FixedPoint::of_hex_string(".4").unwrap(), FixedPoint::from_raw(SCALING_FACTOR / 4));
        assert_eq!(FixedPoint::of_hex_string(""), Err(HexParseError::Empty));
        assert_eq!(FixedPoint::of_hex_string("0.g"), Err(HexParseError::BadDigit));
        assert_eq!(FixedPoint::of_hex_string("1.2.3"), Err(HexParseError::BadDigit));
    }

    #[test]
    fn display_round_trips_through_hex() {
        for raw in [0i128, 1, -1, SCALING_FACTOR, -SCALING_FACTOR, 3 * SCALING_FACTOR / 2, -7] {
            let x = FixedPoint::from_raw(raw);
            let shown = x.to_string();
            assert_eq!(FixedPoint::of_hex_string(&shown).unwrap(), x, "{}", shown);
        }
        assert_eq!(FixedPoint::ONE.to_string(), "1.0000000000000000");
    }
}
