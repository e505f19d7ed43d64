//! Kit: the synthetic token minted against burrow collateral. Shares the
//! 2^-64 scaling of [`Tez`](crate::Tez) but is a distinct nominal type;
//! there is deliberately no conversion between the two.

use core::fmt;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

use crate::fixedpoint::{SCALING_EXPONENT, SCALING_FACTOR};
use crate::ratio::{ratio, Ratio};

/// A non-negative amount of kit, scaled by 2^64.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Kit(i128);

impl Kit {
    pub const ZERO: Kit = Kit(0);

    /// Whole kit.
    pub fn of_kit(n: u64) -> Kit {
        Kit((n as i128) << SCALING_EXPONENT)
    }

    /// Micro-kit: `n / 10^6` kit, floored to the 2^-64 scale.
    pub fn of_mukit(n: u64) -> Kit {
        Kit::of_ratio_floor(&ratio(n as i128, 1_000_000))
    }

    /// Wrap a raw 2^-64-scaled amount. Negative amounts violate the
    /// monetary invariant and abort.
    pub fn from_raw(raw: i128) -> Kit {
        assert!(raw >= 0, "kit amounts are non-negative");
        Kit(raw)
    }

    #[inline]
    pub fn raw(self) -> i128 {
        self.0
    }

    #[inline]
    pub fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Exact rational view: `raw / 2^64`.
    pub fn to_ratio(self) -> Ratio {
        Ratio::new(BigInt::from(self.0), BigInt::from(SCALING_FACTOR))
    }

    /// Largest representable amount not greater than `r`.
    pub fn of_ratio_floor(r: &Ratio) -> Kit {
        Kit::from_raw(narrow((r.numer() * BigInt::from(SCALING_FACTOR)).div_floor(r.denom())))
    }

    /// Smallest representable amount not less than `r`.
    pub fn of_ratio_ceil(r: &Ratio) -> Kit {
        Kit::from_raw(narrow((r.numer() * BigInt::from(SCALING_FACTOR)).div_ceil(r.denom())))
    }
}

fn narrow(v: BigInt) -> i128 {
    v.to_i128()
        .unwrap_or_else(|| panic!("kit overflow: value exceeds the i128 representation"))
}

impl core::ops::Add for Kit {
    type Output = Kit;
    fn add(self, rhs: Kit) -> Kit {
        Kit(self.0.checked_add(rhs.0).expect("kit overflow in add"))
    }
}

impl core::ops::Sub for Kit {
    type Output = Kit;
    fn sub(self, rhs: Kit) -> Kit {
        assert!(self.0 >= rhs.0, "kit subtraction underflow");
        Kit(self.0 - rhs.0)
    }
}

impl fmt::Display for Kit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0 as u128;
        let int = m >> SCALING_EXPONENT;
        let frac = ((m & ((1u128 << SCALING_EXPONENT) - 1)) * 1_000_000) >> SCALING_EXPONENT;
        write!(f, "{}.{:06}", int, frac)
    }
}

impl fmt::Debug for Kit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Kit({})", self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mukit_scales_exactly_at_whole_kit() {
        assert_eq!(Kit::of_mukit(1_000_000), Kit::of_kit(1));
        assert_eq!(Kit::of_mukit(500_000).raw(), SCALING_FACTOR / 2);
        assert_eq!(Kit::of_mukit(0), Kit::ZERO);
    }

    #[test]
    fn arithmetic() {
        let a = Kit::of_kit(10);
        let b = Kit::of_mukit(250_000);
        assert_eq!((a + b) - b, a);
        assert!(b < a);
    }

    #[test]
    #[should_panic(expected = "non-negative")]
    fn negative_amounts_are_rejected() {
        let _ = Kit::from_raw(-1);
    }

    #[test]
    fn display_truncates_to_micro() {
        assert_eq!(Kit::of_kit(3).to_string(), "3.000000");
        assert_eq!(Kit::of_mukit(500_000).to_string(), "0.500000");
    }
}
