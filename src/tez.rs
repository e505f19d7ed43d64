//! Tez: the native coin, used as burrow collateral and as the AMM's
//! counter-asset. Same 2^-64 scaling as [`FixedPoint`](crate::FixedPoint)
//! but nominally distinct, so tez and kit cannot be mixed by accident.

use core::fmt;
use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::ToPrimitive;

use crate::fixedpoint::{SCALING_EXPONENT, SCALING_FACTOR};
use crate::ratio::Ratio;

/// A non-negative amount of the native coin, scaled by 2^64.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tez(i128);

impl Tez {
    pub const ZERO: Tez = Tez(0);

    /// Whole coins.
    pub fn of_tez(n: u64) -> Tez {
        Tez((n as i128) << SCALING_EXPONENT)
    }

    /// Wrap a raw 2^-64-scaled amount. Negative amounts violate the
    /// monetary invariant and abort.
    pub fn from_raw(raw: i128) -> Tez {
        assert!(raw >= 0, "tez amounts are non-negative");
        Tez(raw)
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
    pub fn of_ratio_floor(r: &Ratio) -> Tez {
        Tez::from_raw(narrow((r.numer() * BigInt::from(SCALING_FACTOR)).div_floor(r.denom())))
    }

    /// Smallest representable amount not less than `r`.
    pub fn of_ratio_ceil(r: &Ratio) -> Tez {
        Tez::from_raw(narrow((r.numer() * BigInt::from(SCALING_FACTOR)).div_ceil(r.denom())))
    }
}

fn narrow(v: BigInt) -> i128 {
    v.to_i128()
        .unwrap_or_else(|| panic!("tez overflow: value exceeds the i128 representation"))
}

impl core::ops::Add for Tez {
    type Output = Tez;
    fn add(self, rhs: Tez) -> Tez {
        Tez(self.0.checked_add(rhs.0).expect("tez overflow in add"))
    }
}

impl core::ops::Sub for Tez {
    type Output = Tez;
    fn sub(self, rhs: Tez) -> Tez {
        assert!(self.0 >= rhs.0, "tez subtraction underflow");
        Tez(self.0 - rhs.0)
    }
}

impl fmt::Display for Tez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let m = self.0 as u128;
        let int = m >> SCALING_EXPONENT;
        let frac = ((m & ((1u128 << SCALING_EXPONENT) - 1)) * 1_000_000) >> SCALING_EXPONENT;
        write!(f, "{}.{:06}", int, frac)
    }
}

impl fmt::Debug for Tez {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Tez({})", self)
    }
}
