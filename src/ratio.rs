//! Exact rational arithmetic used by the parameter controller.
//!
//! The controller chains several multiplications and divisions per tick;
//! doing each step in fixed-point would compound truncation error, so every
//! intermediate quantity is an exact rational and is floored to fixed-point
//! only at the assignment boundary (see `FixedPoint::of_ratio_floor`).

use num_bigint::BigInt;

/// Exact rational: arbitrary-precision numerator/denominator, always reduced
/// to lowest terms with a positive, nonzero denominator.
pub type Ratio = num_rational::BigRational;

/// Build a ratio from machine integers. Panics if `den` is zero, which is a
/// programming error under the numeric contract.
pub fn ratio(num: i128, den: i128) -> Ratio {
    Ratio::new(BigInt::from(num), BigInt::from(den))
}

/// Integer as a ratio.
pub fn ratio_of_int(n: i128) -> Ratio {
    Ratio::from_integer(BigInt::from(n))
}
