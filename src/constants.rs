//! Protocol constants, fixed at genesis.
//!
//! The control-loop constants are exposed as exact rationals so the
//! controller can defer all rounding to its assignment boundaries.

use crate::ratio::{ratio, Ratio};

pub const SECONDS_IN_A_DAY: u64 = 24 * 3600;

/// Average Gregorian year.
pub const SECONDS_IN_A_YEAR: u64 = 31_556_952;

/// Per-second cap on protected-index movement: 0.05 cNp per minute.
pub fn protected_index_epsilon() -> Ratio {
    ratio(1, 120_000)
}

/// Inner target bracket (0.5 cNp): no drift adjustment inside it.
pub fn target_low_bracket() -> Ratio {
    ratio(5, 1000)
}

/// Outer target bracket (5 cNp): extreme drift adjustment beyond it.
pub fn target_high_bracket() -> Ratio {
    ratio(5, 100)
}

/// Drift acceleration between the brackets: 0.01 cNp/day^2.
pub fn low_acceleration() -> Ratio {
    let day = SECONDS_IN_A_DAY as i128;
    ratio(1, 10_000 * day * day)
}

/// Drift acceleration beyond the outer bracket: 0.05 cNp/day^2.
pub fn high_acceleration() -> Ratio {
    let day = SECONDS_IN_A_DAY as i128;
    ratio(5, 10_000 * day * day)
}

/// Annual fee charged on outstanding burrow debt: 0.5%.
pub fn burrow_fee_percentage() -> Ratio {
    ratio(5, 1000)
}

/// Scaling applied to the clamped imbalance before it enters the index.
pub fn imbalance_scaling_factor() -> Ratio {
    ratio(1, 100)
}

/// The imbalance is clamped to this multiple of the outstanding kit.
pub const IMBALANCE_BOUND_MULTIPLIER: i128 = 5;

/// AMM fee retained by the pool: trades keep 998/1000 of the input (0.2%).
pub const UNISWAP_FEE_NUM: i128 = 998;
pub const UNISWAP_FEE_DEN: i128 = 1000;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accelerations_are_day_squared_scaled() {
        let day2 = (SECONDS_IN_A_DAY as i128).pow(2);
        assert_eq!(low_acceleration(), ratio(1, 10_000) / ratio(day2, 1));
        assert_eq!(high_acceleration(), low_acceleration() * ratio(5, 1));
    }

    #[test]
    fn brackets_nest() {
        assert!(target_low_bracket() < target_high_bracket());
    }
}
