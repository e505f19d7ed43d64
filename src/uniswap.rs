//! Constant-product market maker pairing the native coin with kit.
//!
//! The controller only ever calls [`Uniswap::add_accrued_kit`]; the trading
//! surface follows standard x*y=k semantics with a 0.2% fee on the input
//! side and deadline-based rejection. Operations take `&self` and return the
//! successor pool; an operation that fails returns only the error, and the
//! caller's pool is untouched.

use num_traits::ToPrimitive;

use crate::constants::{UNISWAP_FEE_DEN, UNISWAP_FEE_NUM};
use crate::kit::Kit;
use crate::ratio::{ratio_of_int, Ratio};
use crate::tez::Tez;
use crate::Timestamp;

/// Pool state: coin and kit balances plus the liquidity-token supply.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Uniswap {
    tez: Tez,
    kit: Kit,
    lqt: u64,
}

/// User-facing failures. An `Err` never commits any state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniswapError {
    /// `now` is past the caller-supplied deadline.
    Expired,
    /// Computed kit output is below the caller's minimum.
    TooLittleKit,
    /// Computed coin output is below the caller's minimum.
    TooLittleTez,
    /// A balance (or the liquidity supply) is zero.
    EmptyPool,
}

impl Uniswap {
    /// Seed a pool. The initial liquidity-token supply is chosen by the
    /// seeder; subsequent minting is pro-rata against it.
    pub fn new(tez: Tez, kit: Kit, lqt: u64) -> Uniswap {
        Uniswap { tez, kit, lqt }
    }

    pub fn tez(&self) -> Tez {
        self.tez
    }

    pub fn kit(&self) -> Kit {
        self.kit
    }

    pub fn liquidity(&self) -> u64 {
        self.lqt
    }

    /// Marginal kit price in coin: `tez / kit`. The controller only quotes
    /// non-empty pools; an empty one here is a programming error.
    pub fn kit_in_tez(&self) -> Ratio {
        assert!(!self.kit.is_zero(), "kit price of an empty pool");
        self.tez.to_ratio() / self.kit.to_ratio()
    }

    /// Swap coin for kit: output is
    /// `floor(tez_in * kit * 998 / (tez * 1000 + tez_in * 998))`.
    pub fn buy_kit(
        &self,
        tez_in: Tez,
        min_kit: Kit,
        now: Timestamp,
        deadline: Timestamp,
    ) -> Result<(Kit, Uniswap), UniswapError> {
        if now > deadline {
            return Err(UniswapError::Expired);
        }
        if self.tez.is_zero() || self.kit.is_zero() {
            return Err(UniswapError::EmptyPool);
        }
        let fee_num = ratio_of_int(UNISWAP_FEE_NUM);
        let fee_den = ratio_of_int(UNISWAP_FEE_DEN);
        let numerator = tez_in.to_ratio() * self.kit.to_ratio() * &fee_num;
        let denominator = self.tez.to_ratio() * &fee_den + tez_in.to_ratio() * &fee_num;
        let kit_out = Kit::of_ratio_floor(&(numerator / denominator));
        if kit_out < min_kit {
            return Err(UniswapError::TooLittleKit);
        }
        Ok((
            kit_out,
            Uniswap { tez: self.tez + tez_in, kit: self.kit - kit_out, lqt: self.lqt },
        ))
    }

    /// Swap kit for coin, mirror of [`Uniswap::buy_kit`].
    pub fn sell_kit(
        &self,
        kit_in: Kit,
        min_tez: Tez,
        now: Timestamp,
        deadline: Timestamp,
    ) -> Result<(Tez, Uniswap), UniswapError> {
        if now > deadline {
            return Err(UniswapError::Expired);
        }
        if self.tez.is_zero() || self.kit.is_zero() {
            return Err(UniswapError::EmptyPool);
        }
        let fee_num = ratio_of_int(UNISWAP_FEE_NUM);
        let fee_den = ratio_of_int(UNISWAP_FEE_DEN);
        let numerator = kit_in.to_ratio() * self.tez.to_ratio() * &fee_num;
        let denominator = self.kit.to_ratio() * &fee_den + kit_in.to_ratio() * &fee_num;
        let tez_out = Tez::of_ratio_floor(&(numerator / denominator));
        if tez_out < min_tez {
            return Err(UniswapError::TooLittleTez);
        }
        Ok((
            tez_out,
            Uniswap { tez: self.tez - tez_out, kit: self.kit + kit_in, lqt: self.lqt },
        ))
    }

    /// Provide liquidity at the pool's current ratio. The side offered in
    /// deficit is absorbed in full; the other side's excess is refunded.
    /// Mints `floor(lqt * deposit / balance)` tokens against the absorbed
    /// side. Returns `(minted, tez_refund, kit_refund, pool)`.
    pub fn buy_liquidity(
        &self,
        tez_in: Tez,
        kit_in: Kit,
    ) -> Result<(u64, Tez, Kit, Uniswap), UniswapError> {
        if self.tez.is_zero() || self.kit.is_zero() || self.lqt == 0 {
            return Err(UniswapError::EmptyPool);
        }
        let tez_fraction = tez_in.to_ratio() / self.tez.to_ratio();
        let kit_fraction = kit_in.to_ratio() / self.kit.to_ratio();
        let (fraction, tez_used, kit_used) = if tez_fraction <= kit_fraction {
            // Coin is the shorter side: fully absorbed; round the matched
            // kit up so the pool never under-collects.
            let kit_used = Kit::of_ratio_ceil(&(self.kit.to_ratio() * &tez_fraction));
            (tez_fraction, tez_in, kit_used)
        } else {
            let tez_used = Tez::of_ratio_ceil(&(self.tez.to_ratio() * &kit_fraction));
            (kit_fraction, tez_used, kit_in)
        };
        let minted = (ratio_of_int(self.lqt as i128) * fraction)
            .floor()
            .to_integer()
            .to_u64()
            .expect("liquidity supply overflow");
        Ok((
            minted,
            tez_in - tez_used,
            kit_in - kit_used,
            Uniswap {
                tez: self.tez + tez_used,
                kit: self.kit + kit_used,
                lqt: self.lqt + minted,
            },
        ))
    }

    /// Redeem liquidity tokens pro-rata, floored on both sides. Redeeming
    /// more tokens than exist is a programming error.
    pub fn sell_liquidity(&self, tokens: u64) -> Result<(Tez, Kit, Uniswap), UniswapError> {
        if self.lqt == 0 {
            return Err(UniswapError::EmptyPool);
        }
        assert!(tokens <= self.lqt, "redeeming more liquidity than exists");
        let share = ratio_of_int(tokens as i128) / ratio_of_int(self.lqt as i128);
        let tez_out = Tez::of_ratio_floor(&(self.tez.to_ratio() * &share));
        let kit_out = Kit::of_ratio_floor(&(self.kit.to_ratio() * share));
        Ok((
            tez_out,
            kit_out,
            Uniswap {
                tez: self.tez - tez_out,
                kit: self.kit - kit_out,
                lqt: self.lqt - tokens,
            },
        ))
    }

    /// Controller hook: the burrow-fee accrual grows the kit side without
    /// minting liquidity.
    pub fn add_accrued_kit(&self, accrual: Kit) -> Uniswap {
        Uniswap { tez: self.tez, kit: self.kit + accrual, lqt: self.lqt }
    }
}
