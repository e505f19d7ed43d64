//! The parameter controller: a discrete-time state machine that drifts the
//! synthetic's internal price target toward the external oracle index.
//!
//! A single entry point, [`Parameters::touch`], advances the whole record by
//! one tick. Every intermediate quantity is an exact [`Ratio`]; each stored
//! field is floored to fixed-point exactly once, at its own assignment, so
//! that the stored state fully determines the next tick on any
//! implementation.
//!
//! Preconditions (`now >= last_touched`, `target > 0`, non-negative kit) are
//! invariants of the surrounding protocol; violating them is a programming
//! error and the controller aborts.

use num_traits::{One, Zero};

use crate::constants::{
    burrow_fee_percentage, high_acceleration, imbalance_scaling_factor, low_acceleration,
    protected_index_epsilon, target_high_bracket, target_low_bracket,
    IMBALANCE_BOUND_MULTIPLIER, SECONDS_IN_A_YEAR,
};
use crate::fixedpoint::FixedPoint;
use crate::kit::Kit;
use crate::ratio::{ratio, ratio_of_int, Ratio};
use crate::tez::Tez;
use crate::Timestamp;

/// The global controller state, replaced wholesale on every tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Parameters {
    /// Reciprocal of the kit price index, dimensionless.
    pub q: FixedPoint,
    /// Last oracle-observed external index.
    pub index: Tez,
    /// Rate-limited tracking of `index`.
    pub protected_index: Tez,
    /// `q * index / market kit price`.
    pub target: FixedPoint,
    /// Integrated drift rate.
    pub drift: FixedPoint,
    /// Instantaneous drift derivative.
    pub drift_derivative: FixedPoint,
    /// Multiplicative accumulator for the burrow fee; starts at 1 and never
    /// decreases.
    pub burrow_fee_index: FixedPoint,
    /// Multiplicative accumulator for the imbalance adjustment; starts at 1
    /// and stays positive.
    pub imbalance_index: FixedPoint,
    /// Total kit owed by all burrows.
    pub outstanding_kit: Kit,
    /// Total kit outside of burrows.
    pub circulating_kit: Kit,
    pub last_touched: Timestamp,
}

impl Parameters {
    /// Genesis state: unit indices, no debt, no drift.
    pub fn make_initial(ts: Timestamp) -> Parameters {
        Parameters {
            q: FixedPoint::ONE,
            index: Tez::of_tez(1),
            protected_index: Tez::of_tez(1),
            target: FixedPoint::ONE,
            drift: FixedPoint::ZERO,
            drift_derivative: FixedPoint::ZERO,
            burrow_fee_index: FixedPoint::ONE,
            imbalance_index: FixedPoint::ONE,
            outstanding_kit: Kit::ZERO,
            circulating_kit: Kit::ZERO,
            last_touched: ts,
        }
    }

    /// Advance the controller to `now` given the oracle's external index and
    /// the AMM's current kit price in coin. Returns the kit accrual owed to
    /// the AMM together with the new parameter record.
    pub fn touch(
        &self,
        now: Timestamp,
        oracle_index: Tez,
        kit_price_in_tez: &Ratio,
    ) -> (Kit, Parameters) {
        assert!(now >= self.last_touched, "time must not run backwards");
        if now == self.last_touched {
            return (Kit::ZERO, self.clone());
        }
        let dt = ratio_of_int((now - self.last_touched) as i128);
        let one = Ratio::one();

        // 1. Protected index: the relative move is clamped into
        //    [exp(-eps dt), exp(+eps dt)], with exp taken to first order.
        let pi = self.protected_index.to_ratio();
        let idx = oracle_index.to_ratio();
        let eps_dt = protected_index_epsilon() * &dt;
        let clamped = (idx.clone() / &pi).clamp(&one - &eps_dt, &one + &eps_dt);
        let protected_index = Tez::of_ratio_floor(&(pi * clamped));

        // 2. Drift derivative, selected from the old target.
        let drift_derivative =
            FixedPoint::of_ratio_floor(&compute_drift_derivative(self.target));

        // 3. Drift: trapezoid rule over the tick.
        let drift = FixedPoint::of_ratio_floor(
            &(self.drift.to_ratio()
                + ratio(1, 2)
                    * (self.drift_derivative.to_ratio() + drift_derivative.to_ratio())
                    * &dt),
        );

        // 4. q: first-order exponential of the integrated drift, with the
        //    derivative contribution weighted 2:1 old:new.
        let exp_arg = (self.drift.to_ratio()
            + ratio(1, 6)
                * (ratio(2, 1) * self.drift_derivative.to_ratio() + drift_derivative.to_ratio())
                * &dt)
            * &dt;
        let q = FixedPoint::of_ratio_floor(&(self.q.to_ratio() * (&one + exp_arg)));

        // 5. Target tracks the new q against the market kit price.
        let target = FixedPoint::of_ratio_floor(&(q.to_ratio() * idx / kit_price_in_tez));

        // 6. Burrow-fee index.
        let year = ratio_of_int(SECONDS_IN_A_YEAR as i128);
        let burrow_fee_index = FixedPoint::of_ratio_floor(
            &(self.burrow_fee_index.to_ratio()
                * (&one + burrow_fee_percentage() * &dt / &year)),
        );

        // 7-8. Imbalance index.
        let imbalance = compute_imbalance(self.outstanding_kit, self.circulating_kit);
        let imbalance_index = FixedPoint::of_ratio_floor(
            &(self.imbalance_index.to_ratio() * (&one + imbalance * &dt / &year)),
        );
        debug_assert!(imbalance_index.raw() > 0, "imbalance index must stay positive");

        // 9-11. Kit bookkeeping from the already-floored indices.
        let with_burrow_fee = Kit::of_ratio_floor(
            &(self.outstanding_kit.to_ratio() * burrow_fee_index.to_ratio()
                / self.burrow_fee_index.to_ratio()),
        );
        let accrual = with_burrow_fee - self.outstanding_kit;
        let outstanding_kit = Kit::of_ratio_floor(
            &(with_burrow_fee.to_ratio() * imbalance_index.to_ratio()
                / self.imbalance_index.to_ratio()),
        );
        // 12. The accrual enters circulation through the AMM.
        let circulating_kit = self.circulating_kit + accrual;

        (
            accrual,
            Parameters {
                q,
                index: oracle_index,
                protected_index,
                target,
                drift,
                drift_derivative,
                burrow_fee_index,
                imbalance_index,
                outstanding_kit,
                circulating_kit,
                last_touched: now,
            },
        )
    }
}

/// Select the drift acceleration from the target's deviation bracket. The
/// brackets are first-order exponentials, `exp(x) = 1 + x`, and the
/// inequality directions at each boundary are part of the protocol.
pub fn compute_drift_derivative(target: FixedPoint) -> Ratio {
    let t = target.to_ratio();
    assert!(t > Ratio::zero(), "target must be positive");
    let one = Ratio::one();
    let low = target_low_bracket();
    let high = target_high_bracket();
    if &one - &low < t && t < &one + &low {
        Ratio::zero()
    } else if &one - &high < t && t <= &one - &low {
        -low_acceleration()
    } else if &one + &low <= t && t < &one + &high {
        low_acceleration()
    } else if t <= &one - &high {
        -high_acceleration()
    } else {
        high_acceleration()
    }
}

/// The imbalance percentage: the signed surplus of outstanding over
/// circulating kit, clamped to five times the outstanding amount, scaled by
/// 1/100 and normalised by the outstanding amount.
pub fn compute_imbalance(outstanding: Kit, circulating: Kit) -> Ratio {
    if outstanding.is_zero() {
        // With no debt there can be no kit in circulation.
        assert!(
            circulating.is_zero(),
            "kit in circulation without outstanding debt"
        );
        return Ratio::zero();
    }
    let out = outstanding.to_ratio();
    let d = &out - circulating.to_ratio();
    let bound = ratio_of_int(IMBALANCE_BOUND_MULTIPLIER) * &out;
    d.clamp(-bound.clone(), bound) * imbalance_scaling_factor() / out
}
