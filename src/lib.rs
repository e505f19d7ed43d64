//! Core state machine for the warren synthetic-asset stability protocol.
//!
//! The protocol maintains a population of collateralised debt positions
//! ("burrows"), a constant-product pool pairing the native coin with the
//! synthetic token ("kit"), and a global controller that drifts the
//! synthetic's internal price target in response to external oracle prices.
//! This crate is the on-ledger core of that system:
//!
//! 1. The parameter controller ([`params`]): a discrete-time state machine
//!    updating a protected index, a drift/target feedback loop, and the two
//!    multiplicative accumulator indices that convert nominal obligations
//!    into inflation-adjusted ones.
//! 2. The liquidation queue ([`avl`]): an order-statistic AVL tree in an
//!    indexed arena, carrying per-subtree collateral aggregates to support
//!    logarithmic split/join by prefix collateral sum.
//! 3. The numeric substrate ([`fixedpoint`], [`ratio`], [`tez`], [`kit`]):
//!    a 2^64-scaled signed fixed-point type and exact rationals, whose
//!    rounding discipline is part of the protocol.
//!
//! The core is a single-threaded cooperative state machine: every public
//! operation runs to completion atomically, and an operation that reports
//! failure leaves the observable state unchanged. User-facing failures come
//! back as error values; invariant violations are programming errors and
//! abort.

#![forbid(unsafe_code)]

pub mod arena;
pub mod avl;
pub mod constants;
pub mod fixedpoint;
pub mod kit;
pub mod params;
pub mod ratio;
pub mod tez;
pub mod uniswap;

/// Seconds since the Unix epoch. Supplied by the surrounding transaction
/// context; the core never reads a clock.
pub type Timestamp = u64;

pub use arena::{Arena, Handle};
pub use avl::{Branch, Item, Node};
pub use fixedpoint::FixedPoint;
pub use kit::Kit;
pub use params::Parameters;
pub use ratio::Ratio;
pub use tez::Tez;
pub use uniswap::{Uniswap, UniswapError};
