//! Scenario files and decimal parsing.
//!
//! The core deliberately carries no serialisation; scenario files are a CLI
//! concern and are converted to core types here.

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use warren::ratio::{ratio, Ratio};
use warren::{FixedPoint, Kit, Parameters, Tez, Timestamp};

/// A replayable oracle scenario.
#[derive(Deserialize)]
pub struct Scenario {
    /// Starting parameters; genesis when omitted.
    #[serde(default)]
    pub start: Option<ParamsSpec>,
    pub pool: PoolSpec,
    pub steps: Vec<StepSpec>,
}

#[derive(Deserialize)]
pub struct PoolSpec {
    /// Coin balance, decimal string.
    pub tez: String,
    /// Kit balance, decimal string.
    pub kit: String,
    /// Initial liquidity-token supply.
    pub liquidity: u64,
}

#[derive(Deserialize)]
pub struct StepSpec {
    /// Seconds since the previous step.
    pub dt: u64,
    /// Oracle index observed at this step, decimal string.
    pub index: String,
}

/// Controller state overrides. All prices are decimal strings; kit amounts
/// are in mukit.
#[derive(Deserialize)]
pub struct ParamsSpec {
    pub q: String,
    pub index: String,
    pub protected_index: String,
    pub target: String,
    pub outstanding_kit: u64,
    pub circulating_kit: u64,
}

/// Parse a plain decimal (`[-]digits[.digits]`) into an exact ratio.
pub fn parse_decimal(s: &str) -> Result<Ratio> {
    let (negative, body) = match s.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, s),
    };
    let (int_part, frac_part) = match body.split_once('.') {
        Some((i, f)) => (i, f),
        None => (body, ""),
    };
    if int_part.is_empty() && frac_part.is_empty() {
        bail!("empty decimal: {s:?}");
    }
    if !int_part.chars().chain(frac_part.chars()).all(|c| c.is_ascii_digit()) {
        bail!("malformed decimal: {s:?}");
    }
    let digits = format!("{int_part}{frac_part}");
    let num: i128 = digits
        .parse()
        .with_context(|| format!("decimal out of range: {s:?}"))?;
    let den = 10i128
        .checked_pow(frac_part.len() as u32)
        .with_context(|| format!("fractional part too long: {s:?}"))?;
    Ok(if negative { ratio(-num, den) } else { ratio(num, den) })
}

/// Parse a non-negative decimal as a coin amount.
pub fn parse_tez(s: &str) -> Result<Tez> {
    let r = parse_decimal(s)?;
    if r < ratio(0, 1) {
        bail!("coin amounts are non-negative: {s:?}");
    }
    Ok(Tez::of_ratio_floor(&r))
}

/// Parse a non-negative decimal as a kit amount.
pub fn parse_kit(s: &str) -> Result<Kit> {
    let r = parse_decimal(s)?;
    if r < ratio(0, 1) {
        bail!("kit amounts are non-negative: {s:?}");
    }
    Ok(Kit::of_ratio_floor(&r))
}

/// Parse a strictly positive decimal price.
pub fn parse_price(s: &str) -> Result<Ratio> {
    let r = parse_decimal(s)?;
    if r <= ratio(0, 1) {
        bail!("prices are positive: {s:?}");
    }
    Ok(r)
}

impl ParamsSpec {
    pub fn into_parameters(self, t0: Timestamp) -> Result<Parameters> {
        let mut p = Parameters::make_initial(t0);
        p.q = FixedPoint::of_ratio_floor(&parse_price(&self.q)?);
        p.index = parse_tez(&self.index)?;
        p.protected_index = parse_tez(&self.protected_index)?;
        p.target = FixedPoint::of_ratio_floor(&parse_price(&self.target)?);
        p.outstanding_kit = Kit::of_mukit(self.outstanding_kit);
        p.circulating_kit = Kit::of_mukit(self.circulating_kit);
        Ok(p)
    }
}
