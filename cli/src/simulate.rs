//! Controller tick and scenario replay.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use colored::Colorize;
use warren::{FixedPoint, Kit, Parameters, Tez, Uniswap};

use crate::scenario::{parse_kit, parse_price, parse_tez, Scenario};

/// Lossy decimal view for display only; all arithmetic stays exact.
fn approx(fp: FixedPoint) -> f64 {
    fp.raw() as f64 / 2f64.powi(64)
}

fn approx_kit(k: Kit) -> f64 {
    k.raw() as f64 / 2f64.powi(64)
}

fn approx_tez(t: Tez) -> f64 {
    t.raw() as f64 / 2f64.powi(64)
}

fn print_parameters(p: &Parameters) {
    println!("{}", "parameters".bold());
    println!("  q                {:.12}", approx(p.q));
    println!("  index            {}", p.index);
    println!("  protected_index  {}", p.protected_index);
    println!("  target           {:.12}", approx(p.target));
    println!("  drift            {:.6e}", approx(p.drift));
    println!("  drift'           {:.6e}", approx(p.drift_derivative));
    println!("  burrow_fee_index {:.12}", approx(p.burrow_fee_index));
    println!("  imbalance_index  {:.12}", approx(p.imbalance_index));
    println!("  outstanding_kit  {}", p.outstanding_kit);
    println!("  circulating_kit  {}", p.circulating_kit);
}

/// Run one tick from genesis or a state file.
pub fn tick(
    index: &str,
    kit_price: &str,
    dt: u64,
    state: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let oracle = parse_tez(index)?;
    let price = parse_price(kit_price)?;
    let params = match state {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read state file {}", path.display()))?;
            let spec: crate::scenario::ParamsSpec = serde_json::from_str(&text)
                .with_context(|| format!("failed to parse state file {}", path.display()))?;
            spec.into_parameters(0)?
        }
        None => Parameters::make_initial(0),
    };
    if verbose {
        print_parameters(&params);
        println!();
    }

    let (accrual, next) = params.touch(params.last_touched + dt, oracle, &price);
    print_parameters(&next);
    println!("{} {}", "accrual to pool:".green(), accrual);
    Ok(())
}

/// Replay a scenario, feeding every accrual into the pool and quoting the
/// kit price back from the pool at each step.
pub fn run(path: &Path, verbose: bool) -> Result<()> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read scenario {}", path.display()))?;
    let scenario: Scenario = serde_json::from_str(&text)
        .with_context(|| format!("failed to parse scenario {}", path.display()))?;

    let mut pool = Uniswap::new(
        parse_tez(&scenario.pool.tez)?,
        parse_kit(&scenario.pool.kit)?,
        scenario.pool.liquidity,
    );
    if pool.tez().is_zero() || pool.kit().is_zero() {
        anyhow::bail!("scenario pool must be seeded on both sides");
    }
    let mut params = match scenario.start {
        Some(spec) => spec.into_parameters(0)?,
        None => Parameters::make_initial(0),
    };

    println!(
        "{}",
        format!(
            "{:>5} {:>12} {:>12} {:>14} {:>14} {:>16}",
            "tick", "index", "kit_price", "q", "target", "accrual"
        )
        .bold()
    );

    let mut now = params.last_touched;
    let mut total_accrued = Kit::ZERO;
    for (i, step) in scenario.steps.iter().enumerate() {
        now += step.dt;
        let oracle = parse_tez(&step.index)?;
        let kit_price = pool.kit_in_tez();
        let (accrual, next) = params.touch(now, oracle, &kit_price);
        pool = pool.add_accrued_kit(accrual);
        total_accrued = total_accrued + accrual;
        println!(
            "{:>5} {:>12} {:>12.6} {:>14.9} {:>14.9} {:>16}",
            i + 1,
            next.index.to_string(),
            approx_tez(pool.tez()) / approx_kit(pool.kit()),
            approx(next.q),
            approx(next.target),
            accrual.to_string(),
        );
        params = next;
        if verbose {
            print_parameters(&params);
        }
    }

    println!();
    println!(
        "{} tez={} kit={} liquidity={} (accrued {})",
        "final pool:".green().bold(),
        pool.tez(),
        pool.kit(),
        pool.liquidity(),
        total_accrued,
    );
    Ok(())
}
