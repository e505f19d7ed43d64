//! Warren CLI - scenario driver for the protocol core
//!
//! Replays oracle scenarios through the parameter controller and the pool,
//! and exercises the liquidation queue's split operation, without any chain
//! or network attached.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

mod queue;
mod scenario;
mod simulate;

#[derive(Parser)]
#[command(name = "warren")]
#[command(about = "Warren protocol core - tick simulator and queue tool", long_about = None)]
#[command(version)]
struct Cli {
    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a single controller tick and print the new parameters
    Tick {
        /// Oracle index in coin, decimal (e.g. 0.34)
        #[arg(long)]
        index: String,

        /// Market kit price in coin, decimal (e.g. 0.305)
        #[arg(long)]
        kit_price: String,

        /// Seconds since the last touch
        #[arg(long, default_value = "3600")]
        dt: u64,

        /// JSON file with the starting parameters (defaults to genesis)
        #[arg(long)]
        state: Option<PathBuf>,
    },

    /// Replay a JSON scenario through the controller and the pool
    Simulate {
        /// Scenario file
        #[arg(short, long)]
        scenario: PathBuf,
    },

    /// Build a liquidation queue and split it by a collateral limit
    Queue {
        /// Comma-separated id:collateral pairs, e.g. 1:5,2:3.5,9:1
        #[arg(long)]
        items: String,

        /// Collateral limit for the split, decimal
        #[arg(long)]
        limit: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Commands::Tick { index, kit_price, dt, state } => {
            simulate::tick(&index, &kit_price, dt, state.as_deref(), cli.verbose)
        }
        Commands::Simulate { scenario } => simulate::run(&scenario, cli.verbose),
        Commands::Queue { items, limit } => queue::run(&items, &limit),
    }
}
