#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless driver for the Snake Hazards obstacle engine.
//!
//! Runs a scripted snake around a loop while the concurrent obstacle manager
//! moves, spawns and expires hazards, then prints a summary of the run. Set
//! `RUST_LOG=info` to follow rounds and progress.

mod args;
mod settings;
mod simulation;
mod snake;

use anyhow::Result;
use clap::Parser;

use crate::{args::CliArgs, settings::Settings, simulation::Simulation};

/// Entry point for the Snake Hazards command-line interface.
fn main() -> Result<()> {
    let _ = env_logger::Builder::from_default_env().try_init();

    let args = CliArgs::parse();
    let settings = Settings::resolve(&args)?;
    log::info!(
        "simulating {} ticks of {}ms on a {}x{} grid (difficulty {}, seed {}, realtime {})",
        settings.run.ticks,
        settings.run.tick_ms,
        settings.grid.columns,
        settings.grid.rows,
        settings.run.difficulty,
        settings.run.seed,
        settings.run.realtime
    );

    let summary = Simulation::new(settings)?.run()?;
    println!("{summary}");
    Ok(())
}
