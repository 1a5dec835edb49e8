//! marga-sim - simulated world for the marga engine
//!
//! Builds a voxel arena with wandering targets, runs the engine against a
//! simulated authority that judges every position report, and logs engine
//! status as it goes.
//!
//! ```bash
//! cargo run -p marga-sim -- --config marga-sim/configs/sim.toml --steps 1200
//! RUST_LOG=marga=debug cargo run -p marga-sim
//! ```

mod authority;
mod config;
mod error;
mod sim;
mod world;

use std::path::PathBuf;

use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::SimConfig;
use error::Result;
use sim::Simulation;

#[derive(Parser, Debug)]
#[command(name = "marga-sim")]
#[command(about = "Run the marga engine against a simulated voxel world")]
struct Args {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the number of steps to simulate
    #[arg(long)]
    steps: Option<u64>,

    /// Override the random seed
    #[arg(long)]
    seed: Option<u64>,

    /// Run searches on the calling thread instead of the search worker
    #[arg(long)]
    inline: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("marga=info,marga_sim=info")),
        )
        .init();

    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => {
            info!("Loading configuration from {:?}", path);
            SimConfig::load(path)?
        }
        None => {
            info!("Using default configuration");
            SimConfig::default()
        }
    };

    if let Some(steps) = args.steps {
        config.run.steps = steps;
    }
    if let Some(seed) = args.seed {
        config.run.seed = seed;
    }
    if args.inline {
        config.engine.refresh.background_thread = false;
    }
    config.validate()?;

    info!("marga-sim v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Running {} steps (seed {}, chunk length {}, {} search)",
        config.run.steps,
        config.run.seed,
        config.engine.executor.chunk_length,
        if config.engine.refresh.background_thread {
            "threaded"
        } else {
            "inline"
        }
    );

    let mut sim = Simulation::new(config)?;
    let summary = sim.run();

    info!("=== Summary ===");
    info!("Steps: {}", summary.steps);
    info!("Final position: {}", sim.position());
    info!("Engine: {}", summary.engine);
    info!("Executor: {}", summary.engine.executor);
    info!("Refresh: {}", summary.engine.refresh);
    info!(
        "Authority: {} accepted, {} rejected",
        summary.authority.accepted, summary.authority.rejected
    );
    info!(
        "Steps idle/planned/executing: {}/{}/{}, target in reach on {} steps",
        summary.state_steps[0],
        summary.state_steps[1],
        summary.state_steps[2],
        summary.steps_in_reach
    );

    Ok(())
}
