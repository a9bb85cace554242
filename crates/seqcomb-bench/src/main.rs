#![doc = include_str!("../README.md")]

mod bench;

use bench::config::{BenchConfig, CliArgs};
use bench::report::{Summary, Table};
use bench::runner;
use bench::telemetry::init_telemetry;
use clap::Parser;

// mimalloc for thread start-up and the per-run result vectors.
#[global_allocator]
static GLOBAL: mimalloc::MiMalloc = mimalloc::MiMalloc;

fn main() -> anyhow::Result<()> {
    // Load from .env
    let _ = dotenvy::dotenv();
    let args = CliArgs::parse();
    let config = BenchConfig::try_from(args)?;

    init_telemetry()?;
    log_startup_info(&config);

    let mut measurements = Vec::with_capacity(config.strategies.len());
    for &strategy in &config.strategies {
        let measurement = runner::run(strategy, &config)?;
        println!("{}", Summary(&measurement));
        measurements.push(measurement);
    }

    println!("{}", Table(&measurements));
    Ok(())
}

fn log_startup_info(config: &BenchConfig) {
    let cpus = num_cpus::get();
    if cfg!(debug_assertions) {
        tracing::info!("Starting benchmark with full config: {:#?}", config);
    } else {
        tracing::info!(
            "Starting benchmark: {} threads x {} requests, group size {}",
            config.threads,
            config.count,
            config.group_size
        );
    }

    if config.threads > cpus {
        tracing::warn!(
            threads = config.threads,
            cpus,
            "more worker threads than available CPUs; results will include scheduler noise"
        );
    }
}
