//! Log output for the benchmark driver.
//!
//! Everything is written to stderr so the report on stdout can be piped
//! elsewhere. Verbosity follows `RUST_LOG` and defaults to `info`.
//!
//! ```bash
//! RUST_LOG=debug cargo run --release -p seqcomb-bench --features trace-generators
//! ```
//!
//! With `trace-generators`, the library's own `tracing` events (pool setup,
//! stalled combiners, per-request spans at `trace`) are also emitted.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

pub fn init_telemetry() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_thread_ids(true)
                .with_line_number(true)
                .with_target(false)
                .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
                .with_file(true)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
