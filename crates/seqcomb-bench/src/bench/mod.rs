//! Benchmark driver for the sequence generators.
//!
//! ## Structure
//!
//! - [`config`] - CLI/environment configuration and validation.
//! - [`runner`] - spawns the workers, times the run, checks integrity.
//! - [`report`] - per-run summaries and the comparison table.
//! - [`telemetry`] - log subscriber setup.

pub mod config;
pub mod report;
pub mod runner;
pub mod telemetry;
