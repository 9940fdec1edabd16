//! Command-line interface and orchestration for wlan-trends
//!
//! This module implements the CLI commands and wires the collection pipeline in
//! [`crate::stats`] to the generators in [`crate::reports`].
//!
//! # Implementation Model
//!
//! ## Commands
//!
//! - **fetch**: Resolve the run settings, collect one run of statistics from the
//!   controller, and write the CSV files plus any requested charts, workbook, and summary
//! - **init**: Generate a default configuration file
//! - **validate**: Check configuration file syntax and values
//!
//! ## Execution Flow
//!
//! The `run` function parses command-line arguments using clap and routes to the
//! appropriate command handler. `fetch` proceeds as follows:
//!
//! 1. Load `trends.toml` (or the `--config` file) and apply command-line overrides
//! 2. Build the API client with its shared request throttler
//! 3. Generate windows, fetch client counts, collect per-window statistics, and aggregate
//! 4. Write reports, only once every previous step has succeeded

mod common;
mod config;
mod fetch;
mod host;
mod init;
mod progress_reporter;
mod run;
mod validate;

#[cfg(debug_assertions)]
pub use config::Config;

pub use common::{ColorMode, LogLevel};
pub use fetch::{FetchArgs, RunSettings, build_report, fetch_trends};
pub use host::Host;
pub use init::{InitArgs, init_config};
pub use progress_reporter::ProgressReporter;
pub use run::run;
pub use validate::{ValidateArgs, validate_config};
