#![doc(hidden)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Core library for wlan-trends
//!
//! This library consolidates all functionality for the wlan-trends tool, which pulls
//! wireless telemetry from a cloud-managed network controller over a sequence of
//! fixed-width time windows and renders the per-window results as tables and charts.
//!
//! # Module Organization
//!
//! - [`commands`]: Command-line interface and orchestration
//! - [`stats`]: Windowed data collection and aggregation
//! - [`reports`]: Tabular and chart output

pub type Result<T, E = ohno::AppError> = core::result::Result<T, E>;

#[cfg(any(debug_assertions, test))]
pub mod commands;
#[cfg(not(any(debug_assertions, test)))]
mod commands;

pub mod reports;
pub mod stats;

pub use crate::commands::{Host, run};
