//! Windowed collection of wireless statistics
//!
//! This module pulls latency, connection, and client-count telemetry for one network from
//! the controller API and turns it into aligned per-window rows.
//!
//! # Implementation Model
//!
//! The pipeline runs in explicit stages, each taking its inputs and returning its outputs:
//! - **Windows**: [`windows`] splits the requested range into fixed-width [`TimeWindow`]s
//! - **Client counts**: [`fetch_client_counts`] makes four strictly sequential history calls
//! - **Collection**: [`collect`] fans out one latency and one connection fetch per window
//!   and gathers the [`TaggedRecord`]s in completion order
//! - **Aggregation**: [`aggregate`] restores window order and joins client counts by
//!   window start into a [`TrendReport`]
//!
//! All remote calls go through the [`StatsSource`] seam. The production [`Client`] routes
//! them through a shared [`Throttler`] that caps in-flight requests and honors the
//! controller's rate limiting. Any failure is a [`TrendError`] and aborts the run.

mod aggregator;
mod client;
mod collector;
mod error;
mod fetcher;
mod filter_set;
mod progress;
mod records;
pub(crate) mod resilient_http;
mod throttler;
mod time_window;

pub use aggregator::{TrendReport, aggregate, join_client_counts};
pub use client::{Client, DEFAULT_BASE_URL, StatsSource};
pub use collector::{Collected, collect};
pub use error::TrendError;
pub use fetcher::{ClientCountPoint, ClientCountSeries, fetch, fetch_client_counts, normalize_client_counts, normalize_connection, normalize_latency};
pub use filter_set::{Band, FilterSet};
pub use progress::Progress;
pub use records::{ClientCountRecord, ConnectionRecord, LatencyRecord, MetricKind, TaggedRecord};
pub use resilient_http::{DEFAULT_MAX_RETRIES, RetryPolicy};
pub use throttler::Throttler;
pub use time_window::{API_TIMESTAMP_FORMAT, TimeWindow, boundaries, windows};
