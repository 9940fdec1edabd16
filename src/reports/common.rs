//! Naming, labels, and formatting shared by the report generators.

use crate::stats::{TimeWindow, TrendReport};
use chrono::NaiveTime;
use strum::IntoEnumIterator;

/// The three per-window tables produced for every run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::EnumIter)]
pub enum Table {
    ConnectionStats,
    ClientCounts,
    LatencyStats,
}

impl Table {
    /// Leading component of the table's file name.
    #[must_use]
    pub const fn file_stem(self) -> &'static str {
        match self {
            Self::ConnectionStats => "connection_stats",
            Self::ClientCounts => "client_counts",
            Self::LatencyStats => "latency_stats",
        }
    }

    /// Sheet name and chart heading.
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::ConnectionStats => "Connection Stats",
            Self::ClientCounts => "Client Counts",
            Self::LatencyStats => "Latency Stats",
        }
    }

    /// Column headers after the leading `time` column.
    #[must_use]
    pub const fn value_columns(self) -> &'static [&'static str] {
        match self {
            Self::ConnectionStats => &[
                "successful_connections",
                "total_failures",
                "assoc_failures",
                "auth_failures",
                "dhcp_failures",
                "dns_failures",
            ],
            Self::ClientCounts => &["all_bands", "2.4GHz", "5GHz", "6GHz"],
            Self::LatencyStats => &["background_avg_ms", "best_effort_avg_ms", "video_avg_ms", "voice_avg_ms"],
        }
    }

    /// Label of the value axis in charts.
    #[must_use]
    pub const fn unit_label(self) -> &'static str {
        match self {
            Self::ConnectionStats => "Total connection attempts",
            Self::ClientCounts => "Clients",
            Self::LatencyStats => "ms",
        }
    }

    /// Per-window cell values, in column order. Missing data is `None`.
    #[must_use]
    pub fn rows(self, report: &TrendReport) -> Vec<(TimeWindow, Vec<Option<f64>>)> {
        #[expect(clippy::cast_precision_loss, reason = "counts stay far below 2^52")]
        let n = |v: u64| Some(v as f64);
        #[expect(clippy::cast_precision_loss, reason = "counts stay far below 2^52")]
        let opt = |v: Option<u64>| v.map(|v| v as f64);

        match self {
            Self::ConnectionStats => report
                .connection
                .iter()
                .map(|r| {
                    let cells = vec![
                        n(r.success),
                        n(r.total_failures()),
                        n(r.assoc_failures),
                        n(r.auth_failures),
                        n(r.dhcp_failures),
                        n(r.dns_failures),
                    ];
                    (r.window, cells)
                })
                .collect(),
            Self::ClientCounts => report
                .client_counts
                .iter()
                .map(|r| (r.window, vec![opt(r.all_bands), opt(r.band_2_4), opt(r.band_5), opt(r.band_6)]))
                .collect(),
            Self::LatencyStats => report
                .latency
                .iter()
                .map(|r| (r.window, vec![r.background_avg, r.best_effort_avg, r.video_avg, r.voice_avg]))
                .collect(),
        }
    }
}

/// How the leading `time` column is rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TimeLabels {
    /// Hours, minutes, and seconds only. Ambiguous for runs longer than a day.
    #[default]
    TimeOfDay,

    /// Full date and time.
    Full,
}

impl TimeLabels {
    #[must_use]
    pub fn label(self, window: &TimeWindow) -> String {
        match self {
            Self::TimeOfDay => window.time_of_day_label(),
            Self::Full => window.full_label(),
        }
    }
}

/// `{stem}_{YYYY-MM-DD}_{days}day_Tag-…_Band-…_SSID-….csv`
#[must_use]
pub fn file_name(table: Table, report: &TrendReport, extension: &str) -> String {
    let start = if report.start.time() == NaiveTime::MIN {
        report.start.format("%Y-%m-%d").to_string()
    } else {
        report.start.format("%Y-%m-%dT%H%M%S").to_string()
    };

    format!(
        "{}_{start}_{}day_{}.{extension}",
        table.file_stem(),
        report.days,
        file_name_safe(&report.filters.signature())
    )
}

/// Replace characters that are path separators or reserved in file names.
fn file_name_safe(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Chart title such as `1/3/2024 Client Counts - Tag: All - Band: All - SSID: Guest`.
#[must_use]
pub fn chart_title(table: Table, report: &TrendReport) -> String {
    format!(
        "{} {} - Tag: {} - Band: {} - SSID: {}",
        report.start_date().format("%-d/%-m/%Y"),
        table.title(),
        report.filters.tag_label(),
        report.filters.band_label(),
        report.filters.ssid_label()
    )
}

/// Format a numeric cell, leaving missing data blank.
#[must_use]
pub fn format_cell(value: Option<f64>) -> String {
    match value {
        Some(v) if v.fract() == 0.0 && v.abs() < 1e15 => format!("{v:.0}"),
        Some(v) => format!("{v:.2}"),
        None => String::new(),
    }
}

/// All tables, in output order.
pub fn tables() -> impl Iterator<Item = Table> {
    Table::iter()
}
