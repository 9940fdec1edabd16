//! Reassembly of collected records into per-window rows.

use super::collector::Collected;
use super::fetcher::{ClientCountPoint, ClientCountSeries};
use super::filter_set::FilterSet;
use super::records::{ClientCountRecord, ConnectionRecord, LatencyRecord};
use super::{TimeWindow, TrendError};
use chrono::{NaiveDate, NaiveDateTime};
use std::collections::BTreeMap;

const LOG_TARGET: &str = "aggregator";

/// The per-window rows of one run, each sorted by window start.
#[derive(Debug, Clone, PartialEq)]
pub struct TrendReport {
    pub connection: Vec<ConnectionRecord>,
    pub client_counts: Vec<ClientCountRecord>,
    pub latency: Vec<LatencyRecord>,
    pub filters: FilterSet,
    pub start: NaiveDateTime,
    pub days: f64,
}

impl TrendReport {
    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    #[must_use]
    pub fn window_count(&self) -> usize {
        self.connection.len()
    }
}

/// Join the four client-count histories against the windows by window start.
///
/// Every history must hold exactly one entry per window.
pub fn join_client_counts(windows: &[TimeWindow], series: &ClientCountSeries) -> Result<Vec<ClientCountRecord>, TrendError> {
    let all_bands = index_series("all_bands", windows.len(), &series.all_bands)?;
    let band_2_4 = index_series("2.4GHz", windows.len(), &series.band_2_4)?;
    let band_5 = index_series("5GHz", windows.len(), &series.band_5)?;
    let band_6 = index_series("6GHz", windows.len(), &series.band_6)?;

    windows
        .iter()
        .map(|&window| {
            Ok(ClientCountRecord {
                window,
                all_bands: lookup(&all_bands, window)?,
                band_2_4: lookup(&band_2_4, window)?,
                band_5: lookup(&band_5, window)?,
                band_6: lookup(&band_6, window)?,
            })
        })
        .collect()
}

struct IndexedSeries {
    name: &'static str,
    by_start: BTreeMap<NaiveDateTime, Option<u64>>,
}

fn index_series(name: &'static str, expected: usize, points: &[ClientCountPoint]) -> Result<IndexedSeries, TrendError> {
    if points.len() != expected {
        return Err(TrendError::LengthMismatch {
            series: name,
            expected,
            actual: points.len(),
        });
    }

    let by_start = points.iter().map(|p| (p.start, p.count)).collect();
    Ok(IndexedSeries { name, by_start })
}

fn lookup(series: &IndexedSeries, window: TimeWindow) -> Result<Option<u64>, TrendError> {
    series.by_start.get(&window.start()).copied().ok_or(TrendError::MissingWindow {
        series: series.name,
        window_start: window.start(),
    })
}

/// Sort every row collection by window start and check each matches the window sequence.
pub fn aggregate(
    windows: &[TimeWindow],
    collected: Collected,
    client_counts: &ClientCountSeries,
    filters: FilterSet,
    start: NaiveDateTime,
    days: f64,
) -> Result<TrendReport, TrendError> {
    let Collected { mut latency, mut connection } = collected;

    latency.sort_by_key(|r| r.window);
    connection.sort_by_key(|r| r.window);

    verify_sequence("latency", windows, latency.iter().map(|r| r.window))?;
    verify_sequence("connection", windows, connection.iter().map(|r| r.window))?;

    let client_counts = join_client_counts(windows, client_counts)?;

    log::info!(target: LOG_TARGET, "aggregated {} windows for {}", windows.len(), filters.signature());

    Ok(TrendReport {
        connection,
        client_counts,
        latency,
        filters,
        start,
        days,
    })
}

fn verify_sequence(context: &str, windows: &[TimeWindow], sorted: impl ExactSizeIterator<Item = TimeWindow>) -> Result<(), TrendError> {
    if sorted.len() != windows.len() {
        let at = windows.first().map_or(NaiveDateTime::MIN, |w| w.start());
        return Err(TrendError::data_shape(
            context,
            at,
            format!("{} records for {} windows", sorted.len(), windows.len()),
        ));
    }

    for (expected, actual) in windows.iter().zip(sorted) {
        if *expected != actual {
            return Err(TrendError::data_shape(
                context,
                expected.start(),
                format!("expected window {expected} but found {actual}"),
            ));
        }
    }

    Ok(())
}
