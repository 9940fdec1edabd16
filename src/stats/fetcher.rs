//! One remote call per metric and window, normalized into flat records.

use super::filter_set::{Band, FilterSet};
use super::records::{ConnectionRecord, LatencyRecord, MetricKind, TaggedRecord};
use super::{StatsSource, TimeWindow, TrendError};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

const LOG_TARGET: &str = "   fetcher";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawLatencyStats {
    background_traffic: RawTrafficClass,
    best_effort_traffic: RawTrafficClass,
    video_traffic: RawTrafficClass,
    voice_traffic: RawTrafficClass,
}

/// Only the average is kept; the raw latency distribution is ignored.
#[derive(Debug, Deserialize)]
struct RawTrafficClass {
    avg: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct RawConnectionStats {
    assoc: u64,
    auth: u64,
    dhcp: u64,
    dns: u64,
    success: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawClientCount {
    start_ts: DateTime<Utc>,
    end_ts: DateTime<Utc>,
    client_count: Option<u64>,
}

/// One sample of a client-count history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCountPoint {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub count: Option<u64>,
}

/// The four client-count histories of a run: unfiltered and one per band.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientCountSeries {
    pub all_bands: Vec<ClientCountPoint>,
    pub band_2_4: Vec<ClientCountPoint>,
    pub band_5: Vec<ClientCountPoint>,
    pub band_6: Vec<ClientCountPoint>,
}

/// Fetch one metric for one window and normalize it.
///
/// An absent payload yields the kind's empty record rather than an error.
pub async fn fetch<S: StatsSource>(
    source: &S,
    network_id: &str,
    kind: MetricKind,
    window: TimeWindow,
    filters: &FilterSet,
) -> Result<TaggedRecord, TrendError> {
    match kind {
        MetricKind::Latency => {
            let payload = source.latency_stats(network_id, window, filters).await?;
            normalize_latency(window, payload).map(TaggedRecord::Latency)
        }
        MetricKind::Connection => {
            let payload = source.connection_stats(network_id, window, filters).await?;
            normalize_connection(window, payload).map(TaggedRecord::Connection)
        }
    }
}

/// Flatten the per-traffic-class buckets into their averages.
pub fn normalize_latency(window: TimeWindow, payload: Value) -> Result<LatencyRecord, TrendError> {
    if is_empty_payload(&payload) {
        log::debug!(target: LOG_TARGET, "no latency data for {window}");
        return Ok(LatencyRecord::empty(window));
    }

    let raw: RawLatencyStats = serde_json::from_value(payload).map_err(|e| TrendError::data_shape(MetricKind::Latency.to_string(), window.start(), e))?;

    Ok(LatencyRecord {
        window,
        background_avg: raw.background_traffic.avg,
        best_effort_avg: raw.best_effort_traffic.avg,
        video_avg: raw.video_traffic.avg,
        voice_avg: raw.voice_traffic.avg,
    })
}

/// Extract connection counters, zero-filling an empty payload.
pub fn normalize_connection(window: TimeWindow, payload: Value) -> Result<ConnectionRecord, TrendError> {
    if is_empty_payload(&payload) {
        log::debug!(target: LOG_TARGET, "no connection data for {window}, using zeros");
        return Ok(ConnectionRecord::zeroed(window));
    }

    let raw: RawConnectionStats =
        serde_json::from_value(payload).map_err(|e| TrendError::data_shape(MetricKind::Connection.to_string(), window.start(), e))?;

    Ok(ConnectionRecord {
        window,
        success: raw.success,
        assoc_failures: raw.assoc,
        auth_failures: raw.auth,
        dhcp_failures: raw.dhcp,
        dns_failures: raw.dns,
    })
}

/// Decode a client-count history; an absent payload is an empty history.
pub fn normalize_client_counts(range: TimeWindow, payload: Value) -> Result<Vec<ClientCountPoint>, TrendError> {
    if payload.is_null() {
        return Ok(Vec::new());
    }

    let raw: Vec<RawClientCount> = serde_json::from_value(payload).map_err(|e| TrendError::data_shape("client count", range.start(), e))?;

    Ok(raw
        .into_iter()
        .map(|entry| ClientCountPoint {
            start: entry.start_ts.naive_utc(),
            end: entry.end_ts.naive_utc(),
            count: entry.client_count,
        })
        .collect())
}

/// Fetch the four client-count histories covering `windows`, one call after another.
///
/// The histories are sampled at the window width, so each is expected to hold one
/// entry per window; that is checked when they are joined.
pub async fn fetch_client_counts<S: StatsSource>(
    source: &S,
    network_id: &str,
    windows: &[TimeWindow],
    filters: &FilterSet,
) -> Result<ClientCountSeries, TrendError> {
    let (Some(first), Some(last)) = (windows.first(), windows.last()) else {
        return Err(TrendError::invalid_config("no time windows to fetch client counts for"));
    };

    let range = TimeWindow::new(first.start(), last.end())?;
    let resolution = (first.end() - first.start())
        .to_std()
        .map_err(|_| TrendError::invalid_config(format!("window {first} has a negative width")))?;

    let mut series = ClientCountSeries::default();
    for band in [None, Some(Band::TwoPointFour), Some(Band::Five), Some(Band::Six)] {
        log::debug!(target: LOG_TARGET, "fetching client counts for band {}", band.map_or("all", Band::label));
        let payload = source.client_count_history(network_id, range, resolution, filters, band).await?;
        let points = normalize_client_counts(range, payload)?;

        match band {
            None => series.all_bands = points,
            Some(Band::TwoPointFour) => series.band_2_4 = points,
            Some(Band::Five) => series.band_5 = points,
            Some(Band::Six) => series.band_6 = points,
        }
    }

    Ok(series)
}

fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Array(items) => items.is_empty(),
        Value::Object(fields) => fields.is_empty(),
        _ => false,
    }
}
