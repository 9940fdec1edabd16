use super::fetcher::fetch;
use super::filter_set::FilterSet;
use super::records::{ConnectionRecord, LatencyRecord, MetricKind, TaggedRecord};
use super::{Progress, StatsSource, TimeWindow, TrendError};
use core::sync::atomic::{AtomicU64, Ordering};
use futures::stream::FuturesUnordered;
use futures_util::StreamExt;
use std::sync::Arc;
use strum::IntoEnumIterator;

/// Log target for collector
const LOG_TARGET: &str = " collector";

/// Records gathered by [`collect`], in completion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Collected {
    pub latency: Vec<LatencyRecord>,
    pub connection: Vec<ConnectionRecord>,
}

impl Collected {
    fn push(&mut self, record: TaggedRecord) {
        match record {
            TaggedRecord::Latency(record) => self.latency.push(record),
            TaggedRecord::Connection(record) => self.connection.push(record),
        }
    }
}

/// Fetch every metric kind for every window concurrently.
///
/// All fetches are multiplexed on the calling task and consumed as they complete, so
/// the output vectors are in arrival order, not window order. The request concurrency
/// cap lives in the source's transport. The first failing fetch aborts the batch and
/// drops every fetch still in flight.
pub async fn collect<S: StatsSource>(
    source: &S,
    network_id: &str,
    windows: &[TimeWindow],
    filters: &FilterSet,
    progress: &dyn Progress,
) -> Result<Collected, TrendError> {
    let kinds = MetricKind::iter().count();
    let total = (windows.len() * kinds) as u64;
    let completed = Arc::new(AtomicU64::new(0));

    log::info!(target: LOG_TARGET, "fetching {kinds} metrics for {} windows ({total} requests)", windows.len());

    progress.set_phase("Fetching");
    {
        let completed = Arc::clone(&completed);
        progress.set_determinate(Box::new(move || {
            let done = completed.load(Ordering::Relaxed);
            (total, done, format!("{done}/{total} requests"))
        }));
    }

    let mut pending: FuturesUnordered<_> = windows
        .iter()
        .flat_map(|&window| MetricKind::iter().map(move |kind| fetch(source, network_id, kind, window, filters)))
        .collect();

    let mut collected = Collected {
        latency: Vec::with_capacity(windows.len()),
        connection: Vec::with_capacity(windows.len()),
    };

    while let Some(result) = pending.next().await {
        let record = match result {
            Ok(record) => record,
            Err(e) => {
                log::warn!(target: LOG_TARGET, "aborting with {} requests outstanding: {e}", pending.len());
                return Err(e);
            }
        };

        log::debug!(target: LOG_TARGET, "{} {} done", record.kind(), record.window());
        collected.push(record);
        let _ = completed.fetch_add(1, Ordering::Relaxed);
    }

    log::info!(target: LOG_TARGET, "collected {} latency and {} connection records", collected.latency.len(), collected.connection.len());

    Ok(collected)
}
