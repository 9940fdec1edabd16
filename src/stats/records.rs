use super::TimeWindow;
use super::filter_set::Band;

/// Metric family a fetch belongs to, used to route completions in the collector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::EnumIter)]
#[strum(serialize_all = "lowercase")]
pub enum MetricKind {
    Latency,
    Connection,
}

/// Average latency per traffic class over one window, in milliseconds.
///
/// Averages are `None` when the controller reported no data for the window.
#[derive(Debug, Clone, PartialEq)]
pub struct LatencyRecord {
    pub window: TimeWindow,
    pub background_avg: Option<f64>,
    pub best_effort_avg: Option<f64>,
    pub video_avg: Option<f64>,
    pub voice_avg: Option<f64>,
}

impl LatencyRecord {
    /// Record for a window the controller had no latency data for.
    #[must_use]
    pub const fn empty(window: TimeWindow) -> Self {
        Self {
            window,
            background_avg: None,
            best_effort_avg: None,
            video_avg: None,
            voice_avg: None,
        }
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.background_avg.is_none() && self.best_effort_avg.is_none() && self.video_avg.is_none() && self.voice_avg.is_none()
    }
}

/// Connection attempt outcomes over one window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionRecord {
    pub window: TimeWindow,
    pub success: u64,
    pub assoc_failures: u64,
    pub auth_failures: u64,
    pub dhcp_failures: u64,
    pub dns_failures: u64,
}

impl ConnectionRecord {
    /// Record for a window with no connection attempts.
    #[must_use]
    pub const fn zeroed(window: TimeWindow) -> Self {
        Self {
            window,
            success: 0,
            assoc_failures: 0,
            auth_failures: 0,
            dhcp_failures: 0,
            dns_failures: 0,
        }
    }

    #[must_use]
    pub const fn total_failures(&self) -> u64 {
        self.assoc_failures
            .saturating_add(self.auth_failures)
            .saturating_add(self.dhcp_failures)
            .saturating_add(self.dns_failures)
    }
}

/// Client counts over one window, unfiltered and per band.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientCountRecord {
    pub window: TimeWindow,
    pub all_bands: Option<u64>,
    pub band_2_4: Option<u64>,
    pub band_5: Option<u64>,
    pub band_6: Option<u64>,
}

impl ClientCountRecord {
    #[must_use]
    pub const fn band(&self, band: Band) -> Option<u64> {
        match band {
            Band::TwoPointFour => self.band_2_4,
            Band::Five => self.band_5,
            Band::Six => self.band_6,
        }
    }
}

/// A fetch result paired with its metric kind.
#[derive(Debug, Clone, PartialEq)]
pub enum TaggedRecord {
    Latency(LatencyRecord),
    Connection(ConnectionRecord),
}

impl TaggedRecord {
    #[must_use]
    pub const fn kind(&self) -> MetricKind {
        match self {
            Self::Latency(_) => MetricKind::Latency,
            Self::Connection(_) => MetricKind::Connection,
        }
    }

    #[must_use]
    pub const fn window(&self) -> TimeWindow {
        match self {
            Self::Latency(record) => record.window,
            Self::Connection(record) => record.window,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, TimeDelta};

    fn window() -> TimeWindow {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        TimeWindow::new(start, start + TimeDelta::hours(1)).unwrap()
    }

    #[test]
    fn test_total_failures_sums_all_failure_kinds() {
        let record = ConnectionRecord {
            window: window(),
            success: 10,
            assoc_failures: 1,
            auth_failures: 2,
            dhcp_failures: 0,
            dns_failures: 1,
        };
        assert_eq!(record.total_failures(), 4);
    }

    #[test]
    fn test_total_failures_saturates_on_huge_counters() {
        let record = ConnectionRecord {
            assoc_failures: u64::MAX,
            dns_failures: 7,
            ..ConnectionRecord::zeroed(window())
        };
        assert_eq!(record.total_failures(), u64::MAX);
    }

    #[test]
    fn test_zeroed_connection_record() {
        let record = ConnectionRecord::zeroed(window());
        assert_eq!(record.success, 0);
        assert_eq!(record.total_failures(), 0);
    }

    #[test]
    fn test_empty_latency_record() {
        let record = LatencyRecord::empty(window());
        assert!(record.is_empty());
        let record = LatencyRecord {
            voice_avg: Some(1.5),
            ..LatencyRecord::empty(window())
        };
        assert!(!record.is_empty());
    }

    #[test]
    fn test_tagged_record_kind() {
        let latency = TaggedRecord::Latency(LatencyRecord::empty(window()));
        let connection = TaggedRecord::Connection(ConnectionRecord::zeroed(window()));
        assert_eq!(latency.kind(), MetricKind::Latency);
        assert_eq!(connection.kind(), MetricKind::Connection);
        assert_eq!(latency.window(), connection.window());
        assert_eq!(MetricKind::Connection.to_string(), "connection");
    }

    #[test]
    fn test_client_count_band_lookup() {
        let record = ClientCountRecord {
            window: window(),
            all_bands: Some(12),
            band_2_4: Some(3),
            band_5: Some(8),
            band_6: Some(1),
        };
        assert_eq!(record.band(Band::Five), Some(8));
        assert_eq!(record.band(Band::Six), Some(1));
    }
}
