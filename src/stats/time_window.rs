//! Fixed-width, contiguous time windows covering a requested range.

use super::TrendError;
use chrono::{NaiveDateTime, TimeDelta};
use core::fmt::{Display, Formatter};
use core::time::Duration;

/// Timestamp layout understood by the remote API for `t0`/`t1`.
pub const API_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const LOG_TARGET: &str = "   windows";
const TIME_OF_DAY_FORMAT: &str = "%H:%M:%S";
const FULL_LABEL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A half-open interval `[start, end)` over which the remote service aggregates a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimeWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl TimeWindow {
    /// Create a window. `end` must come after `start`.
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self, TrendError> {
        if end <= start {
            return Err(TrendError::invalid_config(format!("window end {end} is not after its start {start}")));
        }

        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> NaiveDateTime {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Start bound formatted for the remote API.
    #[must_use]
    pub fn api_start(&self) -> String {
        self.start.format(API_TIMESTAMP_FORMAT).to_string()
    }

    /// End bound formatted for the remote API.
    #[must_use]
    pub fn api_end(&self) -> String {
        self.end.format(API_TIMESTAMP_FORMAT).to_string()
    }

    /// Time-of-day of the window start, with the date dropped.
    ///
    /// Windows from different days share labels, so multi-day tables repeat index values.
    #[must_use]
    pub fn time_of_day_label(&self) -> String {
        self.start.format(TIME_OF_DAY_FORMAT).to_string()
    }

    /// Date and time of the window start.
    #[must_use]
    pub fn full_label(&self) -> String {
        self.start.format(FULL_LABEL_FORMAT).to_string()
    }
}

impl Display for TimeWindow {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        write!(f, "[{}, {})", self.api_start(), self.api_end())
    }
}

/// Produce the ordered window boundaries covering `[start, start + duration)`.
///
/// Returns `ceil(duration / step)` boundaries, the first equal to `start` and each
/// exactly `step` after the previous one.
pub fn boundaries(start: NaiveDateTime, duration: Duration, step: Duration) -> Result<Vec<NaiveDateTime>, TrendError> {
    if duration.is_zero() {
        return Err(TrendError::invalid_config("the time range duration must be positive"));
    }

    if step.is_zero() {
        return Err(TrendError::invalid_config("the window step must be positive"));
    }

    let step_delta = to_delta(step, "window step")?;
    let count = duration.as_nanos().div_ceil(step.as_nanos());
    let count = usize::try_from(count).map_err(|_| TrendError::invalid_config(format!("{count} windows is too many")))?;

    let mut result = Vec::with_capacity(count);
    let mut current = start;
    for index in 0..count {
        result.push(current);
        if index + 1 < count {
            current = current
                .checked_add_signed(step_delta)
                .ok_or_else(|| TrendError::invalid_config(format!("time range starting at {start} overflows")))?;
        }
    }

    Ok(result)
}

/// Produce the ordered windows covering `[start, start + duration)`.
///
/// Each boundary opens a window of width `step`. A trailing window that would extend
/// past the end of the range is dropped.
pub fn windows(start: NaiveDateTime, duration: Duration, step: Duration) -> Result<Vec<TimeWindow>, TrendError> {
    let range_end = start
        .checked_add_signed(to_delta(duration, "time range duration")?)
        .ok_or_else(|| TrendError::invalid_config(format!("time range starting at {start} overflows")))?;
    let step_delta = to_delta(step, "window step")?;

    let mut result = Vec::new();
    for boundary in boundaries(start, duration, step)? {
        let Some(end) = boundary.checked_add_signed(step_delta) else {
            break;
        };

        if end > range_end {
            log::debug!(target: LOG_TARGET, "dropping partial window starting at {boundary}, range ends at {range_end}");
            break;
        }

        result.push(TimeWindow { start: boundary, end });
    }

    Ok(result)
}

fn to_delta(duration: Duration, what: &str) -> Result<TimeDelta, TrendError> {
    TimeDelta::from_std(duration).map_err(|_| TrendError::invalid_config(format!("{what} of {duration:?} is out of range")))
}
