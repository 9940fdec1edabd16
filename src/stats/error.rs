use chrono::NaiveDateTime;

/// Failures that abort a trend collection run.
///
/// Every variant is fatal: the pipeline has no per-window recovery, so a single bad
/// window fails the whole batch before any output is written.
#[derive(Debug, thiserror::Error)]
pub enum TrendError {
    /// Time range, step, filter, or run parameters are unusable.
    #[error("invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The remote API could not be reached or answered with a failure status.
    #[error("request to '{url}' failed: {detail}")]
    Transport { url: String, detail: String },

    /// A successful response did not have the expected structure.
    #[error("unexpected {context} payload for window starting {window_start}: {detail}")]
    DataShape {
        context: String,
        window_start: NaiveDateTime,
        detail: String,
    },

    /// A client-count series does not line up with the generated windows.
    #[error("client count series '{series}' has {actual} entries but {expected} windows were requested")]
    LengthMismatch {
        series: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A client-count series has the right length but skips a window.
    #[error("client count series '{series}' has no entry for the window starting {window_start}")]
    MissingWindow {
        series: &'static str,
        window_start: NaiveDateTime,
    },
}

impl TrendError {
    pub(crate) fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfiguration(message.into())
    }

    pub(crate) fn data_shape(context: impl Into<String>, window_start: NaiveDateTime, detail: impl ToString) -> Self {
        Self::DataShape {
            context: context.into(),
            window_start,
            detail: detail.to_string(),
        }
    }
}
