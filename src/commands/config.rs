use crate::Result;
use crate::stats::{Band, DEFAULT_BASE_URL, DEFAULT_MAX_RETRIES, TrendError};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::{NaiveDate, NaiveDateTime};
use ohno::IntoAppError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;

/// The default configuration TOML content, embedded from `default_config.toml`
pub const DEFAULT_CONFIG_TOML: &str = include_str!("../../default_config.toml");

/// Configuration file looked up in the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "trends.toml";

const LOG_TARGET: &str = "    config";

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Network to report on
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub network_id: Option<String>,

    /// First day of the report, `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<String>,

    /// Length of the report in days
    #[serde(default = "default_num_days")]
    pub num_days: f64,

    /// Width of each time window in seconds
    #[serde(default = "default_step_secs")]
    pub step_secs: u64,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ap_tag: Option<String>,

    /// Radio band filter: "2.4", "5", or "6"
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub band: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssid: Option<String>,

    /// Upper bound on requests in flight against the controller API
    #[serde(default = "default_max_concurrent_requests")]
    pub max_concurrent_requests: usize,

    /// Retries for failed or rate-limited requests
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,

    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Directory where CSV files are written
    #[serde(default = "default_output_dir")]
    pub output_dir: String,
}

const fn default_num_days() -> f64 {
    1.0
}

const fn default_step_secs() -> u64 {
    3600
}

const fn default_max_concurrent_requests() -> usize {
    5
}

const fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

fn default_output_dir() -> String {
    ".".to_string()
}

impl Config {
    /// Load configuration from a file or use defaults
    ///
    /// Without an explicit path, `trends.toml` in `base_dir` is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or holds invalid values
    pub fn load(base_dir: &Utf8Path, config_path: Option<&Utf8PathBuf>) -> Result<Self> {
        let (final_path, text) = if let Some(path) = config_path {
            let text = fs::read_to_string(path).into_app_err_with(|| format!("reading configuration file '{path}'"))?;
            (path.clone(), text)
        } else {
            let path = base_dir.join(DEFAULT_CONFIG_FILE);
            match fs::read_to_string(&path) {
                Ok(text) => (path, text),
                Err(e) if e.kind() == io::ErrorKind::NotFound => {
                    log::debug!(target: LOG_TARGET, "no {DEFAULT_CONFIG_FILE} found, using defaults");
                    return Ok(Self::default());
                }
                Err(e) => return Err(e).into_app_err_with(|| format!("reading configuration file '{path}'")),
            }
        };

        let config: Self = toml::from_str(&text).into_app_err_with(|| format!("parsing configuration file '{final_path}'"))?;
        config.validate()?;

        Ok(config)
    }

    /// Save the default configuration to a TOML file
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be written
    pub fn save_default(output_path: &Utf8Path) -> Result<()> {
        fs::write(output_path, DEFAULT_CONFIG_TOML).into_app_err_with(|| format!("writing default configuration to {output_path}"))?;
        Ok(())
    }

    /// Validate configuration values
    ///
    /// Required values such as the network id may still be missing here; they are
    /// checked once command-line overrides have been applied.
    ///
    /// # Errors
    ///
    /// Returns an error if any value present is out of range or malformed
    pub fn validate(&self) -> Result<(), TrendError> {
        if !(self.num_days.is_finite() && self.num_days > 0.0) {
            return Err(TrendError::InvalidConfiguration(format!(
                "num_days must be a positive number, got {}",
                self.num_days
            )));
        }

        if self.step_secs == 0 {
            return Err(TrendError::InvalidConfiguration("step_secs must be greater than zero".to_string()));
        }

        if self.max_concurrent_requests == 0 {
            return Err(TrendError::InvalidConfiguration(
                "max_concurrent_requests must be greater than zero".to_string(),
            ));
        }

        if let Some(band) = self.band.as_deref().filter(|b| !b.trim().is_empty()) {
            let _: Band = band.parse()?;
        }

        if let Some(start) = &self.start_date {
            let _ = parse_start_date(start)?;
        }

        Ok(())
    }
}

impl Default for Config {
    fn default() -> Self {
        toml::from_str(DEFAULT_CONFIG_TOML).expect("default_config.toml should be valid TOML that deserializes to Config")
    }
}

/// Parse a start date given either as a calendar day (midnight) or a full timestamp.
pub fn parse_start_date(s: &str) -> Result<NaiveDateTime, TrendError> {
    let s = s.trim();
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(chrono::NaiveTime::MIN)))
        .map_err(|_| {
            TrendError::InvalidConfiguration(format!(
                "start date '{s}' is not in YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS form"
            ))
        })
}
