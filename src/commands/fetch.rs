//! The `fetch` command: collect one run of wireless trends and write the reports.

use super::common::{ColorMode, LogLevel, init_logging};
use super::config::{Config, parse_start_date};
use super::{Host, ProgressReporter};
use crate::Result;
use crate::reports::{TimeLabels, generate_console, generate_html, generate_xlsx, render_csv_files};
use crate::stats::{
    Band, Client, FilterSet, Progress, RetryPolicy, StatsSource, Throttler, TrendError, TrendReport, aggregate, collect,
    fetch_client_counts, windows,
};
use camino::{Utf8Path, Utf8PathBuf};
use chrono::NaiveDateTime;
use clap::Parser;
use core::fmt::{Debug, Formatter};
use core::time::Duration;
use ohno::{IntoAppError, app_err};
use std::fs;
use std::io::Write;

const LOG_TARGET: &str = "     fetch";

const SECONDS_PER_DAY: f64 = 86_400.0;

#[derive(Parser, Debug, Clone)]
pub struct FetchArgs {
    /// Path to configuration file (default is `trends.toml`)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<Utf8PathBuf>,

    /// Controller API key
    #[arg(long, value_name = "KEY", env = "MERAKI_DASHBOARD_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Network to report on
    #[arg(long, short = 'n', value_name = "ID")]
    pub network_id: Option<String>,

    /// First day of the report, as YYYY-MM-DD or YYYY-MM-DDTHH:MM:SS
    #[arg(long, value_name = "DATE")]
    pub start_date: Option<String>,

    /// Length of the report in days
    #[arg(long, value_name = "DAYS")]
    pub days: Option<f64>,

    /// Width of each time window in seconds
    #[arg(long, value_name = "SECONDS")]
    pub step_secs: Option<u64>,

    /// Only include access points carrying this tag
    #[arg(long, value_name = "TAG", help_heading = "Filters")]
    pub ap_tag: Option<String>,

    /// Only include this radio band (2.4, 5 or 6)
    #[arg(long, value_name = "BAND", help_heading = "Filters")]
    pub band: Option<Band>,

    /// Only include clients of this SSID
    #[arg(long, value_name = "SSID", help_heading = "Filters")]
    pub ssid: Option<String>,

    /// Upper bound on requests in flight against the controller API
    #[arg(long, value_name = "N")]
    pub max_concurrent_requests: Option<usize>,

    /// Retries for failed or rate-limited requests
    #[arg(long, value_name = "N")]
    pub max_retries: Option<u32>,

    /// Controller API endpoint
    #[arg(long, value_name = "URL")]
    pub base_url: Option<String>,

    /// Directory where CSV files are written
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub output_dir: Option<Utf8PathBuf>,

    /// Label rows with date and time instead of time of day only
    #[arg(long, help_heading = "Report Output")]
    pub full_timestamps: bool,

    /// Write line charts to an HTML file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub charts: Option<Utf8PathBuf>,

    /// Write the tables to an Excel spreadsheet file
    #[arg(long, value_name = "PATH", help_heading = "Report Output")]
    pub excel: Option<Utf8PathBuf>,

    /// Skip the summary printed to the terminal
    #[arg(long, help_heading = "Report Output")]
    pub no_summary: bool,

    /// Control when to use colored output
    #[arg(long, value_name = "WHEN", default_value = "auto")]
    pub color: ColorMode,

    /// Set the logging level for diagnostic output
    #[arg(long, value_name = "LEVEL", default_value = "none")]
    pub log_level: LogLevel,
}

/// Everything a run needs, resolved once from the configuration file and the command line.
#[derive(Clone, PartialEq)]
pub struct RunSettings {
    pub network_id: String,
    pub api_key: String,
    pub start: NaiveDateTime,
    pub days: f64,
    pub step: Duration,
    pub filters: FilterSet,
    pub max_concurrent_requests: usize,
    pub max_retries: u32,
    pub base_url: String,
    pub output_dir: Utf8PathBuf,
}

impl RunSettings {
    /// Apply command-line overrides to `config` and check the result.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidConfiguration`] if a required value is missing or any value is unusable
    pub fn resolve(config: Config, args: &FetchArgs) -> Result<Self, TrendError> {
        let config = Config {
            network_id: args.network_id.clone().or(config.network_id),
            start_date: args.start_date.clone().or(config.start_date),
            num_days: args.days.unwrap_or(config.num_days),
            step_secs: args.step_secs.unwrap_or(config.step_secs),
            ap_tag: args.ap_tag.clone().or(config.ap_tag),
            band: config.band,
            ssid: args.ssid.clone().or(config.ssid),
            max_concurrent_requests: args.max_concurrent_requests.unwrap_or(config.max_concurrent_requests),
            max_retries: args.max_retries.unwrap_or(config.max_retries),
            base_url: args.base_url.clone().unwrap_or(config.base_url),
            output_dir: args.output_dir.as_ref().map_or(config.output_dir, ToString::to_string),
        };
        config.validate()?;

        let network_id = config
            .network_id
            .filter(|id| !id.trim().is_empty())
            .ok_or_else(|| TrendError::invalid_config("no network id given; set network_id or pass --network-id"))?;

        let api_key = args
            .api_key
            .clone()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| TrendError::invalid_config("no API key given; pass --api-key or set MERAKI_DASHBOARD_API_KEY"))?;

        let start = config
            .start_date
            .as_deref()
            .ok_or_else(|| TrendError::invalid_config("no start date given; set start_date or pass --start-date"))
            .and_then(parse_start_date)?;

        let band = match args.band {
            Some(band) => Some(band),
            None => config.band.as_deref().filter(|b| !b.trim().is_empty()).map(str::parse).transpose()?,
        };

        Ok(Self {
            network_id,
            api_key,
            start,
            days: config.num_days,
            step: Duration::from_secs(config.step_secs),
            filters: FilterSet::new(config.ap_tag, band, config.ssid),
            max_concurrent_requests: config.max_concurrent_requests,
            max_retries: config.max_retries,
            base_url: config.base_url,
            output_dir: Utf8PathBuf::from(config.output_dir),
        })
    }

    /// Total length of the run.
    ///
    /// # Errors
    ///
    /// Returns [`TrendError::InvalidConfiguration`] if the day count does not fit a duration
    pub fn duration(&self) -> Result<Duration, TrendError> {
        Duration::try_from_secs_f64(self.days * SECONDS_PER_DAY)
            .map_err(|e| TrendError::invalid_config(format!("{} days is not a usable duration: {e}", self.days)))
    }
}

impl Debug for RunSettings {
    fn fmt(&self, f: &mut Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RunSettings")
            .field("network_id", &self.network_id)
            .field("api_key", &"<redacted>")
            .field("start", &self.start)
            .field("days", &self.days)
            .field("step", &self.step)
            .field("filters", &self.filters)
            .field("max_concurrent_requests", &self.max_concurrent_requests)
            .field("max_retries", &self.max_retries)
            .field("base_url", &self.base_url)
            .field("output_dir", &self.output_dir)
            .finish()
    }
}

/// Run the whole collection pipeline against `source`.
///
/// Windows are generated first, then the four client-count histories are fetched one
/// after another, then latency and connection statistics for every window are fetched
/// concurrently. Any failure aborts the run.
pub async fn build_report<S: StatsSource>(source: &S, settings: &RunSettings, progress: &dyn Progress) -> Result<TrendReport, TrendError> {
    let windows = windows(settings.start, settings.duration()?, settings.step)?;

    log::info!(
        target: LOG_TARGET,
        "network {}: {} windows of {}s from {} ({})",
        settings.network_id,
        windows.len(),
        settings.step.as_secs(),
        settings.start,
        settings.filters.signature()
    );

    progress.set_phase("Counting");
    progress.set_indeterminate(Box::new(|| "client counts by band".to_string()));
    let client_counts = fetch_client_counts(source, &settings.network_id, &windows, &settings.filters).await?;

    let collected = collect(source, &settings.network_id, &windows, &settings.filters, progress).await?;

    aggregate(&windows, collected, &client_counts, settings.filters.clone(), settings.start, settings.days)
}

pub async fn fetch_trends<H: Host>(host: &mut H, args: &FetchArgs) -> Result<()> {
    init_logging(args.log_level);

    let config = Config::load(Utf8Path::new("."), args.config.as_ref())?;
    let settings = RunSettings::resolve(config, args)?;
    log::debug!(target: LOG_TARGET, "{settings:?}");

    let throttler = Throttler::new(settings.max_concurrent_requests);
    let client = Client::new(
        &settings.api_key,
        &settings.base_url,
        throttler,
        RetryPolicy::with_max_retries(settings.max_retries),
    )?;

    let delay = if args.log_level == LogLevel::None {
        Duration::from_millis(300)
    } else {
        Duration::from_secs(365 * 24 * 3600)
    };
    let progress = ProgressReporter::new(delay, args.color.for_stderr());

    let result = build_report(&client, &settings, &progress).await;
    progress.done();
    let report = result.into_app_err("collecting wireless statistics")?;

    write_reports(host, &report, &settings, args)
}

/// Write every requested output. Only called once the whole pipeline has succeeded.
///
/// Everything is rendered in memory and every destination directory is checked before the
/// first file is written, so a bad `--charts` or `--excel` path leaves nothing behind.
fn write_reports<H: Host>(host: &mut H, report: &TrendReport, settings: &RunSettings, args: &FetchArgs) -> Result<()> {
    let labels = if args.full_timestamps { TimeLabels::Full } else { TimeLabels::TimeOfDay };

    let mut pending = render_csv_files(report, labels, &settings.output_dir)?;

    if let Some(path) = &args.charts {
        let mut html = String::new();
        generate_html(report, labels, &mut html)?;
        pending.push((path.clone(), html.into_bytes()));
    }

    if let Some(path) = &args.excel {
        let mut workbook = Vec::new();
        generate_xlsx(report, labels, &mut workbook)?;
        pending.push((path.clone(), workbook));
    }

    let mut summary = String::new();
    if !args.no_summary {
        generate_console(report, args.color.for_stdout(), &mut summary)?;
    }

    for (path, _) in &pending {
        if let Some(parent) = path.parent()
            && !parent.as_str().is_empty()
            && parent != settings.output_dir.as_path()
            && !parent.is_dir()
        {
            return Err(app_err!("cannot write '{path}': directory '{parent}' does not exist"));
        }
    }

    fs::create_dir_all(&settings.output_dir).into_app_err_with(|| format!("creating output directory '{}'", settings.output_dir))?;
    for (path, contents) in &pending {
        log::debug!(target: LOG_TARGET, "writing {path} ({} bytes)", contents.len());
        fs::write(path, contents).into_app_err_with(|| format!("writing '{path}'"))?;
    }

    if !args.no_summary {
        let _ = writeln!(host.output(), "{summary}");
    }

    for (path, _) in &pending {
        let _ = writeln!(host.output(), "Wrote {path}");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::host::TestHost;
    use crate::stats::TimeWindow;
    use chrono::{NaiveDate, TimeDelta};
    use serde_json::{Value, json};

    #[derive(Debug)]
    struct NoOpProgress;

    impl Progress for NoOpProgress {
        fn set_phase(&self, _phase: &str) {}
        fn set_determinate(&self, _callback: Box<dyn Fn() -> (u64, u64, String) + Send + Sync + 'static>) {}
        fn set_indeterminate(&self, _callback: Box<dyn Fn() -> String + Send + Sync + 'static>) {}
        fn done(&self) {}
    }

    /// Answers every call with plausible data derived from the requested range.
    #[derive(Debug, Default)]
    struct CannedSource {
        /// Drop the last entry of the 6 GHz history.
        short_six_ghz: bool,
    }

    impl StatsSource for CannedSource {
        async fn latency_stats(&self, _network_id: &str, _window: TimeWindow, _filters: &FilterSet) -> Result<Value, TrendError> {
            Ok(json!({
                "backgroundTraffic": { "avg": 1.0 },
                "bestEffortTraffic": { "avg": 2.0 },
                "videoTraffic": { "avg": null },
                "voiceTraffic": { "avg": 4.0 }
            }))
        }

        async fn connection_stats(&self, _network_id: &str, _window: TimeWindow, _filters: &FilterSet) -> Result<Value, TrendError> {
            Ok(json!({ "assoc": 1, "auth": 0, "dhcp": 2, "dns": 0, "success": 9 }))
        }

        async fn client_count_history(
            &self,
            _network_id: &str,
            range: TimeWindow,
            resolution: Duration,
            _filters: &FilterSet,
            band: Option<Band>,
        ) -> Result<Value, TrendError> {
            let step = TimeDelta::from_std(resolution).unwrap();
            let mut entries = Vec::new();
            let mut start = range.start();
            while start < range.end() {
                entries.push(json!({
                    "startTs": format!("{}Z", start.format("%Y-%m-%dT%H:%M:%S")),
                    "endTs": format!("{}Z", (start + step).format("%Y-%m-%dT%H:%M:%S")),
                    "clientCount": 7
                }));
                start += step;
            }

            if self.short_six_ghz && band == Some(Band::Six) {
                let _ = entries.pop();
            }

            Ok(Value::Array(entries))
        }
    }

    fn args(extra: &[&str]) -> FetchArgs {
        let base = ["fetch", "--api-key", "secret", "--network-id", "N_1", "--start-date", "2024-01-01"];
        FetchArgs::try_parse_from(base.iter().chain(extra)).unwrap()
    }

    fn settings(extra: &[&str]) -> RunSettings {
        RunSettings::resolve(Config::default(), &args(extra)).unwrap()
    }

    #[test]
    fn test_resolve_uses_defaults() {
        let settings = settings(&[]);
        assert_eq!(settings.network_id, "N_1");
        assert_eq!(settings.start, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap());
        assert_eq!(settings.step, Duration::from_secs(3600));
        assert_eq!(settings.duration().unwrap(), Duration::from_secs(86_400));
        assert_eq!(settings.max_concurrent_requests, 5);
        assert_eq!(settings.filters, FilterSet::default());
        assert_eq!(settings.output_dir, Utf8PathBuf::from("."));
    }

    #[test]
    fn test_command_line_overrides_config() {
        let config = Config {
            network_id: Some("N_config".to_string()),
            band: Some("2.4".to_string()),
            ssid: Some("Corp".to_string()),
            step_secs: 600,
            ..Config::default()
        };
        let args = args(&["--band", "6", "--days", "2", "--max-concurrent-requests", "3"]);

        let settings = RunSettings::resolve(config, &args).unwrap();
        assert_eq!(settings.network_id, "N_1");
        assert_eq!(settings.filters.band, Some(Band::Six));
        assert_eq!(settings.filters.ssid.as_deref(), Some("Corp"));
        assert_eq!(settings.step, Duration::from_secs(600));
        assert!((settings.days - 2.0).abs() < f64::EPSILON);
        assert_eq!(settings.max_concurrent_requests, 3);
    }

    #[test]
    fn test_missing_api_key_is_rejected() {
        let mut args = args(&[]);
        args.api_key = None;
        assert!(matches!(
            RunSettings::resolve(Config::default(), &args),
            Err(TrendError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_missing_network_id_is_rejected() {
        let mut args = args(&[]);
        args.network_id = None;
        assert!(matches!(
            RunSettings::resolve(Config::default(), &args),
            Err(TrendError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_zero_step_is_rejected() {
        assert!(RunSettings::resolve(Config::default(), &args(&["--step-secs", "0"])).is_err());
    }

    #[test]
    fn test_invalid_band_argument_is_rejected_by_parser() {
        let result = FetchArgs::try_parse_from(["fetch", "--band", "7"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let rendered = format!("{:?}", settings(&[]));
        assert!(!rendered.contains("secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[tokio::test]
    async fn test_build_report_for_one_day() {
        let report = build_report(&CannedSource::default(), &settings(&[]), &NoOpProgress).await.unwrap();

        assert_eq!(report.window_count(), 24);
        assert_eq!(report.client_counts.len(), 24);
        assert_eq!(report.client_counts[5].band_6, Some(7));
        assert_eq!(report.connection[0].total_failures(), 3);
        assert_eq!(report.latency[23].video_avg, None);
        assert_eq!(report.latency[23].voice_avg, Some(4.0));
    }

    #[tokio::test]
    async fn test_build_report_fails_on_short_client_count_series() {
        let source = CannedSource { short_six_ghz: true };
        let err = build_report(&source, &settings(&[]), &NoOpProgress).await.unwrap_err();
        assert!(matches!(err, TrendError::LengthMismatch { series: "6GHz", .. }));
    }

    #[tokio::test]
    async fn test_write_reports_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = Utf8Path::from_path(dir.path()).unwrap();
        let charts = out.join("charts.html");
        let excel = out.join("trends.xlsx");

        let args = args(&["--output-dir", out.as_str(), "--charts", charts.as_str(), "--excel", excel.as_str(), "--color", "never"]);
        let settings = RunSettings::resolve(Config::default(), &args).unwrap();
        let report = build_report(&CannedSource::default(), &settings, &NoOpProgress).await.unwrap();

        let mut host = TestHost::new();
        write_reports(&mut host, &report, &settings, &args).unwrap();

        let latency_csv = out.join("latency_stats_2024-01-01_1day_Tag-All_Band-All_SSID-All.csv");
        assert!(latency_csv.exists());
        assert!(out.join("connection_stats_2024-01-01_1day_Tag-All_Band-All_SSID-All.csv").exists());
        assert!(out.join("client_counts_2024-01-01_1day_Tag-All_Band-All_SSID-All.csv").exists());
        assert!(charts.exists());
        assert!(excel.exists());

        let csv = fs::read_to_string(latency_csv).unwrap();
        assert_eq!(csv.lines().count(), 25);
        assert!(csv.lines().nth(24).unwrap().starts_with("23:00:00,"));

        let output = host.output_text();
        assert!(output.contains("Successful connections"));
        assert_eq!(output.matches("Wrote ").count(), 5);
    }

    #[tokio::test]
    async fn test_write_reports_leaves_nothing_when_excel_dir_is_missing() {
        let dir = tempfile::tempdir().unwrap();
        let out = Utf8Path::from_path(dir.path()).unwrap().join("out");
        let excel = Utf8Path::from_path(dir.path()).unwrap().join("missing").join("trends.xlsx");

        let args = args(&["--output-dir", out.as_str(), "--excel", excel.as_str(), "--color", "never"]);
        let settings = RunSettings::resolve(Config::default(), &args).unwrap();
        let report = build_report(&CannedSource::default(), &settings, &NoOpProgress).await.unwrap();

        let mut host = TestHost::new();
        assert!(write_reports(&mut host, &report, &settings, &args).is_err());

        assert!(!out.exists());
        assert!(!excel.exists());
        assert!(host.output_text().is_empty());
    }

    #[tokio::test]
    async fn test_write_reports_accepts_excel_inside_new_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        let out = Utf8Path::from_path(dir.path()).unwrap().join("out");
        let excel = out.join("trends.xlsx");

        let args = args(&["--output-dir", out.as_str(), "--excel", excel.as_str(), "--no-summary"]);
        let settings = RunSettings::resolve(Config::default(), &args).unwrap();
        let report = build_report(&CannedSource::default(), &settings, &NoOpProgress).await.unwrap();

        let mut host = TestHost::new();
        write_reports(&mut host, &report, &settings, &args).unwrap();

        assert!(excel.exists());
        assert_eq!(host.output_text().matches("Wrote ").count(), 4);
    }
}
