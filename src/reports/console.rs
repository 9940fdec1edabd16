use super::common::{Table, chart_title, format_cell};
use crate::Result;
use crate::stats::{Band, ConnectionRecord, TrendReport};
use core::fmt::{self, Write};
use owo_colors::OwoColorize;
use strum::IntoEnumIterator;

const LABEL_WIDTH: usize = 24;

/// Failure rates at or above these percentages are shown as warnings and errors.
const WARN_FAILURE_RATE: f64 = 5.0;
const BAD_FAILURE_RATE: f64 = 20.0;

/// Write a short per-table summary of the report.
pub fn generate<W: Write>(report: &TrendReport, use_colors: bool, writer: &mut W) -> Result<()> {
    ConsoleReporter { writer, use_colors }.generate(report)
}

#[derive(Debug, Clone, Copy)]
enum Tone {
    Good,
    Warn,
    Bad,
}

struct ConsoleReporter<'a, W: Write> {
    writer: &'a mut W,
    use_colors: bool,
}

impl<W: Write> ConsoleReporter<'_, W> {
    fn generate(&mut self, report: &TrendReport) -> Result<()> {
        self.write_connection(report)?;
        writeln!(self.writer)?;
        self.write_client_counts(report)?;
        writeln!(self.writer)?;
        self.write_latency(report)?;
        Ok(())
    }

    fn write_heading(&mut self, table: Table, report: &TrendReport) -> fmt::Result {
        let title = chart_title(table, report);
        if self.use_colors {
            writeln!(self.writer, "{}", title.bold())
        } else {
            writeln!(self.writer, "{title}")
        }
    }

    fn write_row(&mut self, label: &str, value: &str) -> fmt::Result {
        writeln!(self.writer, "  {label:<LABEL_WIDTH$} {value}")
    }

    fn write_toned_row(&mut self, label: &str, value: &str, tone: Tone) -> fmt::Result {
        if !self.use_colors {
            return self.write_row(label, value);
        }

        match tone {
            Tone::Good => writeln!(self.writer, "  {label:<LABEL_WIDTH$} {}", value.green()),
            Tone::Warn => writeln!(self.writer, "  {label:<LABEL_WIDTH$} {}", value.yellow()),
            Tone::Bad => writeln!(self.writer, "  {label:<LABEL_WIDTH$} {}", value.red()),
        }
    }

    fn write_dimmed_row(&mut self, label: &str, value: &str) -> fmt::Result {
        if self.use_colors {
            writeln!(self.writer, "  {label:<LABEL_WIDTH$} {}", value.dimmed())
        } else {
            self.write_row(label, value)
        }
    }

    fn write_connection(&mut self, report: &TrendReport) -> Result<()> {
        self.write_heading(Table::ConnectionStats, report)?;

        let success = total(report.connection.iter().map(|r| r.success));
        let failures = total(report.connection.iter().map(ConnectionRecord::total_failures));
        let attempts = success.saturating_add(failures);

        self.write_row("Windows", &report.connection.len().to_string())?;
        self.write_row("Successful connections", &success.to_string())?;
        self.write_row("Failed connections", &failures.to_string())?;
        self.write_row("  association", &total(report.connection.iter().map(|r| r.assoc_failures)).to_string())?;
        self.write_row("  authentication", &total(report.connection.iter().map(|r| r.auth_failures)).to_string())?;
        self.write_row("  DHCP", &total(report.connection.iter().map(|r| r.dhcp_failures)).to_string())?;
        self.write_row("  DNS", &total(report.connection.iter().map(|r| r.dns_failures)).to_string())?;

        if attempts == 0 {
            self.write_dimmed_row("Failure rate", "no connection attempts")?;
        } else {
            #[expect(clippy::cast_precision_loss, reason = "counts stay far below 2^52")]
            let rate = failures as f64 * 100.0 / attempts as f64;
            let tone = if rate >= BAD_FAILURE_RATE {
                Tone::Bad
            } else if rate >= WARN_FAILURE_RATE {
                Tone::Warn
            } else {
                Tone::Good
            };
            self.write_toned_row("Failure rate", &format!("{rate:.1}%"), tone)?;
        }

        Ok(())
    }

    fn write_client_counts(&mut self, report: &TrendReport) -> Result<()> {
        self.write_heading(Table::ClientCounts, report)?;

        let peak = report.client_counts.iter().filter_map(|r| r.all_bands).max();
        self.write_peak("Peak clients (all bands)", peak)?;

        for band in Band::iter() {
            let peak = report.client_counts.iter().filter_map(|r| r.band(band)).max();
            self.write_peak(&format!("Peak clients ({})", band.label()), peak)?;
        }

        Ok(())
    }

    fn write_peak(&mut self, label: &str, peak: Option<u64>) -> fmt::Result {
        match peak {
            Some(peak) => self.write_row(label, &peak.to_string()),
            None => self.write_dimmed_row(label, "no data"),
        }
    }

    fn write_latency(&mut self, report: &TrendReport) -> Result<()> {
        self.write_heading(Table::LatencyStats, report)?;

        let classes: [(&str, fn(&crate::stats::LatencyRecord) -> Option<f64>); 4] = [
            ("Background", |r| r.background_avg),
            ("Best effort", |r| r.best_effort_avg),
            ("Video", |r| r.video_avg),
            ("Voice", |r| r.voice_avg),
        ];

        for (name, extract) in classes {
            let label = format!("{name} avg (ms)");
            match mean(report.latency.iter().filter_map(extract)) {
                Some(avg) => self.write_row(&label, &format_cell(Some(avg)))?,
                None => self.write_dimmed_row(&label, "no data")?,
            }
        }

        let gaps = report.latency.iter().filter(|r| r.is_empty()).count();
        if gaps > 0 {
            self.write_dimmed_row("Windows without data", &gaps.to_string())?;
        }

        Ok(())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0u32), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / f64::from(count))
}

fn total(values: impl Iterator<Item = u64>) -> u64 {
    values.fold(0, u64::saturating_add)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::common::tests::sample_report;

    #[test]
    fn test_summary_without_colors() {
        let mut output = String::new();
        generate(&sample_report(), false, &mut output).unwrap();

        assert!(output.contains("1/3/2024 Connection Stats - Tag: All - Band: 5 - SSID: Guest"));
        assert!(output.contains("Successful connections   46"));
        assert!(output.contains("Failed connections       18"));
        assert!(output.contains("Failure rate             28.1%"));
        assert!(output.contains("Peak clients (all bands) 23"));
        assert!(output.contains("Peak clients (6GHz)      no data"));
        assert!(output.contains("Windows without data     1"));
        assert!(!output.contains('\u{1b}'));
    }

    #[test]
    fn test_summary_with_colors() {
        let mut output = String::new();
        generate(&sample_report(), true, &mut output).unwrap();
        assert!(output.contains('\u{1b}'));
    }

    #[test]
    fn test_mean() {
        assert_eq!(mean([1.0, 2.0, 6.0].into_iter()), Some(3.0));
        assert_eq!(mean(core::iter::empty()), None);
    }

    #[test]
    fn test_total_saturates() {
        assert_eq!(total([1, 2, 3].into_iter()), 6);
        assert_eq!(total([u64::MAX, 5].into_iter()), u64::MAX);
    }
}
