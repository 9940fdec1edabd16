use super::common::{Table, TimeLabels, file_name, format_cell, tables};
use crate::Result;
use crate::stats::TrendReport;
use camino::{Utf8Path, Utf8PathBuf};
use std::io::Write;

/// Write one table as CSV: a `time` column followed by the table's value columns.
///
/// Missing values are written as empty fields.
pub fn generate<W: Write>(table: Table, report: &TrendReport, labels: TimeLabels, writer: W) -> Result<()> {
    let mut csv = csv::Writer::from_writer(writer);

    csv.write_record(core::iter::once("time").chain(table.value_columns().iter().copied()))?;
    for (window, cells) in table.rows(report) {
        csv.write_record(core::iter::once(labels.label(&window)).chain(cells.into_iter().map(format_cell)))?;
    }

    csv.flush()?;
    Ok(())
}

/// Render all three tables in memory, each paired with its destination in `dir`.
pub fn render_all(report: &TrendReport, labels: TimeLabels, dir: &Utf8Path) -> Result<Vec<(Utf8PathBuf, Vec<u8>)>> {
    tables()
        .map(|table| {
            let mut contents = Vec::new();
            generate(table, report, labels, &mut contents)?;
            Ok((dir.join(file_name(table, report, "csv")), contents))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::common::tests::sample_report;
    use crate::stats::FilterSet;

    fn render(table: Table, labels: TimeLabels) -> String {
        let mut out = Vec::new();
        generate(table, &sample_report(), labels, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_connection_csv() {
        let csv = render(Table::ConnectionStats, TimeLabels::TimeOfDay);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(
            lines[0],
            "time,successful_connections,total_failures,assoc_failures,auth_failures,dhcp_failures,dns_failures"
        );
        assert_eq!(lines[1], "00:00:00,10,3,1,2,0,0");
        assert_eq!(lines[4], "03:00:00,13,6,1,2,0,3");
        assert_eq!(lines.len(), 5);
    }

    #[test]
    fn test_latency_gap_is_blank() {
        let csv = render(Table::LatencyStats, TimeLabels::TimeOfDay);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "time,background_avg_ms,best_effort_avg_ms,video_avg_ms,voice_avg_ms");
        assert_eq!(lines[1], "00:00:00,1.50,2,3,0.25");
        assert_eq!(lines[3], "02:00:00,,,,");
    }

    #[test]
    fn test_client_counts_with_full_timestamps() {
        let csv = render(Table::ClientCounts, TimeLabels::Full);
        let lines: Vec<_> = csv.lines().collect();

        assert_eq!(lines[0], "time,all_bands,2.4GHz,5GHz,6GHz");
        assert_eq!(lines[2], "2024-03-01 01:00:00,21,5,16,");
    }

    #[test]
    fn test_render_all_names_three_files() {
        let files = render_all(&sample_report(), TimeLabels::TimeOfDay, Utf8Path::new("out")).unwrap();

        assert_eq!(files.len(), 3);
        assert_eq!(files[1].0, Utf8Path::new("out/client_counts_2024-03-01_1day_Tag-All_Band-5_SSID-Guest.csv"));
        assert!(String::from_utf8_lossy(&files[1].1).starts_with("time,all_bands,"));
    }

    #[test]
    fn test_render_all_keeps_slashed_ssid_inside_dir() {
        let mut report = sample_report();
        report.filters = FilterSet::new(None, None, Some("Guest/WiFi".to_string()));

        let files = render_all(&report, TimeLabels::TimeOfDay, Utf8Path::new("out")).unwrap();

        for (path, _) in &files {
            assert_eq!(path.parent(), Some(Utf8Path::new("out")));
        }
        assert_eq!(files[0].0.file_name(), Some("connection_stats_2024-03-01_1day_Tag-All_Band-All_SSID-Guest_WiFi.csv"));
    }
}
