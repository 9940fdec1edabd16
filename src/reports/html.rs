//! Self-contained HTML document with one inline SVG line chart per table.

use super::common::{Table, TimeLabels, chart_title, format_cell, tables};
use crate::Result;
use crate::stats::TrendReport;
use core::fmt::Write;

const CHART_WIDTH: f64 = 960.0;
const CHART_HEIGHT: f64 = 360.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 190.0;
const MARGIN_TOP: f64 = 20.0;
const MARGIN_BOTTOM: f64 = 70.0;
const Y_TICKS: u32 = 5;
const MAX_X_LABELS: usize = 12;

const SERIES_COLORS: [&str; 6] = ["#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b"];

pub fn generate<W: Write>(report: &TrendReport, labels: TimeLabels, writer: &mut W) -> Result<()> {
    HtmlGenerator { writer, report, labels }.generate()
}

struct HtmlGenerator<'a, W: Write> {
    writer: &'a mut W,
    report: &'a TrendReport,
    labels: TimeLabels,
}

impl<W: Write> HtmlGenerator<'_, W> {
    fn generate(&mut self) -> Result<()> {
        self.write_header()?;
        for table in tables() {
            self.write_chart(table)?;
        }
        self.write_footer()?;
        Ok(())
    }

    fn write_header(&mut self) -> Result<()> {
        writeln!(self.writer, "<!DOCTYPE html>")?;
        writeln!(self.writer, "<html lang=\"en\">")?;
        writeln!(self.writer, "<head>")?;
        writeln!(self.writer, "<meta charset=\"UTF-8\">")?;
        writeln!(
            self.writer,
            "<title>Wireless trends {} {}</title>",
            self.report.start_date().format("%Y-%m-%d"),
            html_escape(&self.report.filters.signature())
        )?;
        writeln!(self.writer, "<style>")?;
        writeln!(self.writer, ":root {{ color-scheme: light dark; }}")?;
        writeln!(self.writer, "body {{ font-family: sans-serif; margin: 24px; }}")?;
        writeln!(self.writer, "h2 {{ font-size: 1.1em; font-weight: 600; }}")?;
        writeln!(self.writer, "svg {{ max-width: 100%; height: auto; }}")?;
        writeln!(self.writer, "svg text {{ fill: currentColor; font-size: 12px; }}")?;
        writeln!(self.writer, ".grid {{ stroke: #8884; }}")?;
        writeln!(self.writer, ".axis {{ stroke: currentColor; }}")?;
        writeln!(self.writer, "</style>")?;
        writeln!(self.writer, "</head>")?;
        writeln!(self.writer, "<body>")?;
        Ok(())
    }

    fn write_chart(&mut self, table: Table) -> Result<()> {
        let rows = table.rows(self.report);
        let count = rows.len();
        let max = rows.iter().flat_map(|(_, cells)| cells.iter().flatten()).fold(0.0_f64, |acc, &v| acc.max(v));
        let y_max = nice_ceiling(max);

        writeln!(self.writer, "<section>")?;
        writeln!(self.writer, "<h2>{}</h2>", html_escape(&chart_title(table, self.report)))?;
        writeln!(
            self.writer,
            "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 {CHART_WIDTH} {CHART_HEIGHT}\" role=\"img\">"
        )?;

        for tick in 0..=Y_TICKS {
            let value = y_max * f64::from(tick) / f64::from(Y_TICKS);
            let y = y_position(value, y_max);
            writeln!(
                self.writer,
                "<line class=\"grid\" x1=\"{MARGIN_LEFT}\" y1=\"{y:.1}\" x2=\"{:.1}\" y2=\"{y:.1}\"/>",
                CHART_WIDTH - MARGIN_RIGHT
            )?;
            writeln!(
                self.writer,
                "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"end\">{}</text>",
                MARGIN_LEFT - 6.0,
                y + 4.0,
                format_cell(Some(value))
            )?;
        }

        let plot_bottom = CHART_HEIGHT - MARGIN_BOTTOM;
        writeln!(
            self.writer,
            "<line class=\"axis\" x1=\"{MARGIN_LEFT}\" y1=\"{plot_bottom}\" x2=\"{:.1}\" y2=\"{plot_bottom}\"/>",
            CHART_WIDTH - MARGIN_RIGHT
        )?;

        let label_step = count.div_ceil(MAX_X_LABELS).max(1);
        for (index, (window, _)) in rows.iter().enumerate().step_by(label_step) {
            let x = x_position(index, count);
            writeln!(
                self.writer,
                "<text x=\"{x:.1}\" y=\"{:.1}\" text-anchor=\"end\" transform=\"rotate(-35 {x:.1} {:.1})\">{}</text>",
                plot_bottom + 16.0,
                plot_bottom + 16.0,
                html_escape(&self.labels.label(window))
            )?;
        }

        writeln!(
            self.writer,
            "<text x=\"{:.1}\" y=\"{:.1}\" text-anchor=\"middle\">Time</text>",
            (MARGIN_LEFT + CHART_WIDTH - MARGIN_RIGHT) / 2.0,
            CHART_HEIGHT - 6.0
        )?;
        let mid_y = (MARGIN_TOP + plot_bottom) / 2.0;
        writeln!(
            self.writer,
            "<text x=\"16\" y=\"{mid_y:.1}\" text-anchor=\"middle\" transform=\"rotate(-90 16 {mid_y:.1})\">{}</text>",
            html_escape(table.unit_label())
        )?;

        for (series, name) in table.value_columns().iter().enumerate() {
            let color = SERIES_COLORS[series % SERIES_COLORS.len()];
            let values: Vec<_> = rows.iter().map(|(_, cells)| cells.get(series).copied().flatten()).collect();

            for segment in segments(&values) {
                if let [(index, value)] = segment.as_slice() {
                    writeln!(
                        self.writer,
                        "<circle cx=\"{:.1}\" cy=\"{:.1}\" r=\"2.5\" fill=\"{color}\"/>",
                        x_position(*index, count),
                        y_position(*value, y_max)
                    )?;
                } else {
                    let points: Vec<_> = segment
                        .iter()
                        .map(|&(index, value)| format!("{:.1},{:.1}", x_position(index, count), y_position(value, y_max)))
                        .collect();
                    writeln!(
                        self.writer,
                        "<polyline fill=\"none\" stroke=\"{color}\" stroke-width=\"2\" points=\"{}\"/>",
                        points.join(" ")
                    )?;
                }
            }

            let legend_x = CHART_WIDTH - MARGIN_RIGHT + 16.0;
            #[expect(clippy::cast_precision_loss, reason = "at most six series")]
            let legend_y = MARGIN_TOP + 18.0 * series as f64;
            writeln!(
                self.writer,
                "<rect x=\"{legend_x:.1}\" y=\"{legend_y:.1}\" width=\"12\" height=\"12\" fill=\"{color}\"/>"
            )?;
            writeln!(
                self.writer,
                "<text x=\"{:.1}\" y=\"{:.1}\">{}</text>",
                legend_x + 18.0,
                legend_y + 10.0,
                html_escape(name)
            )?;
        }

        writeln!(self.writer, "</svg>")?;
        writeln!(self.writer, "</section>")?;
        Ok(())
    }

    fn write_footer(&mut self) -> Result<()> {
        writeln!(self.writer, "</body>")?;
        writeln!(self.writer, "</html>")?;
        Ok(())
    }
}

/// Horizontal position of the `index`-th of `count` evenly spaced points.
fn x_position(index: usize, count: usize) -> f64 {
    let width = CHART_WIDTH - MARGIN_LEFT - MARGIN_RIGHT;
    if count <= 1 {
        return MARGIN_LEFT + width / 2.0;
    }

    #[expect(clippy::cast_precision_loss, reason = "window counts are small")]
    let fraction = index as f64 / (count - 1) as f64;
    MARGIN_LEFT + width * fraction
}

fn y_position(value: f64, y_max: f64) -> f64 {
    let height = CHART_HEIGHT - MARGIN_TOP - MARGIN_BOTTOM;
    CHART_HEIGHT - MARGIN_BOTTOM - height * (value / y_max)
}

/// Smallest 1, 2, or 5 times a power of ten that is at least `max`.
fn nice_ceiling(max: f64) -> f64 {
    if max <= 0.0 || !max.is_finite() {
        return 1.0;
    }

    let magnitude = 10f64.powf(max.log10().floor());
    let normalized = max / magnitude;
    let nice = [1.0, 2.0, 5.0, 10.0].into_iter().find(|&n| n >= normalized).unwrap_or(10.0);
    nice * magnitude
}

/// Split a series into runs of present values; gaps end a run.
fn segments(values: &[Option<f64>]) -> Vec<Vec<(usize, f64)>> {
    let mut result = Vec::new();
    let mut current = Vec::new();

    for (index, value) in values.iter().enumerate() {
        if let Some(v) = value {
            current.push((index, *v));
        } else if !current.is_empty() {
            result.push(core::mem::take(&mut current));
        }
    }

    if !current.is_empty() {
        result.push(current);
    }

    result
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
