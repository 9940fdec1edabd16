//! Report generation for collected wireless trends
//!
//! Every generator works from the same input, a [`TrendReport`](crate::stats::TrendReport)
//! whose three row collections are already sorted and aligned by window.
//!
//! # Implementation Model
//!
//! - **CSV**: one file per table, named after the run's start date, length, and filters
//! - **HTML**: a self-contained page with one inline SVG line chart per table
//! - **Excel**: a workbook with one sheet per table
//! - **Console**: a short colored summary of totals, peaks, and averages
//!
//! Missing values (latency windows without data, client counts the controller left
//! null) are rendered as empty cells and as breaks in chart lines, never as zero.

mod common;
mod console;
mod csv;
mod excel;
mod html;

pub use common::{Table, TimeLabels, chart_title, file_name};
pub use console::generate as generate_console;
pub use self::csv::generate as generate_csv;
pub use self::csv::render_all as render_csv_files;
pub use excel::generate as generate_xlsx;
pub use html::generate as generate_html;
