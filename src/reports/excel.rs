//! Excel report generation.

use super::common::{TimeLabels, tables};
use crate::Result;
use crate::stats::TrendReport;
use rust_xlsxwriter::{Format, Workbook};
use std::io::Write;

/// Generate a workbook with one sheet per table.
///
/// # Errors
///
/// Returns an error if the workbook cannot be built or written
#[expect(unused_results, reason = "rust_xlsxwriter methods return &mut Worksheet for chaining")]
pub fn generate<W: Write>(report: &TrendReport, labels: TimeLabels, writer: &mut W) -> Result<()> {
    let mut workbook = Workbook::new();
    let bold = Format::new().set_bold();
    let decimal = Format::new().set_num_format("0.00");

    for table in tables() {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(table.title())?;

        worksheet.write_string_with_format(0, 0, "time", &bold)?;
        for (col, header) in table.value_columns().iter().enumerate() {
            worksheet.write_string_with_format(0, u16::try_from(col + 1)?, *header, &bold)?;
        }

        for (row, (window, cells)) in table.rows(report).into_iter().enumerate() {
            let r = u32::try_from(row + 1)?;
            worksheet.write_string(r, 0, labels.label(&window))?;
            for (col, cell) in cells.into_iter().enumerate() {
                // gaps stay empty cells
                if let Some(value) = cell {
                    let c = u16::try_from(col + 1)?;
                    if value.fract() == 0.0 {
                        worksheet.write_number(r, c, value)?;
                    } else {
                        worksheet.write_number_with_format(r, c, value, &decimal)?;
                    }
                }
            }
        }

        worksheet.set_freeze_panes(1, 0)?;
        worksheet.autofit();
    }

    let buffer = workbook.save_to_buffer()?;
    writer.write_all(&buffer)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::common::tests::sample_report;
    use std::io::Cursor;

    #[test]
    fn test_workbook_is_written() {
        let mut output = Cursor::new(Vec::new());
        generate(&sample_report(), TimeLabels::TimeOfDay, &mut output).unwrap();

        let bytes = output.into_inner();
        assert!(bytes.len() > 1000, "Excel output should be substantial");
        assert_eq!(&bytes[0..2], b"PK", "Excel file should be a valid ZIP archive");
    }
}
