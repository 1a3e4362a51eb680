//! Workbook export
//!
//! Writes a [`Report`] as an in-memory `.xlsx` document.

use super::{ObjectKind, Report, SUMMARY_HEADER, SUMMARY_SHEET};
use rust_xlsxwriter::{Color, Format, Workbook, XlsxError};
use std::borrow::Cow;
use tracing::{debug, warn};

/// Longest text a single cell can hold, in characters
pub const MAX_CELL_CHARS: usize = 32_767;

/// Appended to cell text cut at [`MAX_CELL_CHARS`]
pub const TRUNCATION_MARKER: &str = " ... [truncated]";

/// Fit text into one cell, cutting on a character boundary and marking the cut
pub fn clamp_cell(text: &str) -> Cow<'_, str> {
    if text.chars().count() <= MAX_CELL_CHARS {
        return Cow::Borrowed(text);
    }

    let keep = MAX_CELL_CHARS - TRUNCATION_MARKER.chars().count();
    let cut = text.char_indices().nth(keep).map_or(text.len(), |(i, _)| i);
    warn!("Truncating cell text of {} characters", text.chars().count());
    Cow::Owned(format!("{}{}", &text[..cut], TRUNCATION_MARKER))
}

/// Serialize the report into workbook bytes
pub fn write_xlsx(report: &Report) -> Result<Vec<u8>, XlsxError> {
    let mut workbook = Workbook::new();

    let header = Format::new()
        .set_bold()
        .set_background_color(Color::RGB(0xDDDDDD));

    let summary = workbook.add_worksheet();
    summary.set_name(SUMMARY_SHEET)?;
    for (col, title) in SUMMARY_HEADER.iter().enumerate() {
        summary.write_string_with_format(0, col as u16, *title, &header)?;
    }
    for (i, row) in report.summary.iter().enumerate() {
        let r = i as u32 + 1;
        summary.write_string(r, 0, row.kind.summary_label())?;
        summary.write_number(r, 1, row.count as f64)?;
        summary.write_string(r, 2, clamp_cell(&row.objects))?;
    }
    summary.set_column_width(0, 25)?;
    summary.set_column_width(1, 25)?;
    summary.set_column_width(2, 60)?;

    for sheet in &report.sheets {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(&sheet.sheet_name)?;

        for (r, cells) in sheet.rows().iter().enumerate() {
            for (c, value) in cells.iter().enumerate() {
                worksheet.write_string(r as u32, c as u16, clamp_cell(value))?;
            }
        }

        worksheet.set_column_width(0, 30)?;
        if matches!(sheet.body.kind(), ObjectKind::Table | ObjectKind::View) {
            for col in 1..=4 {
                worksheet.set_column_width(col, 20)?;
            }
        }
    }

    let bytes = workbook.save_to_buffer()?;
    debug!(
        "Wrote workbook for '{}': {} sheet(s), {} bytes",
        report.selected_table,
        report.sheets.len() + 1,
        bytes.len()
    );
    Ok(bytes)
}
