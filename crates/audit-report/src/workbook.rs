//! Summary workbook: one sheet per table plus the run log.

use std::path::Path;

use rust_xlsxwriter::{Color, Format, Workbook, Worksheet, XlsxError};
use tracing::{debug, warn};

use audit_model::Table;

use crate::error::{ReportError, Result};

/// Longest string a worksheet cell can hold.
pub const MAX_CELL_CHARS: usize = 32_767;

pub const MAIN_SHEET: &str = "Main";
pub const PARTS_SHEET: &str = "Parts Replaced";
pub const DEVICES_SHEET: &str = "Devices";
pub const KPI_SHEET: &str = "KPIs";

/// Writes the main, parts and devices tables and the run log to `path`.
///
/// Table sheets get a bold, frozen header row. The run log goes to column A of
/// the KPIs sheet, one line per row, starting at row 2.
pub fn write_summary_workbook(
    path: &Path,
    main: &Table,
    parts: &Table,
    devices: &Table,
    log_lines: &[String],
) -> Result<()> {
    let workbook_error = |source| ReportError::Workbook {
        path: path.to_path_buf(),
        source,
    };
    let mut workbook = Workbook::new();
    let header = Format::new().set_bold();

    for (sheet, table, color) in [
        (MAIN_SHEET, main, Some(Color::Yellow)),
        (PARTS_SHEET, parts, None),
        (DEVICES_SHEET, devices, None),
    ] {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(sheet).map_err(workbook_error)?;
        write_table(worksheet, table, &header).map_err(workbook_error)?;
        if let Some(color) = color {
            worksheet.set_tab_color(color);
        }
    }

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(KPI_SHEET).map_err(workbook_error)?;
    worksheet
        .write_string_with_format(0, 0, "Run log", &header)
        .map_err(workbook_error)?;
    for (idx, line) in log_lines.iter().enumerate() {
        let row = u32::try_from(idx + 1)
            .map_err(|_| workbook_error(XlsxError::RowColumnLimitError))?;
        worksheet
            .write_string(row, 0, truncate(line))
            .map_err(workbook_error)?;
    }
    worksheet.set_tab_color(Color::Blue);

    workbook.save(path).map_err(workbook_error)?;
    debug!(path = %path.display(), log_lines = log_lines.len(), "wrote workbook");
    Ok(())
}

fn write_table(
    worksheet: &mut Worksheet,
    table: &Table,
    header: &Format,
) -> std::result::Result<(), XlsxError> {
    for (col, name) in table.columns.iter().enumerate() {
        let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
        worksheet.write_string_with_format(0, col, truncate(name), header)?;
    }
    let mut truncated = 0usize;
    for (row_idx, row) in table.rows.iter().enumerate() {
        let row_num = u32::try_from(row_idx + 1).map_err(|_| XlsxError::RowColumnLimitError)?;
        for (col, value) in row.iter().enumerate() {
            let Some(text) = value.as_str() else {
                continue;
            };
            let col = u16::try_from(col).map_err(|_| XlsxError::RowColumnLimitError)?;
            if text.chars().count() > MAX_CELL_CHARS {
                truncated += 1;
            }
            worksheet.write_string(row_num, col, truncate(text))?;
        }
    }
    if truncated > 0 {
        warn!(table = %table.name, cells = truncated, "cells truncated to the worksheet limit");
    }
    worksheet.set_freeze_panes(1, 0)?;
    Ok(())
}

fn truncate(text: &str) -> &str {
    match text.char_indices().nth(MAX_CELL_CHARS) {
        Some((end, _)) => &text[..end],
        None => text,
    }
}
