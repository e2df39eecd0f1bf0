//! CSV artifacts.

use std::path::Path;

use polars::prelude::DataFrame;
use tracing::debug;

use audit_ingest::{frame_from_columns, write_csv};
use audit_model::{AnswerValue, Table};

use crate::error::Result;

/// Converts a table into a string frame; missing cells become nulls.
pub fn table_to_frame(table: &Table) -> Result<DataFrame> {
    let columns: Vec<(String, Vec<Option<String>>)> = table
        .columns
        .iter()
        .enumerate()
        .map(|(idx, name)| {
            let values: Vec<Option<String>> = table
                .rows
                .iter()
                .map(|row| row.get(idx).and_then(AnswerValue::as_str).map(str::to_string))
                .collect();
            (name.clone(), values)
        })
        .collect();
    Ok(frame_from_columns(columns)?)
}

/// Writes `table` to `path` with a header row; returns the number of data rows.
pub fn write_table_csv(table: &Table, path: &Path) -> Result<usize> {
    let mut df = table_to_frame(table)?;
    write_csv(&mut df, path)?;
    debug!(
        table = %table.name,
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "wrote csv"
    );
    Ok(df.height())
}
