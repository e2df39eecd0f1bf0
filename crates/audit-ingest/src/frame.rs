//! Polars frame helpers shared by readers and writers.

use std::fs::File;
use std::path::Path;

use polars::prelude::{Column, CsvWriter, DataFrame, DataType, SerWriter};

use crate::error::{IngestError, Result};

/// Reads a column as optional strings, casting non-string columns.
pub fn string_values(df: &DataFrame, name: &str) -> Result<Vec<Option<String>>> {
    let column = df.column(name).map_err(|_| IngestError::MissingColumn {
        column: name.to_string(),
    })?;
    let as_string = column
        .cast(&DataType::String)
        .map_err(|e| IngestError::DataFrame {
            message: format!("cast {name} to string: {e}"),
        })?;
    let chunked = as_string.str().map_err(|e| IngestError::DataFrame {
        message: format!("read {name} as string: {e}"),
    })?;
    Ok(chunked
        .iter()
        .map(|value| value.map(str::to_string))
        .collect())
}

/// Builds a string frame from named columns of equal length.
pub fn frame_from_columns(columns: Vec<(String, Vec<Option<String>>)>) -> Result<DataFrame> {
    let columns: Vec<Column> = columns
        .into_iter()
        .map(|(name, values)| Column::new(name.as_str().into(), values))
        .collect();
    DataFrame::new(columns).map_err(|e| IngestError::DataFrame {
        message: format!("build frame: {e}"),
    })
}

/// Writes a frame as CSV with a header row. Nulls become empty fields.
pub fn write_csv(df: &mut DataFrame, path: &Path) -> Result<()> {
    let mut file = File::create(path).map_err(|source| IngestError::FileWrite {
        path: path.to_path_buf(),
        source,
    })?;
    CsvWriter::new(&mut file)
        .include_header(true)
        .finish(df)
        .map_err(|e| IngestError::CsvWrite {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_frame_and_reads_values_back() {
        let df = frame_from_columns(vec![
            (
                "audit_id".to_string(),
                vec![Some("a1".to_string()), Some("a2".to_string())],
            ),
            ("response".to_string(), vec![Some("Yes".to_string()), None]),
        ])
        .unwrap();
        assert_eq!(df.height(), 2);
        assert_eq!(
            string_values(&df, "response").unwrap(),
            vec![Some("Yes".to_string()), None]
        );
        assert!(matches!(
            string_values(&df, "label"),
            Err(IngestError::MissingColumn { .. })
        ));
    }

    #[test]
    fn duplicate_column_names_are_rejected() {
        let result = frame_from_columns(vec![
            ("a".to_string(), vec![None]),
            ("a".to_string(), vec![None]),
        ]);
        assert!(matches!(result, Err(IngestError::DataFrame { .. })));
    }

    #[test]
    fn writes_csv_with_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut df = frame_from_columns(vec![
            ("a".to_string(), vec![Some("1".to_string()), None]),
            ("b".to_string(), vec![Some("x".to_string()), Some("y".to_string())]),
        ])
        .unwrap();
        write_csv(&mut df, &path).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = written.lines().collect();
        assert_eq!(lines, vec!["a,b", "1,x", ",y"]);
    }
}
