//! CSV export reader.

use std::path::Path;

use polars::prelude::{CsvReadOptions, DataFrame, SerReader};
use tracing::debug;

use crate::error::{IngestError, Result};

/// Reads a CSV export into a frame with every column typed as string.
///
/// Answers mix text, numbers and timestamps in one column, so no schema
/// inference is attempted.
pub fn read_csv_frame(path: &Path) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let df = CsvReadOptions::default()
        .with_has_header(true)
        .with_infer_schema_length(Some(0))
        .try_into_reader_with_file_path(Some(path.to_path_buf()))
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?
        .finish()
        .map_err(|e| IngestError::CsvParse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
    debug!(
        path = %path.display(),
        rows = df.height(),
        columns = df.width(),
        "read csv export"
    );
    Ok(df)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    use crate::frame::string_values;

    fn create_temp_csv(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", content).unwrap();
        file
    }

    #[test]
    fn reads_everything_as_strings() {
        let file = create_temp_csv("audit_id,item_index,response\na1,1,3.50\na1,2,\n");
        let df = read_csv_frame(file.path()).unwrap();
        assert_eq!(df.height(), 2);
        let responses = string_values(&df, "response").unwrap();
        assert_eq!(responses[0].as_deref(), Some("3.50"));
        assert!(responses[1].as_deref().unwrap_or_default().is_empty());
        assert_eq!(
            string_values(&df, "item_index").unwrap(),
            vec![Some("1".to_string()), Some("2".to_string())]
        );
    }

    #[test]
    fn missing_file_is_reported() {
        let error = read_csv_frame(Path::new("/nonexistent/export.csv")).unwrap_err();
        assert!(matches!(error, IngestError::FileNotFound { .. }));
    }
}
