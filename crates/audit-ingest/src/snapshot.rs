//! Relational snapshot (SQLite) reader.
//!
//! The audit platform can export a `.db` snapshot whose `inspection_items`
//! relation has the same columns as the CSV export. The connection is opened
//! read-only and closed before returning.

use std::path::{Path, PathBuf};

use polars::prelude::DataFrame;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};
use tracing::{debug, info};

use audit_model::columns::INSPECTION_ITEMS_RELATION;

use crate::error::{IngestError, Result};
use crate::frame::{frame_from_columns, write_csv};

/// Reads `relation` from the snapshot at `path` into a string frame.
pub fn read_snapshot_relation(path: &Path, relation: &str) -> Result<DataFrame> {
    if !path.is_file() {
        return Err(IngestError::FileNotFound {
            path: path.to_path_buf(),
        });
    }
    let snapshot_error = |source| IngestError::Snapshot {
        path: path.to_path_buf(),
        source,
    };
    let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(snapshot_error)?;

    let tables = list_tables(&conn).map_err(snapshot_error)?;
    debug!(path = %path.display(), tables = ?tables, "snapshot relations");
    if !tables.iter().any(|name| name == relation) {
        return Err(IngestError::MissingRelation {
            relation: relation.to_string(),
            path: path.to_path_buf(),
            available: tables.join(", "),
        });
    }

    let query = format!("SELECT * FROM {}", quote_identifier(relation));
    let mut stmt = conn.prepare(&query).map_err(snapshot_error)?;
    let names: Vec<String> = stmt
        .column_names()
        .into_iter()
        .map(str::to_string)
        .collect();
    let mut values: Vec<Vec<Option<String>>> = vec![Vec::new(); names.len()];
    let mut rows = stmt.query([]).map_err(snapshot_error)?;
    while let Some(row) = rows.next().map_err(snapshot_error)? {
        for (idx, column) in values.iter_mut().enumerate() {
            let value = row.get_ref(idx).map_err(snapshot_error)?;
            column.push(value_to_string(value));
        }
    }
    drop(rows);
    drop(stmt);
    conn.close().map_err(|(_, source)| snapshot_error(source))?;

    frame_from_columns(names.into_iter().zip(values).collect())
}

/// Reads the `inspection_items` relation.
pub fn read_inspection_snapshot(path: &Path) -> Result<DataFrame> {
    read_snapshot_relation(path, INSPECTION_ITEMS_RELATION)
}

/// Output of [`extract_snapshot_to_csv`].
#[derive(Debug, Clone)]
pub struct SnapshotExtract {
    pub csv_path: PathBuf,
    pub rows: usize,
    pub columns: usize,
}

/// Converts the `inspection_items` relation of a snapshot into a CSV file
/// written next to it as `<stem>_inspection_items_dataframe.csv`.
pub fn extract_snapshot_to_csv(path: &Path) -> Result<SnapshotExtract> {
    let mut df = read_inspection_snapshot(path)?;
    let csv_path = snapshot_csv_path(path);
    write_csv(&mut df, &csv_path)?;
    info!(
        snapshot = %path.display(),
        csv = %csv_path.display(),
        rows = df.height(),
        "extracted inspection items"
    );
    Ok(SnapshotExtract {
        csv_path,
        rows: df.height(),
        columns: df.width(),
    })
}

/// Path of the CSV produced by [`extract_snapshot_to_csv`].
pub fn snapshot_csv_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default();
    path.with_file_name(format!(
        "{stem}_{INSPECTION_ITEMS_RELATION}_dataframe.csv"
    ))
}

fn list_tables(conn: &Connection) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
    let names = stmt
        .query_map([], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(names)
}

fn value_to_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(v) => Some(v.to_string()),
        ValueRef::Real(v) => Some(v.to_string()),
        ValueRef::Text(bytes) | ValueRef::Blob(bytes) => {
            Some(String::from_utf8_lossy(bytes).into_owned())
        }
    }
}

/// Quotes an SQL identifier, doubling embedded quotes.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
