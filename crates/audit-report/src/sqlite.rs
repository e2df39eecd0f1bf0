//! Relational snapshot of the reshaped tables.

use std::path::Path;

use rusqlite::{Connection, params_from_iter};
use tracing::{debug, warn};

use audit_ingest::quote_identifier;
use audit_model::{AnswerValue, Table};

use crate::error::{ReportError, Result};

/// Outcome of writing one relation.
#[derive(Debug)]
pub struct RelationWrite {
    pub relation: String,
    pub result: Result<usize>,
}

/// Writes each table as a relation named after it.
///
/// Relations are written independently: a failure is logged and returned for
/// that relation while the others are still written. Only failing to open the
/// database is an error for the whole call.
pub fn write_snapshot(path: &Path, tables: &[&Table]) -> Result<Vec<RelationWrite>> {
    let mut conn = Connection::open(path).map_err(|source| ReportError::SnapshotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writes = Vec::with_capacity(tables.len());
    for table in tables {
        let result = write_relation(&mut conn, table).map_err(|source| ReportError::Snapshot {
            path: path.to_path_buf(),
            relation: table.name.clone(),
            source,
        });
        match &result {
            Ok(rows) => debug!(relation = %table.name, rows, "wrote relation"),
            Err(error) => warn!(%error, "relation not written"),
        }
        writes.push(RelationWrite {
            relation: table.name.clone(),
            result,
        });
    }
    conn.close().map_err(|(_, source)| ReportError::SnapshotOpen {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(writes)
}

/// Replaces the relation `table.name` with the table's rows. Every column is
/// `TEXT`; missing cells are `NULL`.
fn write_relation(conn: &mut Connection, table: &Table) -> rusqlite::Result<usize> {
    let name = quote_identifier(&table.name);
    let columns: Vec<String> = table.columns.iter().map(|c| quote_identifier(c)).collect();
    let tx = conn.transaction()?;
    tx.execute_batch(&format!("DROP TABLE IF EXISTS {name};"))?;
    let definitions: Vec<String> = columns.iter().map(|c| format!("{c} TEXT")).collect();
    tx.execute_batch(&format!("CREATE TABLE {name} ({});", definitions.join(", ")))?;
    {
        let placeholders = vec!["?"; columns.len()].join(", ");
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO {name} ({}) VALUES ({placeholders})",
            columns.join(", ")
        ))?;
        for row in &table.rows {
            stmt.execute(params_from_iter(row.iter().map(AnswerValue::as_str)))?;
        }
    }
    tx.commit()?;
    Ok(table.height())
}
