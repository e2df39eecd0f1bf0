//! Repeating-group extraction.
//!
//! Forms collapse variable-length lists into fixed columns such as
//! `Device 1 - Serial Number`, `Device 2 - Serial Number`. Extraction turns
//! them back into a child table with one row per (parent row, group index).

use regex::Regex;
use tracing::debug;

use audit_model::{AnswerValue, RepeatingGroupSpec, Table};

use crate::error::{Result, TransformError};

/// Child table produced by [`extract_repeating_group`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GroupExtraction {
    pub table: Table,
    /// Largest group index found in the source columns.
    pub group_count: usize,
    /// (parent row, index) pairs skipped because every group field was empty.
    pub empty_groups: usize,
}

/// Largest `i` among columns named `<prefix> <i> - <field>`.
pub fn max_group_index(columns: &[String], prefix: &str) -> Result<usize> {
    let pattern = group_pattern(prefix)?;
    Ok(columns
        .iter()
        .filter_map(|column| pattern.captures(column))
        .filter_map(|captures| captures.get(1)?.as_str().parse::<usize>().ok())
        .max()
        .unwrap_or(0))
}

/// Extracts the group described by `spec` from `source`.
///
/// Child columns are `key_column`, the group fields, then the passthrough
/// columns. For each source row and each index in `1..=N` a child row is
/// emitted unless all of its group fields are empty. Absent columns read as
/// empty.
pub fn extract_repeating_group(
    source: &Table,
    key_column: &str,
    spec: &RepeatingGroupSpec,
    name: &str,
) -> Result<GroupExtraction> {
    let key_idx = source
        .column_index(key_column)
        .ok_or_else(|| TransformError::MissingColumn {
            column: key_column.to_string(),
            table: source.name.clone(),
        })?;
    let group_count = max_group_index(&source.columns, &spec.prefix)?;

    let lookup = source.column_lookup();
    let passthrough: Vec<Option<usize>> = spec
        .passthrough
        .iter()
        .map(|column| lookup.get(column.as_str()).copied())
        .collect();
    for (column, idx) in spec.passthrough.iter().zip(&passthrough) {
        if idx.is_none() {
            debug!(column = %column, group = %spec.prefix, "passthrough column absent");
        }
    }
    // Positions of each group field, per index.
    let fields: Vec<Vec<Option<usize>>> = (1..=group_count)
        .map(|index| {
            spec.suffixes
                .iter()
                .map(|suffix| lookup.get(spec.column_name(index, suffix).as_str()).copied())
                .collect()
        })
        .collect();

    let mut columns = Vec::with_capacity(1 + spec.suffixes.len() + spec.passthrough.len());
    columns.push(key_column.to_string());
    columns.extend(spec.suffixes.iter().cloned());
    columns.extend(spec.passthrough.iter().cloned());
    let mut table = Table::new(name, columns);

    let cell = |row: &[AnswerValue], idx: Option<usize>| {
        idx.and_then(|idx| row.get(idx))
            .cloned()
            .unwrap_or_default()
    };
    let mut empty_groups = 0usize;
    for row in &source.rows {
        let row = row.as_slice();
        for positions in &fields {
            let values: Vec<AnswerValue> = positions.iter().map(|idx| cell(row, *idx)).collect();
            if values.iter().all(AnswerValue::is_missing) {
                empty_groups += 1;
                continue;
            }
            let mut child = Vec::with_capacity(table.width());
            child.push(row[key_idx].clone());
            child.extend(values);
            child.extend(passthrough.iter().map(|idx| cell(row, *idx)));
            table.push_row(child);
        }
    }

    debug!(
        group = %spec.prefix,
        group_count,
        rows = table.height(),
        empty_groups,
        "extracted repeating group"
    );
    Ok(GroupExtraction {
        table,
        group_count,
        empty_groups,
    })
}

fn group_pattern(prefix: &str) -> Result<Regex> {
    Regex::new(&format!(r"^{} (\d+) - ", regex::escape(prefix))).map_err(|source| {
        TransformError::GroupPattern {
            prefix: prefix.to_string(),
            source,
        }
    })
}
