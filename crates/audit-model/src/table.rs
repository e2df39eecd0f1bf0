use std::collections::HashMap;

use crate::record::AnswerValue;

/// A named, row-major table of answer cells.
///
/// Used for every reshaped output: the wide table and its child tables.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    pub name: String,
    pub columns: Vec<String>,
    pub rows: Vec<Vec<AnswerValue>>,
}

impl Table {
    pub fn new(name: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            name: name.into(),
            columns,
            rows: Vec::new(),
        }
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn width(&self) -> usize {
        self.columns.len()
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|column| column == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.column_index(name).is_some()
    }

    /// Column name to position lookup for repeated access.
    pub fn column_lookup(&self) -> HashMap<&str, usize> {
        self.columns
            .iter()
            .enumerate()
            .map(|(idx, name)| (name.as_str(), idx))
            .collect()
    }

    /// Appends a row. Short rows are padded with missing cells.
    pub fn push_row(&mut self, mut row: Vec<AnswerValue>) {
        row.resize(self.columns.len(), AnswerValue::Missing);
        self.rows.push(row);
    }

    pub fn value(&self, row: usize, column: &str) -> Option<&AnswerValue> {
        let idx = self.column_index(column)?;
        self.rows.get(row).and_then(|cells| cells.get(idx))
    }

    /// Cells of one column, `None` if the column does not exist.
    pub fn column_values(&self, column: &str) -> Option<Vec<&AnswerValue>> {
        let idx = self.column_index(column)?;
        Some(self.rows.iter().map(|row| &row[idx]).collect())
    }

    /// Appends a column, one value per row.
    pub fn push_column(&mut self, name: impl Into<String>, values: Vec<AnswerValue>) {
        self.columns.push(name.into());
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row.push(values.next().unwrap_or_default());
        }
    }

    /// Replaces the cells of an existing column. Returns false if it does not exist.
    pub fn replace_column(&mut self, name: &str, values: Vec<AnswerValue>) -> bool {
        let Some(idx) = self.column_index(name) else {
            return false;
        };
        let mut values = values.into_iter();
        for row in &mut self.rows {
            row[idx] = values.next().unwrap_or_default();
        }
        true
    }

    /// Removes every column whose name starts with `prefix`; returns how many were removed.
    pub fn drop_columns_with_prefix(&mut self, prefix: &str) -> usize {
        let keep: Vec<bool> = self
            .columns
            .iter()
            .map(|column| !column.starts_with(prefix))
            .collect();
        let removed = keep.iter().filter(|kept| !**kept).count();
        if removed == 0 {
            return 0;
        }
        self.columns = retain_by_mask(std::mem::take(&mut self.columns), &keep);
        for row in &mut self.rows {
            *row = retain_by_mask(std::mem::take(row), &keep);
        }
        removed
    }
}

fn retain_by_mask<T>(values: Vec<T>, keep: &[bool]) -> Vec<T> {
    values
        .into_iter()
        .zip(keep)
        .filter_map(|(value, kept)| kept.then_some(value))
        .collect()
}
