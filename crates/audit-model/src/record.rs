//! Long-form inspection records.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An answer cell as it came out of the export.
///
/// The export carries text, numbers and timestamps in the same column and only
/// the question decides which one applies. Values are therefore kept verbatim
/// and interpreted by whichever step consumes them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AnswerValue {
    #[default]
    Missing,
    Raw(String),
}

impl AnswerValue {
    /// Wraps a raw cell; blank and whitespace-only cells become `Missing`.
    pub fn from_raw(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.trim().is_empty() {
            Self::Missing
        } else {
            Self::Raw(value)
        }
    }

    /// Wraps an optional cell.
    pub fn from_option(value: Option<String>) -> Self {
        value.map_or(Self::Missing, Self::from_raw)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Missing => None,
            Self::Raw(value) => Some(value.as_str()),
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Self::Missing)
    }

    /// Cell text, empty for missing values.
    pub fn to_cell(&self) -> String {
        self.as_str().unwrap_or_default().to_string()
    }
}

impl fmt::Display for AnswerValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str().unwrap_or_default())
    }
}

impl From<&str> for AnswerValue {
    fn from(value: &str) -> Self {
        Self::from_raw(value)
    }
}

impl From<String> for AnswerValue {
    fn from(value: String) -> Self {
        Self::from_raw(value)
    }
}

/// Kind of an inspection item.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordType {
    Information,
    Section,
    Signature,
    Question,
    /// Any other item type (`text`, `datetime`, `list`, ...), kept verbatim.
    Other(String),
}

impl RecordType {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "information" => Self::Information,
            "section" => Self::Section,
            "signature" => Self::Signature,
            "question" => Self::Question,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Information => "information",
            Self::Section => "section",
            Self::Signature => "signature",
            Self::Question => "question",
            Self::Other(value) => value.as_str(),
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One row of the long-form export: a single item of a single audit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QuestionRecord {
    pub audit_id: String,
    pub item_id: String,
    /// Raw comma-joined parent list as exported.
    pub parent_ids: Option<String>,
    pub record_type: RecordType,
    pub category: Option<String>,
    pub label: Option<String>,
    pub response: AnswerValue,
    pub item_index: Option<i64>,
    /// Values of the non-core columns, aligned with [`InspectionItems::extra_columns`].
    pub extra: Vec<AnswerValue>,
    /// Source row cells as read, aligned with [`InspectionItems::columns`].
    /// Empty for records built in code.
    pub raw_cells: Vec<Option<String>>,
}

impl QuestionRecord {
    /// Parent identifiers in export order. Entries are trimmed; positions are kept.
    pub fn parent_id_list(&self) -> Vec<&str> {
        match self.parent_ids.as_deref() {
            Some(raw) if !raw.trim().is_empty() => raw.split(',').map(str::trim).collect(),
            _ => Vec::new(),
        }
    }

    /// Question text, `None` when blank.
    pub fn question_text(&self) -> Option<&str> {
        self.label.as_deref().filter(|label| !label.trim().is_empty())
    }
}

/// The long-form table: records plus the layout of the columns they came from.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InspectionItems {
    /// Column names in input order, core columns included.
    pub columns: Vec<String>,
    /// Names of the non-core columns, in input order.
    pub extra_columns: Vec<String>,
    pub records: Vec<QuestionRecord>,
}

impl InspectionItems {
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Number of distinct audit identifiers.
    pub fn audit_count(&self) -> usize {
        let mut ids: Vec<&str> = self
            .records
            .iter()
            .map(|record| record.audit_id.as_str())
            .collect();
        ids.sort_unstable();
        ids.dedup();
        ids.len()
    }

    /// Cells in the input (rows times columns).
    pub fn data_points(&self) -> usize {
        self.records.len() * self.columns.len()
    }

    /// Keeps only the records whose audit id satisfies `keep`.
    pub fn retain_audits(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.records.retain(|record| keep(&record.audit_id));
    }
}
