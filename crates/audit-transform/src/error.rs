use thiserror::Error;

/// Why a combined label could not be derived for a record.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LabelError {
    #[error("record {item_id} of audit {audit_id} has no question text")]
    EmptyQuestion { audit_id: String, item_id: String },
    #[error(
        "record {item_id} of audit {audit_id} matches '{marker}' but has {found} parent id(s); \
         at least two are required to read entry {position}"
    )]
    ParentIdMissing {
        audit_id: String,
        item_id: String,
        marker: String,
        position: usize,
        found: usize,
    },
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("column '{column}' not found in {table}")]
    MissingColumn { column: String, table: String },
    #[error("invalid repeating group prefix '{prefix}': {source}")]
    GroupPattern {
        prefix: String,
        #[source]
        source: regex::Error,
    },
    #[error(transparent)]
    Label(#[from] LabelError),
}

pub type Result<T> = std::result::Result<T, TransformError>;
