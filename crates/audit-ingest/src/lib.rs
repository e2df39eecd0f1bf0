//! Ingestion of inspection-audit exports.
//!
//! Two sources produce the same long-form shape: the CSV export and the
//! `inspection_items` relation of a relational snapshot. Both are read into a
//! string-typed polars frame and then converted into typed records.

pub mod error;
pub mod facts;
pub mod frame;
pub mod reader;
pub mod records;
pub mod snapshot;

use std::path::Path;

pub use error::{IngestError, Result};
pub use facts::FileFacts;
pub use frame::{frame_from_columns, string_values, write_csv};
pub use reader::read_csv_frame;
pub use records::items_from_frame;
pub use snapshot::{
    SnapshotExtract, extract_snapshot_to_csv, quote_identifier, read_inspection_snapshot,
    read_snapshot_relation, snapshot_csv_path,
};

use audit_model::InspectionItems;

/// Where the long-form records come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputSource<'a> {
    Csv(&'a Path),
    Snapshot(&'a Path),
}

impl InputSource<'_> {
    pub fn path(&self) -> &Path {
        match self {
            Self::Csv(path) | Self::Snapshot(path) => path,
        }
    }
}

/// Reads inspection records from either source.
pub fn load_items(source: InputSource<'_>) -> Result<InspectionItems> {
    let df = match source {
        InputSource::Csv(path) => read_csv_frame(path)?,
        InputSource::Snapshot(path) => read_inspection_snapshot(path)?,
    };
    items_from_frame(&df)
}
