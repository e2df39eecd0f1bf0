use std::io;
use std::path::PathBuf;

use thiserror::Error;

use audit_ingest::IngestError;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to create output directory {path}: {source}")]
    OutputDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error(transparent)]
    Ingest(#[from] IngestError),
    #[error("failed to write relation '{relation}' to {path}: {source}")]
    Snapshot {
        path: PathBuf,
        relation: String,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to open snapshot {path}: {source}")]
    SnapshotOpen {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },
    #[error("failed to write workbook {path}: {source}")]
    Workbook {
        path: PathBuf,
        #[source]
        source: rust_xlsxwriter::XlsxError,
    },
}

pub type Result<T> = std::result::Result<T, ReportError>;
