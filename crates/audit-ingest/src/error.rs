//! Error types for inspection export ingestion.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while reading an export.
#[derive(Debug, Error)]
pub enum IngestError {
    // === File System Errors ===
    /// Input file does not exist.
    #[error("input file not found: {path}")]
    FileNotFound { path: PathBuf },

    /// Failed to read file metadata or contents.
    #[error("failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Failed to create an output file.
    #[error("failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // === CSV Errors ===
    /// Failed to parse CSV with Polars.
    #[error("failed to parse CSV {path}: {message}")]
    CsvParse { path: PathBuf, message: String },

    /// Failed to serialize a frame as CSV.
    #[error("failed to write CSV {path}: {message}")]
    CsvWrite { path: PathBuf, message: String },

    // === Snapshot Errors ===
    /// Failed to open or query a snapshot database.
    #[error("snapshot error in {path}: {source}")]
    Snapshot {
        path: PathBuf,
        #[source]
        source: rusqlite::Error,
    },

    /// The snapshot does not contain the expected relation.
    #[error("relation '{relation}' not found in {path} (available: {available})")]
    MissingRelation {
        relation: String,
        path: PathBuf,
        available: String,
    },

    // === DataFrame Errors ===
    /// Required column not found.
    #[error("required column '{column}' not found")]
    MissingColumn { column: String },

    /// Failed DataFrame operation.
    #[error("DataFrame operation failed: {message}")]
    DataFrame { message: String },
}

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
