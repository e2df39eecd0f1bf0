//! Report generation for reshaped inspection audits.
//!
//! - **builder**: runs a report end to end and collects its artifacts
//! - **stats**: blank counts, value frequencies and monthly service counts
//! - **csv**, **sqlite**, **workbook**: the three artifact writers
//! - **naming**: artifact file names derived from one base name

pub mod builder;
pub mod csv;
pub mod error;
pub mod naming;
pub mod sqlite;
pub mod stats;
pub mod workbook;

pub use builder::{
    Artifact, ArtifactKind, ArtifactStatus, ReportBuilder, ReportOutcome, format_elapsed,
};
pub use error::{ReportError, Result};
pub use naming::{ArtifactPaths, default_output_dir};
pub use stats::{ColumnOverview, DateSummary, ReportStatistics};
