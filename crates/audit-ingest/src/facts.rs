//! File facts logged before a run.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};

use crate::error::{IngestError, Result};

/// Size and timestamps of an input file.
#[derive(Debug, Clone)]
pub struct FileFacts {
    pub path: PathBuf,
    pub size_bytes: u64,
    pub modified: Option<DateTime<Local>>,
    /// Creation time; falls back to the modification time where the platform has none.
    pub created: Option<DateTime<Local>>,
}

impl FileFacts {
    pub fn read(path: &Path) -> Result<Self> {
        let metadata = std::fs::metadata(path).map_err(|source| IngestError::FileRead {
            path: path.to_path_buf(),
            source,
        })?;
        let modified = metadata.modified().ok().map(DateTime::<Local>::from);
        let created = metadata
            .created()
            .ok()
            .map(DateTime::<Local>::from)
            .or(modified);
        Ok(Self {
            path: path.to_path_buf(),
            size_bytes: metadata.len(),
            modified,
            created,
        })
    }

    pub fn size_mb(&self) -> f64 {
        self.size_bytes as f64 / (1024.0 * 1024.0)
    }

    /// Human-readable lines for the run log.
    pub fn describe(&self) -> Vec<String> {
        let stamp = |value: Option<DateTime<Local>>| {
            value.map_or_else(
                || "unknown".to_string(),
                |time| time.format("%Y-%m-%d %H:%M:%S").to_string(),
            )
        };
        vec![
            format!("File selected: {}", self.path.display()),
            format!("File size: {:.2} MB", self.size_mb()),
            format!("Last modified: {}", stamp(self.modified)),
            format!("Created: {}", stamp(self.created)),
        ]
    }
}
