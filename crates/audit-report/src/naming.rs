//! Output file naming.
//!
//! Every artifact of a run shares one base name; downstream consumers look the
//! files up by suffix, so the suffixes are fixed.

use std::path::{Path, PathBuf};

use chrono::NaiveDateTime;

/// Paths of every artifact of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    dir: PathBuf,
    base: String,
}

impl ArtifactPaths {
    pub fn new(dir: impl Into<PathBuf>, base: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            base: base.into(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn combined_label_csv(&self) -> PathBuf {
        self.file("_combined_label.csv")
    }

    pub fn main_csv(&self) -> PathBuf {
        self.file(".csv")
    }

    pub fn parts_csv(&self) -> PathBuf {
        self.file("_PartsReplaced.csv")
    }

    pub fn devices_csv(&self) -> PathBuf {
        self.file("_devices.csv")
    }

    pub fn database(&self) -> PathBuf {
        self.file("_database.db")
    }

    pub fn workbook(&self) -> PathBuf {
        self.file("_SUMMARY.xlsx")
    }

    fn file(&self, suffix: &str) -> PathBuf {
        self.dir.join(format!("{}{suffix}", self.base))
    }
}

/// `<input dir>/<dd_Mon_YYYY_HH_MM>`, e.g. `exports/05_Mar_2024_14_07`.
pub fn default_output_dir(input: &Path, now: NaiveDateTime) -> PathBuf {
    let parent = input.parent().unwrap_or_else(|| Path::new("."));
    parent.join(now.format("%d_%b_%Y_%H_%M").to_string())
}
