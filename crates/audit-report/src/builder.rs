//! Report builder: drives a full run from input file to artifacts.

use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use chrono::Local;
use tracing::{info, info_span, warn};

use audit_ingest::{FileFacts, IngestError, InputSource, load_items};
use audit_model::{ReportConfig, Table};
use audit_transform::{ProgressSink, ReshapeEngine, ReshapeStats};

use crate::csv::write_table_csv;
use crate::error::{ReportError, Result};
use crate::naming::{ArtifactPaths, default_output_dir};
use crate::sqlite::write_snapshot;
use crate::stats::ReportStatistics;
use crate::workbook::write_summary_workbook;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactKind {
    CombinedLabelCsv,
    MainCsv,
    PartsCsv,
    DevicesCsv,
    Database,
    Workbook,
}

impl ArtifactKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::CombinedLabelCsv => "Labeled records (CSV)",
            Self::MainCsv => "Main table (CSV)",
            Self::PartsCsv => "Parts replaced (CSV)",
            Self::DevicesCsv => "Devices (CSV)",
            Self::Database => "Relational snapshot",
            Self::Workbook => "Summary workbook",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArtifactStatus {
    Written,
    /// Partially written; some relations failed.
    Partial,
    Failed,
    Skipped,
}

impl fmt::Display for ArtifactStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Written => "written",
            Self::Partial => "partial",
            Self::Failed => "failed",
            Self::Skipped => "skipped",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub kind: ArtifactKind,
    pub path: PathBuf,
    /// Data rows written, for single-table artifacts.
    pub rows: Option<usize>,
    pub status: ArtifactStatus,
}

/// Everything a run produced.
#[derive(Debug)]
pub struct ReportOutcome {
    pub output_dir: PathBuf,
    pub facts: FileFacts,
    pub audits_in_input: usize,
    pub data_points: usize,
    pub artifacts: Vec<Artifact>,
    /// Failures that did not stop the run.
    pub errors: Vec<ReportError>,
    pub reshape: ReshapeStats,
    pub statistics: ReportStatistics,
    pub elapsed: Duration,
}

impl ReportOutcome {
    pub fn is_success(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn artifact(&self, kind: ArtifactKind) -> Option<&Artifact> {
        self.artifacts.iter().find(|artifact| artifact.kind == kind)
    }
}

/// Runs the reshape engine and writes every artifact of one report.
#[derive(Debug, Clone, Default)]
pub struct ReportBuilder {
    config: ReportConfig,
    output_dir: Option<PathBuf>,
}

impl ReportBuilder {
    pub fn new(config: ReportConfig) -> Self {
        Self {
            config,
            output_dir: None,
        }
    }

    /// Writes into `dir` instead of a timestamped directory next to the input.
    #[must_use]
    pub fn output_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.output_dir = Some(dir.into());
        self
    }

    pub fn config(&self) -> &ReportConfig {
        &self.config
    }

    /// Runs a report over `source`.
    ///
    /// Fails before anything is written when the input cannot be read. Once
    /// output starts, artifact failures are logged and collected in
    /// [`ReportOutcome::errors`] while the remaining artifacts are written.
    pub fn build(
        &self,
        source: InputSource<'_>,
        progress: &mut dyn ProgressSink,
    ) -> Result<ReportOutcome> {
        let start = Instant::now();
        let input = source.path();
        let span = info_span!("report", input = %input.display());
        let _guard = span.enter();
        if !input.is_file() {
            return Err(IngestError::FileNotFound {
                path: input.to_path_buf(),
            }
            .into());
        }

        let mut log = RunLog::new(progress);
        let facts = FileFacts::read(input)?;
        for line in facts.describe() {
            log.message(&line);
        }

        log.status("Reading input...");
        let items = load_items(source)?;
        let audits_in_input = items.audit_count();
        let data_points = items.data_points();
        log.message(&format!(
            "There are {audits_in_input} inspection reports in the file."
        ));
        log.message(&format!("Analyzing {data_points} data points."));

        let output_dir = self
            .output_dir
            .clone()
            .unwrap_or_else(|| default_output_dir(input, Local::now().naive_local()));
        std::fs::create_dir_all(&output_dir).map_err(|source| ReportError::OutputDir {
            path: output_dir.clone(),
            source,
        })?;
        let paths = ArtifactPaths::new(&output_dir, &self.config.base_name);
        info!(output_dir = %output_dir.display(), "writing report");

        log.status("Creating inspections database...");
        log.timestamped("Creating inspections database... This may take a few minutes...");
        let engine = ReshapeEngine::new(self.config.reshape.clone())
            .with_relations(self.config.relations.clone());
        let output = engine.run(items, &mut log);

        let mut artifacts = Vec::new();
        let mut errors = Vec::new();

        let labeled = output.labeled.to_table("combined_label");
        for (kind, table, path) in [
            (ArtifactKind::CombinedLabelCsv, &labeled, paths.combined_label_csv()),
            (ArtifactKind::PartsCsv, &output.parts, paths.parts_csv()),
            (ArtifactKind::DevicesCsv, &output.devices, paths.devices_csv()),
            (ArtifactKind::MainCsv, &output.main, paths.main_csv()),
        ] {
            artifacts.push(write_csv_artifact(kind, table, path, &mut log, &mut errors));
        }

        if self.config.write_database {
            log.status("Creating relational snapshot...");
            artifacts.push(write_database_artifact(
                paths.database(),
                &[&output.main, &output.parts, &output.devices],
                &mut log,
                &mut errors,
            ));
        } else {
            artifacts.push(skipped(ArtifactKind::Database, paths.database()));
        }

        let statistics = ReportStatistics::compute(
            &output.main,
            &self.config.statistics,
            &self.config.reshape.service_date_column,
        );
        for line in statistics.describe() {
            log.message(&line);
        }

        if self.config.write_workbook {
            log.status("Creating summary workbook...");
            let path = paths.workbook();
            let lines = log.lines.clone();
            match write_summary_workbook(&path, &output.main, &output.parts, &output.devices, &lines) {
                Ok(()) => {
                    log.message(&format!(
                        "A summary workbook has been created: {}",
                        path.display()
                    ));
                    artifacts.push(Artifact {
                        kind: ArtifactKind::Workbook,
                        path,
                        rows: None,
                        status: ArtifactStatus::Written,
                    });
                }
                Err(error) => {
                    warn!(%error, "workbook not written");
                    log.message(&format!("Summary workbook failed: {error}"));
                    artifacts.push(Artifact {
                        kind: ArtifactKind::Workbook,
                        path,
                        rows: None,
                        status: ArtifactStatus::Failed,
                    });
                    errors.push(error);
                }
            }
        } else {
            artifacts.push(skipped(ArtifactKind::Workbook, paths.workbook()));
        }

        let elapsed = start.elapsed();
        log.message(&format!("Execution time: {}", format_elapsed(elapsed)));
        log.timestamped("ANALYSIS COMPLETED!");
        log.status("ANALYSIS COMPLETED.");

        Ok(ReportOutcome {
            output_dir,
            facts,
            audits_in_input,
            data_points,
            artifacts,
            errors,
            reshape: output.stats,
            statistics,
            elapsed,
        })
    }
}

fn write_csv_artifact(
    kind: ArtifactKind,
    table: &Table,
    path: PathBuf,
    log: &mut RunLog<'_>,
    errors: &mut Vec<ReportError>,
) -> Artifact {
    match write_table_csv(table, &path) {
        Ok(rows) => {
            log.message(&format!("{} exported to file: {}", kind.label(), path.display()));
            Artifact {
                kind,
                path,
                rows: Some(rows),
                status: ArtifactStatus::Written,
            }
        }
        Err(error) => {
            warn!(%error, artifact = kind.label(), "artifact not written");
            log.message(&format!("{} failed: {error}", kind.label()));
            errors.push(error);
            Artifact {
                kind,
                path,
                rows: None,
                status: ArtifactStatus::Failed,
            }
        }
    }
}

fn write_database_artifact(
    path: PathBuf,
    tables: &[&Table],
    log: &mut RunLog<'_>,
    errors: &mut Vec<ReportError>,
) -> Artifact {
    let status = match write_snapshot(&path, tables) {
        Ok(writes) => {
            let mut failed = 0usize;
            for write in writes {
                match write.result {
                    Ok(rows) => log.message(&format!(
                        "Relation '{}' written with {rows} rows.",
                        write.relation
                    )),
                    Err(error) => {
                        log.message(&format!("Relation '{}' failed: {error}", write.relation));
                        errors.push(error);
                        failed += 1;
                    }
                }
            }
            match failed {
                0 => ArtifactStatus::Written,
                n if n == tables.len() => ArtifactStatus::Failed,
                _ => ArtifactStatus::Partial,
            }
        }
        Err(error) => {
            warn!(%error, "snapshot not written");
            log.message(&format!("Relational snapshot failed: {error}"));
            errors.push(error);
            ArtifactStatus::Failed
        }
    };
    if status != ArtifactStatus::Failed {
        log.message(&format!("Relational snapshot file is: {}", path.display()));
    }
    Artifact {
        kind: ArtifactKind::Database,
        path,
        rows: None,
        status,
    }
}

fn skipped(kind: ArtifactKind, path: PathBuf) -> Artifact {
    Artifact {
        kind,
        path,
        rows: None,
        status: ArtifactStatus::Skipped,
    }
}

/// `1 hours, 2 minutes, 3.40 seconds`, dropping leading zero units.
pub fn format_elapsed(elapsed: Duration) -> String {
    let total = elapsed.as_secs_f64();
    let hours = (total / 3600.0).floor();
    let minutes = ((total - hours * 3600.0) / 60.0).floor();
    let seconds = total - hours * 3600.0 - minutes * 60.0;
    if hours > 0.0 {
        format!("{hours:.0} hours, {minutes:.0} minutes, {seconds:.2} seconds")
    } else if minutes > 0.0 {
        format!("{minutes:.0} minutes, {seconds:.2} seconds")
    } else {
        format!("{seconds:.2} seconds")
    }
}

/// Forwards to the caller's sink and keeps every line for the KPIs sheet.
struct RunLog<'a> {
    inner: &'a mut dyn ProgressSink,
    lines: Vec<String>,
}

impl<'a> RunLog<'a> {
    fn new(inner: &'a mut dyn ProgressSink) -> Self {
        Self {
            inner,
            lines: Vec::new(),
        }
    }
}

impl ProgressSink for RunLog<'_> {
    fn status(&mut self, status: &str) {
        self.inner.status(status);
    }

    fn message(&mut self, text: &str) {
        self.inner.message(text);
        self.lines.push(text.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn formats_elapsed_time() {
        assert_eq!(format_elapsed(Duration::from_millis(3_400)), "3.40 seconds");
        assert_eq!(format_elapsed(Duration::from_secs(125)), "2 minutes, 5.00 seconds");
        assert_eq!(
            format_elapsed(Duration::from_secs(3_725)),
            "1 hours, 2 minutes, 5.00 seconds"
        );
    }

    #[test]
    fn missing_input_fails_before_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out");
        let builder = ReportBuilder::default().output_dir(&out);
        let mut log = audit_transform::ProgressLog::new();
        let result = builder.build(InputSource::Csv(&dir.path().join("missing.csv")), &mut log);
        assert!(matches!(
            result,
            Err(ReportError::Ingest(IngestError::FileNotFound { .. }))
        ));
        assert!(!out.exists());
        assert!(log.lines().is_empty());
    }

    #[test]
    fn input_path_is_used_for_default_dir() {
        let path = Path::new("/data/export.csv");
        let now = Local::now().naive_local();
        assert!(default_output_dir(path, now).starts_with("/data"));
    }
}
