use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, info_span};

use audit_ingest::{FileFacts, InputSource, SnapshotExtract, extract_snapshot_to_csv};
use audit_model::ReportConfig;
use audit_report::{ReportBuilder, ReportOutcome};
use audit_transform::{ProgressSink, TracingProgress};

use crate::cli::{ExtractArgs, ReportArgs};

const SNAPSHOT_EXTENSIONS: &[&str] = &["db", "sqlite", "sqlite3"];

pub fn run_report(args: &ReportArgs) -> Result<ReportOutcome> {
    let config = load_config(args)?;
    let mut builder = ReportBuilder::new(config);
    if let Some(dir) = &args.output_dir {
        builder = builder.output_dir(dir);
    }
    let source = input_source(&args.input, args.snapshot);
    builder
        .build(source, &mut TracingProgress)
        .with_context(|| format!("build report from {}", args.input.display()))
}

pub fn run_extract(args: &ExtractArgs) -> Result<SnapshotExtract> {
    let span = info_span!("extract", snapshot = %args.snapshot.display());
    let _guard = span.enter();
    let facts = FileFacts::read(&args.snapshot)
        .with_context(|| format!("read {}", args.snapshot.display()))?;
    let mut progress = TracingProgress;
    for line in facts.describe() {
        progress.message(&line);
    }
    let extract = extract_snapshot_to_csv(&args.snapshot)
        .with_context(|| format!("extract inspection items from {}", args.snapshot.display()))?;
    info!(rows = extract.rows, columns = extract.columns, "snapshot extracted");
    Ok(extract)
}

/// Configuration file (or defaults) with the command-line overrides applied.
pub fn load_config(args: &ReportArgs) -> Result<ReportConfig> {
    let mut config = match &args.config {
        Some(path) => ReportConfig::load(path)
            .with_context(|| format!("load configuration {}", path.display()))?,
        None => ReportConfig::default(),
    };
    if let Some(base_name) = &args.base_name {
        config.base_name.clone_from(base_name);
    }
    if let Some(year) = args.year {
        config.reshape.year = Some(year);
    }
    if let Some(mode) = args.label_mode {
        config.reshape.label_mode = mode.into();
    }
    if args.no_workbook {
        config.write_workbook = false;
    }
    if args.no_database {
        config.write_database = false;
    }
    config.validate().context("validate configuration")?;
    Ok(config)
}

/// Snapshot when forced or when the extension says so, CSV otherwise.
pub fn input_source(path: &Path, force_snapshot: bool) -> InputSource<'_> {
    let by_extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| {
            SNAPSHOT_EXTENSIONS
                .iter()
                .any(|known| ext.eq_ignore_ascii_case(known))
        });
    if force_snapshot || by_extension {
        InputSource::Snapshot(path)
    } else {
        InputSource::Csv(path)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use audit_model::LabelMode;

    use super::*;
    use crate::cli::LabelModeArg;

    fn report_args(input: &str) -> ReportArgs {
        ReportArgs {
            input: PathBuf::from(input),
            snapshot: false,
            config: None,
            base_name: None,
            output_dir: None,
            year: None,
            label_mode: None,
            no_workbook: false,
            no_database: false,
        }
    }

    #[test]
    fn picks_source_from_extension() {
        assert!(matches!(
            input_source(Path::new("export.csv"), false),
            InputSource::Csv(_)
        ));
        assert!(matches!(
            input_source(Path::new("sqlite.DB"), false),
            InputSource::Snapshot(_)
        ));
        assert!(matches!(
            input_source(Path::new("export.bin"), true),
            InputSource::Snapshot(_)
        ));
    }

    #[test]
    fn flags_override_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.toml");
        std::fs::write(&path, "base_name = \"visits\"\nwrite_workbook = true\n").unwrap();

        let mut args = report_args("export.csv");
        args.config = Some(path);
        args.label_mode = Some(LabelModeArg::ItemId);
        args.no_workbook = true;
        args.year = Some(2023);
        let config = load_config(&args).unwrap();
        assert_eq!(config.base_name, "visits");
        assert_eq!(config.reshape.label_mode, LabelMode::WithItemId);
        assert_eq!(config.reshape.year, Some(2023));
        assert!(!config.write_workbook);
        assert!(config.write_database);
    }

    #[test]
    fn blank_base_name_is_rejected() {
        let mut args = report_args("export.csv");
        args.base_name = Some("  ".to_string());
        assert!(load_config(&args).is_err());
    }
}
