//! CLI argument definitions for the inspection report tool.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use clap_verbosity_flag::{InfoLevel, Verbosity};
use colorchoice_clap::Color;

use audit_model::LabelMode;

#[derive(Parser)]
#[command(
    name = "inspection-report",
    version,
    about = "Reshape inspection-audit exports into one row per audit",
    long_about = "Reshape a long-form inspection-audit export (one row per answered question)\n\
                  into a wide table with one row per audit.\n\n\
                  Writes CSV files, a SQLite snapshot and an Excel summary workbook."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Adjust log verbosity (-v for debug, -vv for trace, -q for warnings only).
    #[command(flatten)]
    pub verbosity: Verbosity<InfoLevel>,

    /// Control ANSI color output (auto, always, never).
    #[command(flatten)]
    pub color: Color,

    /// Explicit log level (overrides -v/-q flags).
    #[arg(long = "log-level", value_enum, global = true)]
    pub log_level: Option<LogLevelArg>,

    /// Log output format (pretty for human, json for machine parsing).
    #[arg(
        long = "log-format",
        value_enum,
        default_value = "pretty",
        global = true
    )]
    pub log_format: LogFormatArg,

    /// Write logs to a file instead of stderr.
    #[arg(long = "log-file", value_name = "PATH", global = true)]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Reshape an export and write the report artifacts.
    Report(ReportArgs),

    /// Convert the inspection items of a SQLite snapshot to CSV.
    Extract(ExtractArgs),
}

#[derive(Parser)]
pub struct ReportArgs {
    /// CSV export, or SQLite snapshot (`.db`, `.sqlite`, `.sqlite3`).
    #[arg(value_name = "INPUT")]
    pub input: PathBuf,

    /// Read INPUT as a SQLite snapshot regardless of its extension.
    #[arg(long = "snapshot")]
    pub snapshot: bool,

    /// TOML configuration file; missing keys keep their defaults.
    #[arg(long = "config", value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Shared stem of every output file.
    #[arg(long = "base-name", value_name = "NAME")]
    pub base_name: Option<String>,

    /// Output directory (default: timestamped directory next to INPUT).
    #[arg(long = "output-dir", value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Only keep audits serviced in this calendar year.
    #[arg(long = "year", value_name = "YYYY")]
    pub year: Option<i32>,

    /// How pivot column names are built.
    #[arg(long = "label-mode", value_enum)]
    pub label_mode: Option<LabelModeArg>,

    /// Skip the Excel summary workbook.
    #[arg(long = "no-workbook")]
    pub no_workbook: bool,

    /// Skip the SQLite snapshot.
    #[arg(long = "no-database")]
    pub no_database: bool,
}

#[derive(Parser)]
pub struct ExtractArgs {
    /// SQLite snapshot holding an `inspection_items` relation.
    #[arg(value_name = "SNAPSHOT")]
    pub snapshot: PathBuf,
}

/// CLI label mode choices.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LabelModeArg {
    /// `<parent or category> - <question>`.
    Combined,
    /// Combined label followed by ` - <item id>`.
    ItemId,
}

impl From<LabelModeArg> for LabelMode {
    fn from(value: LabelModeArg) -> Self {
        match value {
            LabelModeArg::Combined => LabelMode::Combined,
            LabelModeArg::ItemId => LabelMode::WithItemId,
        }
    }
}

/// CLI log level choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogLevelArg {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// CLI log format choices.
#[derive(Clone, Copy, ValueEnum)]
pub enum LogFormatArg {
    Pretty,
    Compact,
    Json,
}
