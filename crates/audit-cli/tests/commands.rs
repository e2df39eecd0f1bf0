//! Command runs driven through parsed arguments.

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use rusqlite::Connection;

use audit_cli::cli::{Cli, Command};
use audit_cli::commands::{run_extract, run_report};
use audit_report::{ArtifactKind, ArtifactStatus};

const HEADER: &str = "audit_id,item_id,item_index,parent_ids,label,category,type,response";

fn write_export(dir: &Path) -> PathBuf {
    let lines = [
        HEADER,
        "a1,sec,1,root,General,General,section,",
        "a1,date,2,\"root,sec\",Service Date (YYYY-MM-DD)*,General,datetime,2023-05-02T08:00:00Z",
        "a1,model,3,\"root,sec\",Model,General,question,X100",
        "a2,date,1,\"root,sec\",Service Date (YYYY-MM-DD)*,General,datetime,2024-06-01T09:30:00Z",
        "a2,model,2,\"root,sec\",Model,General,question,X200",
    ];
    let path = dir.join("export.csv");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

fn parse(args: &[&str]) -> Command {
    let mut argv = vec!["inspection-report"];
    argv.extend_from_slice(args);
    Cli::try_parse_from(argv).unwrap().command
}

#[test]
fn report_honours_skip_flags() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(dir.path());
    let out = dir.path().join("out");
    let Command::Report(args) = parse(&[
        "report",
        input.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--base-name",
        "visits",
        "--no-workbook",
        "--no-database",
    ]) else {
        panic!("expected report command");
    };

    let outcome = run_report(&args).unwrap();
    assert!(outcome.is_success());
    assert_eq!(outcome.reshape.audits, 2);
    assert!(out.join("visits.csv").is_file());
    assert!(!out.join("visits_SUMMARY.xlsx").exists());
    assert!(!out.join("visits_database.db").exists());
    let workbook = outcome.artifact(ArtifactKind::Workbook);
    assert!(workbook.is_none_or(|artifact| artifact.status == ArtifactStatus::Skipped));
}

#[test]
fn report_year_filter_keeps_one_audit() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(dir.path());
    let out = dir.path().join("out");
    let Command::Report(args) = parse(&[
        "report",
        input.to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
        "--year",
        "2024",
        "--no-workbook",
    ]) else {
        panic!("expected report command");
    };

    let outcome = run_report(&args).unwrap();
    assert_eq!(outcome.reshape.audits, 1);
    let main = fs::read_to_string(out.join("inspection_report.csv")).unwrap();
    let rows: Vec<&str> = main.lines().skip(1).collect();
    assert_eq!(rows.len(), 1);
    assert!(rows[0].starts_with("a2,"));
}

#[test]
fn missing_input_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("out");
    let Command::Report(args) = parse(&[
        "report",
        dir.path().join("missing.csv").to_str().unwrap(),
        "--output-dir",
        out.to_str().unwrap(),
    ]) else {
        panic!("expected report command");
    };

    let error = run_report(&args).unwrap_err();
    assert!(format!("{error:#}").contains("missing.csv"));
    assert!(!out.exists());
}

#[test]
fn extract_writes_csv_next_to_snapshot() {
    let dir = tempfile::tempdir().unwrap();
    let snapshot = dir.path().join("site.db");
    let conn = Connection::open(&snapshot).unwrap();
    conn.execute_batch(
        "CREATE TABLE inspection_items (
            audit_id TEXT, item_id TEXT, item_index INTEGER, parent_ids TEXT,
            label TEXT, category TEXT, type TEXT, response TEXT
        );
        INSERT INTO inspection_items VALUES
            ('a1', 'model', 1, 'root', 'Model', 'General', 'question', 'X100');",
    )
    .unwrap();
    drop(conn);

    let Command::Extract(args) = parse(&["extract", snapshot.to_str().unwrap()]) else {
        panic!("expected extract command");
    };
    let extract = run_extract(&args).unwrap();
    assert_eq!(extract.rows, 1);
    assert_eq!(
        extract.csv_path,
        dir.path().join("site_inspection_items_dataframe.csv")
    );
    assert!(extract.csv_path.is_file());
}
