//! End-to-end report runs over a small export.

use std::fs;
use std::path::Path;

use audit_ingest::InputSource;
use audit_model::ReportConfig;
use audit_report::{ArtifactKind, ArtifactStatus, ReportBuilder};
use audit_transform::ProgressLog;
use rusqlite::Connection;

const HEADER: &str = "audit_id,item_id,item_index,parent_ids,label,category,type,response";

fn export_rows(audit: &str, date: &str, model: &str, anomaly: &str) -> Vec<String> {
    vec![
        format!("{audit},sec,1,root,General Information,General Information,section,"),
        format!("{audit},info,2,\"root,sec\",Read the manual,General Information,information,"),
        format!("{audit},date,3,\"root,sec\",Service Date (YYYY-MM-DD)*,General Information,datetime,{date}"),
        format!("{audit},model,4,\"root,sec\",Model,General Information,question,{model}"),
        format!("{audit},fan,5,\"root,sec\",Fan noise,Cooling,question,Yes"),
        format!("{audit},anom,6,\"sec,fan\",Anomaly?,Cooling,question,{anomaly}"),
        format!("{audit},dev,7,root,Serial Number,Device 1,text,TOOL-{audit}"),
    ]
}

fn write_export(dir: &Path) -> std::path::PathBuf {
    let mut lines = vec![HEADER.to_string()];
    lines.extend(export_rows("audit_2", "2024-11-12T14:01:35Z", "X200", "Rattle"));
    lines.extend(export_rows("audit_1", "2024-10-11T05:58:03.949Z", "X100", ""));
    lines.extend(export_rows("audit_3", "not-a-date", "X100", "Loud"));
    let path = dir.join("export.csv");
    fs::write(&path, lines.join("\n") + "\n").unwrap();
    path
}

#[test]
fn csv_export_produces_every_artifact() {
    let dir = tempfile::tempdir().unwrap();
    let input = write_export(dir.path());
    let out = dir.path().join("out");
    let mut log = ProgressLog::new();

    let outcome = ReportBuilder::new(ReportConfig::default())
        .output_dir(&out)
        .build(InputSource::Csv(&input), &mut log)
        .unwrap();

    assert!(outcome.is_success(), "{:?}", outcome.errors);
    assert_eq!(outcome.audits_in_input, 3);
    assert_eq!(outcome.data_points, 21 * 8);
    for artifact in &outcome.artifacts {
        assert_eq!(artifact.status, ArtifactStatus::Written, "{:?}", artifact.kind);
        assert!(artifact.path.is_file(), "{}", artifact.path.display());
    }

    let main = fs::read_to_string(out.join("inspection_report.csv")).unwrap();
    let main_lines: Vec<&str> = main.lines().collect();
    assert_eq!(main_lines.len(), 4);
    assert!(main_lines[1].starts_with("audit_1,"));
    assert!(main_lines[0].ends_with("Service date formatted Y-m-d"));
    assert!(main_lines[2].contains("2024-11-12 14:01:35"));
    assert!(!main_lines[0].contains("Device 1"));

    let devices = outcome.artifact(ArtifactKind::DevicesCsv).unwrap();
    assert_eq!(devices.rows, Some(3));

    let labeled = fs::read_to_string(out.join("inspection_report_combined_label.csv")).unwrap();
    assert!(labeled.lines().next().unwrap().ends_with("Question combined label"));
    assert!(!labeled.contains(",section,"));
    assert!(!labeled.contains(",information,"));
    assert!(labeled.contains("Fan noise - Anomaly?"));

    let conn = Connection::open(out.join("inspection_report_database.db")).unwrap();
    let mut relations: Vec<String> = conn
        .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")
        .unwrap()
        .query_map([], |row| row.get(0))
        .unwrap()
        .collect::<Result<_, _>>()
        .unwrap();
    relations.sort();
    assert_eq!(relations, vec!["devices", "main_table", "replaced_parts"]);

    assert_eq!(outcome.statistics.dates.as_ref().map(|d| d.invalid), Some(1));
    assert!(log.contains("There are 3 inspection reports in the file."));
    assert!(log.contains("Execution time:"));
    assert_eq!(log.current_status(), Some("ANALYSIS COMPLETED."));
}

#[test]
fn snapshot_input_matches_csv_input() {
    let dir = tempfile::tempdir().unwrap();
    let db = dir.path().join("sqlite.db");
    let conn = Connection::open(&db).unwrap();
    conn.execute_batch(
        "CREATE TABLE inspection_items (
            audit_id TEXT, item_id TEXT, item_index INTEGER, parent_ids TEXT,
            label TEXT, category TEXT, type TEXT, response TEXT
        );
        INSERT INTO inspection_items VALUES
            ('a1', 'sec', 1, 'root', 'General', 'General', 'section', NULL),
            ('a1', 'model', 2, 'root,sec', 'Model', 'General', 'question', 'X100'),
            ('a2', 'model', 2, 'root,sec', 'Model', 'General', 'question', 'X200');",
    )
    .unwrap();
    conn.close().unwrap();

    let config = ReportConfig {
        base_name: "snapshot_report".to_string(),
        write_workbook: false,
        ..ReportConfig::default()
    };
    let out = dir.path().join("out");
    let outcome = ReportBuilder::new(config)
        .output_dir(&out)
        .build(InputSource::Snapshot(&db), &mut ProgressLog::new())
        .unwrap();

    assert_eq!(outcome.reshape.audits, 2);
    assert_eq!(
        outcome.artifact(ArtifactKind::Workbook).map(|a| a.status),
        Some(ArtifactStatus::Skipped)
    );
    let main = fs::read_to_string(out.join("snapshot_report.csv")).unwrap();
    assert_eq!(main.lines().next(), Some("audit_id,General - Model"));
    assert!(!out.join("snapshot_report_SUMMARY.xlsx").exists());
}

#[test]
fn missing_required_column_aborts_before_output() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("export.csv");
    fs::write(&input, "audit_id,label\na1,Model\n").unwrap();
    let out = dir.path().join("out");
    let result = ReportBuilder::default()
        .output_dir(&out)
        .build(InputSource::Csv(&input), &mut ProgressLog::new());
    assert!(result.is_err());
    assert!(!out.exists());
}

#[test]
fn only_byte_identical_rows_are_duplicates() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("export.csv");
    let row = "a1,model,4,\"root,sec\",Model,General,question,X100";
    let rows = [HEADER, row, row, "a1,model,4.0,\"root,sec\",Model,General,question,X100"];
    fs::write(&input, rows.join("\n") + "\n").unwrap();

    let config = ReportConfig {
        write_workbook: false,
        write_database: false,
        ..ReportConfig::default()
    };
    let outcome = ReportBuilder::new(config)
        .output_dir(dir.path().join("out"))
        .build(InputSource::Csv(&input), &mut ProgressLog::new())
        .unwrap();
    assert_eq!(outcome.reshape.duplicates, 1);
    assert_eq!(outcome.reshape.pivot_collisions, 1);
}
