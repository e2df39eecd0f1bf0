use comfy_table::modifiers::{UTF8_ROUND_CORNERS, UTF8_SOLID_INNER_BORDERS};
use comfy_table::presets::{UTF8_FULL, UTF8_FULL_CONDENSED};
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};

use audit_ingest::SnapshotExtract;
use audit_report::{ArtifactStatus, ReportOutcome, format_elapsed};
use audit_transform::ReshapeStats;

pub fn print_summary(outcome: &ReportOutcome) {
    println!("Output: {}", outcome.output_dir.display());
    println!(
        "Audits: {} in input, {} in main table",
        outcome.audits_in_input, outcome.reshape.audits
    );

    let mut counts = Table::new();
    counts.set_header(vec![header_cell("Step"), header_cell("Records")]);
    apply_table_style(&mut counts);
    align_column(&mut counts, 1, CellAlignment::Right);
    for (step, value) in run_counts(&outcome.reshape) {
        counts.add_row(vec![Cell::new(step), Cell::new(value)]);
    }
    println!("{counts}");

    let mut artifacts = Table::new();
    artifacts.set_header(vec![
        header_cell("Artifact"),
        header_cell("Rows"),
        header_cell("Status"),
        header_cell("Path"),
    ]);
    apply_summary_table_style(&mut artifacts);
    align_column(&mut artifacts, 1, CellAlignment::Right);
    align_column(&mut artifacts, 2, CellAlignment::Center);
    for artifact in &outcome.artifacts {
        artifacts.add_row(vec![
            Cell::new(artifact.kind.label()),
            artifact
                .rows
                .map_or_else(|| dim_cell("-"), Cell::new),
            status_cell(artifact.status),
            Cell::new(artifact.path.display()),
        ]);
    }
    println!("{artifacts}");

    if !outcome.errors.is_empty() {
        let mut errors = Table::new();
        errors.set_header(vec![header_cell("#"), header_cell("Error")]);
        apply_table_style(&mut errors);
        for (idx, error) in outcome.errors.iter().enumerate() {
            errors.add_row(vec![
                Cell::new(idx + 1),
                Cell::new(error.to_string()).fg(Color::Red),
            ]);
        }
        println!("{errors}");
    }
    println!("Execution time: {}", format_elapsed(outcome.elapsed));
}

pub fn print_extract_summary(extract: &SnapshotExtract) {
    let mut table = Table::new();
    table.set_header(vec![
        header_cell("CSV"),
        header_cell("Rows"),
        header_cell("Columns"),
    ]);
    apply_table_style(&mut table);
    align_column(&mut table, 1, CellAlignment::Right);
    align_column(&mut table, 2, CellAlignment::Right);
    table.add_row(vec![
        Cell::new(extract.csv_path.display()),
        Cell::new(extract.rows),
        Cell::new(extract.columns),
    ]);
    println!("{table}");
}

/// Record counts shown in the run table, in pipeline order.
pub fn run_counts(stats: &ReshapeStats) -> Vec<(String, usize)> {
    let mut rows = vec![("Input records".to_string(), stats.input_records)];
    if stats.removed_by_year > 0 {
        rows.push(("Outside selected year".to_string(), stats.removed_by_year));
    }
    for (record_type, count) in &stats.removed_by_type {
        rows.push((format!("Removed '{record_type}'"), *count));
    }
    rows.push((
        "Removed empty questions".to_string(),
        stats.removed_empty_question,
    ));
    rows.push(("Removed duplicates".to_string(), stats.duplicates));
    rows.push(("Removed in total".to_string(), stats.removed_total()));
    rows.push(("Pivot collisions".to_string(), stats.pivot_collisions));
    rows.push(("Parts replaced rows".to_string(), stats.parts_rows));
    rows.push(("Device rows".to_string(), stats.device_rows));
    rows
}

pub fn apply_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL_CONDENSED)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_width(120);
}

fn apply_summary_table_style(table: &mut Table) {
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .apply_modifier(UTF8_SOLID_INNER_BORDERS)
        .set_content_arrangement(ContentArrangement::DynamicFullWidth)
        .set_width(165);
}

fn align_column(table: &mut Table, index: usize, alignment: CellAlignment) {
    if let Some(column) = table.column_mut(index) {
        column.set_cell_alignment(alignment);
    }
}

fn status_cell(status: ArtifactStatus) -> Cell {
    let color = match status {
        ArtifactStatus::Written => Color::Green,
        ArtifactStatus::Partial => Color::Yellow,
        ArtifactStatus::Failed => Color::Red,
        ArtifactStatus::Skipped => Color::DarkGrey,
    };
    Cell::new(status).fg(color)
}

fn header_cell(label: &str) -> Cell {
    Cell::new(label)
        .fg(Color::Cyan)
        .add_attribute(Attribute::Bold)
}

fn dim_cell<T: ToString>(value: T) -> Cell {
    Cell::new(value).fg(Color::DarkGrey)
}
