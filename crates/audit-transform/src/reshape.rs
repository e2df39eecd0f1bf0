//! Reshape engine.
//!
//! Runs the fixed stage order over the long-form records:
//!
//! 1. remove structural record types (`information`, `section`, `signature`)
//! 2. remove records without question text
//! 3. remove exact duplicates
//! 4. derive combined labels
//! 5. sort by (audit id, item index)
//! 6. pivot into one row per audit, sorted by audit id
//! 7. extract the parts group, then drop its columns
//! 8. extract the devices group, then drop its columns
//! 9. normalize the service date and derive the formatted date column
//!
//! Stages never abort the run. Per-record and per-stage failures are logged,
//! reported through the [`ProgressSink`] and leave an absent value behind.

use std::collections::{BTreeMap, HashSet};
use std::time::Instant;

use tracing::{debug, info_span, warn};

use audit_model::columns::AUDIT_ID;
use audit_model::{
    AnswerValue, InspectionItems, QuestionRecord, RelationNames, RepeatingGroupSpec,
    ReshapeOptions, Table,
};

use crate::datetime::{audits_in_year, format_canonical, format_date, parse_service_date};
use crate::error::LabelError;
use crate::groups::extract_repeating_group;
use crate::label::{LabelResolver, LabelRules, LabelSource, category_label};
use crate::labeled::{LabeledItems, LabeledRecord};
use crate::pivot::{PivotCollision, pivot_labeled};
use crate::progress::ProgressSink;

/// Counters collected over one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReshapeStats {
    pub input_records: usize,
    /// Records dropped by the year filter.
    pub removed_by_year: usize,
    /// Records removed per excluded record type.
    pub removed_by_type: BTreeMap<String, usize>,
    pub removed_empty_question: usize,
    pub duplicates: usize,
    pub labels: LabelStats,
    pub pivot_collisions: usize,
    pub audits: usize,
    pub parts_rows: usize,
    pub device_rows: usize,
    pub service_dates: Option<DateStats>,
    /// Stage names in execution order.
    pub executed_stages: Vec<&'static str>,
}

impl ReshapeStats {
    /// Records removed by stages 1 to 3.
    pub fn removed_total(&self) -> usize {
        self.removed_by_type.values().sum::<usize>() + self.removed_empty_question + self.duplicates
    }
}

/// Outcome counts of label derivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelStats {
    pub conditional: usize,
    /// Conditional labels whose parent id did not resolve to a question.
    pub unresolved_parents: usize,
    /// Conditional records without the required parent id, labeled by category.
    pub category_fallbacks: usize,
    /// Records left without a label.
    pub failures: usize,
}

/// Outcome counts of service date normalization.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateStats {
    pub parsed: usize,
    pub missing: usize,
    pub invalid: usize,
}

/// Tables produced by one run.
#[derive(Debug, Clone)]
pub struct ReshapeOutput {
    /// Sorted, labeled long-form records.
    pub labeled: LabeledItems,
    pub main: Table,
    pub parts: Table,
    pub devices: Table,
    pub collisions: Vec<PivotCollision>,
    pub stats: ReshapeStats,
}

/// Drives the reshape stages with a fixed configuration.
#[derive(Debug, Clone, Default)]
pub struct ReshapeEngine {
    options: ReshapeOptions,
    relations: RelationNames,
}

impl ReshapeEngine {
    pub fn new(options: ReshapeOptions) -> Self {
        Self {
            options,
            relations: RelationNames::default(),
        }
    }

    /// Names given to the output tables.
    #[must_use]
    pub fn with_relations(mut self, relations: RelationNames) -> Self {
        self.relations = relations;
        self
    }

    pub fn options(&self) -> &ReshapeOptions {
        &self.options
    }

    pub fn run(&self, mut items: InspectionItems, progress: &mut dyn ProgressSink) -> ReshapeOutput {
        let start = Instant::now();
        let mut stats = ReshapeStats {
            input_records: items.len(),
            ..ReshapeStats::default()
        };

        if let Some(year) = self.options.year {
            info_span!("year_filter", year).in_scope(|| {
                stats.removed_by_year = filter_by_year(&mut items, year, progress);
            });
            stats.executed_stages.push("year_filter");
        }

        progress.status("Removing structural records...");
        let records = std::mem::take(&mut items.records);
        let (records, removed_by_type) =
            remove_record_types(records, &self.options.excluded_types);
        for (record_type, count) in &removed_by_type {
            progress.message(&format!(
                "{count} records of type '{record_type}' have been removed."
            ));
        }
        stats.removed_by_type = removed_by_type;
        stats.executed_stages.push("remove_record_types");

        let (records, removed_empty) = remove_empty_questions(records);
        progress.message(&format!(
            "{removed_empty} records without question text have been removed."
        ));
        stats.removed_empty_question = removed_empty;
        stats.executed_stages.push("remove_empty_questions");

        let (records, duplicates) = remove_duplicates(records);
        progress.message(&format!("{duplicates} duplicate records have been removed."));
        stats.duplicates = duplicates;
        stats.executed_stages.push("remove_duplicates");
        progress.message(&format!(
            "Total number of records removed: {}",
            stats.removed_total()
        ));

        progress.status("Deriving combined labels...");
        progress.timestamped("Data wrangling in process...");
        let rules = LabelRules::from_options(&self.options);
        let labeled = info_span!("label").in_scope(|| assign_labels(records, &rules, &mut stats.labels));
        let mut labeled = LabeledItems::new(&items, labeled);
        labeled.sort();
        stats.executed_stages.push("label");
        if stats.labels.failures > 0 {
            progress.message(&format!(
                "{} records could not be labeled and are left out of the pivot.",
                stats.labels.failures
            ));
        }

        progress.status("Pivoting...");
        let pivot = info_span!("pivot")
            .in_scope(|| pivot_labeled(&labeled.records, AUDIT_ID, &self.relations.main));
        stats.pivot_collisions = pivot.collisions.len();
        if !pivot.collisions.is_empty() {
            progress.message(&format!(
                "{} duplicate combined labels found; the first answer was kept.",
                pivot.collisions.len()
            ));
        }
        let mut main = pivot.table;
        stats.audits = main.height();
        stats.executed_stages.push("pivot");

        progress.status("Extracting parts replaced...");
        progress.timestamped("Extracting parts replaced data...");
        let parts = self.extract_group(&mut main, &self.options.parts, &self.relations.parts, progress);
        stats.parts_rows = parts.height();
        stats.executed_stages.push("extract_parts");

        progress.status("Extracting devices...");
        progress.timestamped("Extracting devices data...");
        let devices =
            self.extract_group(&mut main, &self.options.devices, &self.relations.devices, progress);
        stats.device_rows = devices.height();
        stats.executed_stages.push("extract_devices");

        stats.service_dates = normalize_service_dates(
            &mut main,
            &self.options.service_date_column,
            &self.options.formatted_date_column,
        );
        match &stats.service_dates {
            Some(dates) => {
                if dates.invalid > 0 {
                    warn!(invalid = dates.invalid, "service dates that could not be parsed");
                }
                progress.message(&format!(
                    "Column '{}' added.",
                    self.options.formatted_date_column
                ));
            }
            None => {
                warn!(
                    column = %self.options.service_date_column,
                    "service date column not found; formatted date not derived"
                );
                progress.message(&format!(
                    "Column '{}' not found; no formatted date added.",
                    self.options.service_date_column
                ));
            }
        }
        stats.executed_stages.push("service_dates");
        progress.message(&format!("Number of records: {}.", main.height()));

        debug!(
            input_records = stats.input_records,
            audits = stats.audits,
            columns = main.width(),
            parts_rows = stats.parts_rows,
            device_rows = stats.device_rows,
            duration_ms = start.elapsed().as_millis(),
            "reshape complete"
        );
        ReshapeOutput {
            labeled,
            main,
            parts,
            devices,
            collisions: pivot.collisions,
            stats,
        }
    }

    /// Extracts one group from `main` and drops its columns. A failed
    /// extraction yields an empty child table.
    fn extract_group(
        &self,
        main: &mut Table,
        spec: &RepeatingGroupSpec,
        name: &str,
        progress: &mut dyn ProgressSink,
    ) -> Table {
        let span = info_span!("extract_group", group = %spec.prefix);
        let _guard = span.enter();
        let table = match extract_repeating_group(main, AUDIT_ID, spec, name) {
            Ok(extraction) => {
                progress.message(&format!(
                    "{} '{}' entries extracted from {} groups per audit.",
                    extraction.table.height(),
                    spec.prefix,
                    extraction.group_count
                ));
                extraction.table
            }
            Err(error) => {
                warn!(%error, "repeating group extraction failed");
                progress.message(&format!("Extraction of '{}' failed: {error}", spec.prefix));
                let mut columns = vec![AUDIT_ID.to_string()];
                columns.extend(spec.suffixes.iter().cloned());
                columns.extend(spec.passthrough.iter().cloned());
                Table::new(name, columns)
            }
        };
        let dropped = main.drop_columns_with_prefix(&spec.prefix);
        progress.message(&format!(
            "Removed {dropped} columns that start with '{}'.",
            spec.prefix
        ));
        table
    }
}

/// Keeps the audits serviced in `year`; returns the number of records removed.
pub fn filter_by_year(
    items: &mut InspectionItems,
    year: i32,
    progress: &mut dyn ProgressSink,
) -> usize {
    let selection = audits_in_year(&items.records, year);
    if selection.invalid_dates > 0 {
        warn!(invalid = selection.invalid_dates, "service dates that could not be parsed");
    }
    let before = items.len();
    items.retain_audits(|audit_id| selection.audit_ids.contains(audit_id));
    let removed = before - items.len();
    progress.message(&format!(
        "{} audits serviced in {year} kept; {removed} records of other years removed.",
        selection.audit_ids.len()
    ));
    removed
}

/// Removes records whose type is in `excluded`, counting removals per type.
pub fn remove_record_types(
    records: Vec<QuestionRecord>,
    excluded: &[String],
) -> (Vec<QuestionRecord>, BTreeMap<String, usize>) {
    let mut removed: BTreeMap<String, usize> = excluded
        .iter()
        .map(|record_type| (record_type.clone(), 0))
        .collect();
    let kept: Vec<QuestionRecord> = records
        .into_iter()
        .filter(|record| match removed.get_mut(record.record_type.as_str()) {
            Some(count) => {
                *count += 1;
                false
            }
            None => true,
        })
        .collect();
    (kept, removed)
}

/// Removes records whose question text is null, empty or whitespace only.
pub fn remove_empty_questions(records: Vec<QuestionRecord>) -> (Vec<QuestionRecord>, usize) {
    let before = records.len();
    let kept: Vec<QuestionRecord> = records
        .into_iter()
        .filter(|record| record.question_text().is_some())
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Removes exact duplicates, keeping the first occurrence.
///
/// Records read from an export differ whenever their raw cells differ, so
/// `1` and `1.0` or an empty and a blank field are not duplicates.
pub fn remove_duplicates(records: Vec<QuestionRecord>) -> (Vec<QuestionRecord>, usize) {
    let keep: Vec<bool> = {
        let mut seen: HashSet<&QuestionRecord> = HashSet::with_capacity(records.len());
        records.iter().map(|record| seen.insert(record)).collect()
    };
    let before = records.len();
    let kept: Vec<QuestionRecord> = records
        .into_iter()
        .zip(keep)
        .filter_map(|(record, kept)| kept.then_some(record))
        .collect();
    let removed = before - kept.len();
    (kept, removed)
}

/// Derives the combined label of every record.
///
/// A conditional record without the required parent id is labeled by category.
/// Any other failure leaves the record unlabeled.
pub fn assign_labels(
    records: Vec<QuestionRecord>,
    rules: &LabelRules,
    stats: &mut LabelStats,
) -> Vec<LabeledRecord> {
    let labels: Vec<Option<String>> = {
        let resolver = LabelResolver::new(&records, rules.clone());
        records
            .iter()
            .map(|record| match resolver.resolve(record) {
                Ok(resolved) => {
                    match resolved.source {
                        LabelSource::Category => {}
                        LabelSource::Parent => stats.conditional += 1,
                        LabelSource::UnresolvedParent => {
                            stats.conditional += 1;
                            stats.unresolved_parents += 1;
                        }
                    }
                    Some(resolved.label)
                }
                Err(error @ LabelError::ParentIdMissing { .. }) => {
                    warn!(%error, "falling back to category label");
                    stats.category_fallbacks += 1;
                    match category_label(record, rules.mode) {
                        Ok(label) => Some(label),
                        Err(error) => {
                            warn!(%error, "record left without label");
                            stats.failures += 1;
                            None
                        }
                    }
                }
                Err(error) => {
                    warn!(%error, "record left without label");
                    stats.failures += 1;
                    None
                }
            })
            .collect()
    };
    records
        .into_iter()
        .zip(labels)
        .map(|(record, label)| LabeledRecord { record, label })
        .collect()
}

/// Rewrites `source_column` to canonical timestamps and adds (or replaces)
/// `formatted_column` with the `YYYY-MM-DD` date. Unparseable cells become
/// empty in both columns. Returns `None` if `source_column` is absent.
pub fn normalize_service_dates(
    table: &mut Table,
    source_column: &str,
    formatted_column: &str,
) -> Option<DateStats> {
    let values = table.column_values(source_column)?;
    let mut stats = DateStats::default();
    let mut canonical = Vec::with_capacity(values.len());
    let mut formatted = Vec::with_capacity(values.len());
    for value in values {
        let Some(raw) = value.as_str() else {
            stats.missing += 1;
            canonical.push(AnswerValue::Missing);
            formatted.push(AnswerValue::Missing);
            continue;
        };
        match parse_service_date(raw) {
            Some(parsed) => {
                stats.parsed += 1;
                canonical.push(AnswerValue::from(format_canonical(&parsed)));
                formatted.push(AnswerValue::from(format_date(&parsed)));
            }
            None => {
                debug!(value = raw, "unparseable service date");
                stats.invalid += 1;
                canonical.push(AnswerValue::Missing);
                formatted.push(AnswerValue::Missing);
            }
        }
    }
    table.replace_column(source_column, canonical);
    if !table.replace_column(formatted_column, formatted.clone()) {
        table.push_column(formatted_column, formatted);
    }
    Some(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_model::RecordType;

    use crate::progress::ProgressLog;

    fn record(item: &str, record_type: RecordType, label: Option<&str>) -> QuestionRecord {
        QuestionRecord {
            audit_id: "a1".to_string(),
            item_id: item.to_string(),
            parent_ids: None,
            record_type,
            category: Some("General".to_string()),
            label: label.map(str::to_string),
            response: AnswerValue::from("x"),
            item_index: Some(1),
            extra: Vec::new(),
            raw_cells: Vec::new(),
        }
    }

    #[test]
    fn removes_excluded_types_with_counts() {
        let records = vec![
            record("1", RecordType::Section, Some("Header")),
            record("2", RecordType::Question, Some("Model")),
            record("3", RecordType::Information, Some("Note")),
            record("4", RecordType::Section, Some("Other header")),
        ];
        let excluded = ReshapeOptions::default().excluded_types;
        let (kept, removed) = remove_record_types(records, &excluded);
        assert_eq!(kept.len(), 1);
        assert_eq!(removed.get("section"), Some(&2));
        assert_eq!(removed.get("information"), Some(&1));
        assert_eq!(removed.get("signature"), Some(&0));
    }

    #[test]
    fn removes_exactly_one_duplicate() {
        let records = vec![
            record("1", RecordType::Question, Some("Model")),
            record("2", RecordType::Question, Some("Site")),
            record("1", RecordType::Question, Some("Model")),
        ];
        let (kept, removed) = remove_duplicates(records);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 2);
        assert_eq!(kept[1].item_id, "2");
    }

    #[test]
    fn duplicates_compare_raw_cells() {
        let row = |index: &str, response: Option<&str>| {
            let mut parsed = record("1", RecordType::Question, Some("Model"));
            parsed.raw_cells = vec![
                Some("a1".to_string()),
                Some("1".to_string()),
                Some(index.to_string()),
                response.map(str::to_string),
            ];
            parsed
        };
        let records = vec![
            row("1", Some("x")),
            row("1.0", Some("x")),
            row("1", Some("x")),
            row("1", None),
            row("1", Some("x ")),
        ];
        let (kept, removed) = remove_duplicates(records);
        assert_eq!(removed, 1);
        assert_eq!(kept.len(), 4);
        assert_eq!(kept[1].raw_cells[2].as_deref(), Some("1.0"));
    }

    #[test]
    fn near_duplicates_are_kept() {
        let mut other = record("1", RecordType::Question, Some("Model"));
        other.response = AnswerValue::from("y");
        let records = vec![record("1", RecordType::Question, Some("Model")), other];
        let (kept, removed) = remove_duplicates(records);
        assert_eq!(removed, 0);
        assert_eq!(kept.len(), 2);
    }

    #[test]
    fn removes_empty_questions() {
        let records = vec![
            record("1", RecordType::Question, None),
            record("2", RecordType::Question, Some("  ")),
            record("3", RecordType::Question, Some("Model")),
        ];
        let (kept, removed) = remove_empty_questions(records);
        assert_eq!(removed, 2);
        assert_eq!(kept[0].item_id, "3");
    }

    #[test]
    fn short_parent_list_falls_back_to_category() {
        let mut anomaly = record("2", RecordType::Question, Some("Anomaly?"));
        anomaly.parent_ids = Some("root".to_string());
        let mut stats = LabelStats::default();
        let labeled = assign_labels(vec![anomaly], &LabelRules::default(), &mut stats);
        assert_eq!(labeled[0].label.as_deref(), Some("General - Anomaly?"));
        assert_eq!(stats.category_fallbacks, 1);
        assert_eq!(stats.failures, 0);
    }

    #[test]
    fn normalizes_service_dates() {
        let mut table = Table::new("main_table", vec!["audit_id".to_string(), "Date".to_string()]);
        table.push_row(vec!["a1".into(), "2024-11-12T14:01:35Z".into()]);
        table.push_row(vec!["a2".into(), "2024-10-11T05:58:03.949Z".into()]);
        table.push_row(vec!["a3".into(), "not-a-date".into()]);
        table.push_row(vec!["a4".into()]);

        let stats = normalize_service_dates(&mut table, "Date", "Formatted").unwrap();
        assert_eq!(stats, DateStats { parsed: 2, missing: 1, invalid: 1 });
        assert_eq!(table.value(0, "Date"), Some(&AnswerValue::from("2024-11-12 14:01:35")));
        assert_eq!(table.value(1, "Formatted"), Some(&AnswerValue::from("2024-10-11")));
        assert_eq!(table.value(2, "Date"), Some(&AnswerValue::Missing));
        assert_eq!(table.value(2, "Formatted"), Some(&AnswerValue::Missing));

        assert!(normalize_service_dates(&mut table, "Missing", "Formatted").is_none());
    }

    #[test]
    fn runs_every_stage_on_empty_input() {
        let mut log = ProgressLog::new();
        let output = ReshapeEngine::default().run(InspectionItems::default(), &mut log);
        assert_eq!(output.main.height(), 0);
        assert_eq!(output.main.columns, vec![AUDIT_ID]);
        assert_eq!(output.stats.service_dates, None);
        assert_eq!(
            output.stats.executed_stages,
            vec![
                "remove_record_types",
                "remove_empty_questions",
                "remove_duplicates",
                "label",
                "pivot",
                "extract_parts",
                "extract_devices",
                "service_dates",
            ]
        );
        assert!(log.contains("not found"));
    }
}
