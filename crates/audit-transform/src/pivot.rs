//! Long-to-wide pivot keyed by audit id and combined label.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use tracing::{debug, warn};

use audit_model::{AnswerValue, Table};

use crate::labeled::LabeledRecord;

/// Collisions logged individually before the rest are only counted.
const LOGGED_COLLISIONS: usize = 5;

/// A second answer for an (audit, label) pair that already had one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotCollision {
    pub audit_id: String,
    pub label: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PivotOutcome {
    pub table: Table,
    pub collisions: Vec<PivotCollision>,
}

/// Spreads labeled answers into one row per audit.
///
/// Columns are `key_column` followed by every label in lexicographic order;
/// rows are sorted by audit id. When an (audit, label) pair occurs more than
/// once the first non-empty answer wins and the pair is reported as a
/// collision. Records without a label are skipped.
pub fn pivot_labeled(records: &[LabeledRecord], key_column: &str, name: &str) -> PivotOutcome {
    let mut labels: BTreeSet<&str> = BTreeSet::new();
    let mut audits: BTreeMap<&str, HashMap<&str, &AnswerValue>> = BTreeMap::new();
    let mut collisions = Vec::new();

    for labeled in records {
        let Some(label) = labeled.label.as_deref() else {
            continue;
        };
        let audit_id = labeled.record.audit_id.as_str();
        let answer = &labeled.record.response;
        labels.insert(label);
        let cells = audits.entry(audit_id).or_default();
        match cells.get(label) {
            None => {
                cells.insert(label, answer);
            }
            Some(existing) => {
                if collisions.len() < LOGGED_COLLISIONS {
                    warn!(audit_id, label, "duplicate combined label; keeping first answer");
                }
                collisions.push(PivotCollision {
                    audit_id: audit_id.to_string(),
                    label: label.to_string(),
                });
                if existing.is_missing() && !answer.is_missing() {
                    cells.insert(label, answer);
                }
            }
        }
    }
    if collisions.len() > LOGGED_COLLISIONS {
        warn!(total = collisions.len(), "more duplicate combined labels not shown");
    }

    let mut columns = Vec::with_capacity(labels.len() + 1);
    columns.push(key_column.to_string());
    columns.extend(labels.iter().map(|label| (*label).to_string()));
    let mut table = Table::new(name, columns);
    for (audit_id, cells) in &audits {
        let mut row = Vec::with_capacity(table.width());
        row.push(AnswerValue::from(*audit_id));
        row.extend(
            labels
                .iter()
                .map(|label| cells.get(label).map(|value| (*value).clone()).unwrap_or_default()),
        );
        table.push_row(row);
    }

    debug!(
        audits = table.height(),
        labels = labels.len(),
        collisions = collisions.len(),
        "pivoted labeled records"
    );
    PivotOutcome { table, collisions }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_model::{QuestionRecord, RecordType};
    use proptest::prelude::*;

    fn labeled(audit: &str, label: &str, answer: &str) -> LabeledRecord {
        LabeledRecord {
            record: QuestionRecord {
                audit_id: audit.to_string(),
                item_id: format!("{audit}:{label}"),
                parent_ids: None,
                record_type: RecordType::Question,
                category: None,
                label: Some(label.to_string()),
                response: AnswerValue::from(answer),
                item_index: None,
                extra: Vec::new(),
                raw_cells: Vec::new(),
            },
            label: Some(label.to_string()),
        }
    }

    #[test]
    fn one_row_per_audit_with_sorted_columns() {
        let records = vec![
            labeled("a2", "General - Model", "M2"),
            labeled("a1", "General - Site", "North"),
            labeled("a1", "General - Model", "M1"),
        ];
        let outcome = pivot_labeled(&records, "audit_id", "main_table");
        insta::assert_debug_snapshot!(outcome.table.columns, @r#"
        [
            "audit_id",
            "General - Model",
            "General - Site",
        ]
        "#);
        assert_eq!(outcome.table.height(), 2);
        assert_eq!(outcome.table.value(0, "audit_id"), Some(&AnswerValue::from("a1")));
        assert_eq!(outcome.table.value(1, "General - Site"), Some(&AnswerValue::Missing));
        assert!(outcome.collisions.is_empty());
    }

    #[test]
    fn first_non_empty_answer_wins() {
        let records = vec![
            labeled("a1", "General - Model", ""),
            labeled("a1", "General - Model", "M1"),
            labeled("a1", "General - Model", "M9"),
        ];
        let outcome = pivot_labeled(&records, "audit_id", "main_table");
        assert_eq!(outcome.table.value(0, "General - Model"), Some(&AnswerValue::from("M1")));
        assert_eq!(outcome.collisions.len(), 2);
        assert_eq!(outcome.collisions[0].label, "General - Model");
    }

    #[test]
    fn unlabeled_records_are_skipped() {
        let mut unlabeled = labeled("a3", "General - Model", "M3");
        unlabeled.label = None;
        let outcome = pivot_labeled(&[unlabeled], "audit_id", "main_table");
        assert_eq!(outcome.table.height(), 0);
        assert_eq!(outcome.table.columns, vec!["audit_id"]);
    }

    fn unique_records() -> impl Strategy<Value = Vec<LabeledRecord>> {
        proptest::collection::btree_map(
            ("a[0-4]", "[A-C] - [a-c]"),
            "[a-z0-9]{0,3}",
            0..24,
        )
        .prop_map(|cells| {
            cells
                .into_iter()
                .map(|((audit, label), answer)| labeled(&audit, &label, &answer))
                .collect()
        })
    }

    proptest! {
        #[test]
        fn pivot_is_deterministic(records in unique_records()) {
            let first = pivot_labeled(&records, "audit_id", "main_table");
            let second = pivot_labeled(&records, "audit_id", "main_table");
            prop_assert_eq!(first, second);
        }

        #[test]
        fn pivot_ignores_input_order(records in unique_records()) {
            let mut reversed = records.clone();
            reversed.reverse();
            let forward = pivot_labeled(&records, "audit_id", "main_table");
            let backward = pivot_labeled(&reversed, "audit_id", "main_table");
            prop_assert!(forward.collisions.is_empty());
            prop_assert_eq!(forward.table, backward.table);
        }
    }
}
