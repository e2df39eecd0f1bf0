//! Long-form records annotated with their combined label.

use audit_model::columns::{self, COMBINED_LABEL};
use audit_model::{AnswerValue, InspectionItems, QuestionRecord, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabeledRecord {
    pub record: QuestionRecord,
    /// `None` when the label could not be derived; the record is then left out
    /// of the pivot.
    pub label: Option<String>,
}

/// Labeled intermediate table, keeping the column layout of the input.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabeledItems {
    pub columns: Vec<String>,
    pub extra_columns: Vec<String>,
    pub records: Vec<LabeledRecord>,
}

impl LabeledItems {
    pub fn new(items: &InspectionItems, records: Vec<LabeledRecord>) -> Self {
        Self {
            columns: items.columns.clone(),
            extra_columns: items.extra_columns.clone(),
            records,
        }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorts by (audit id, item index); records without an index go last
    /// within their audit. The sort is stable.
    pub fn sort(&mut self) {
        self.records.sort_by(|a, b| {
            a.record
                .audit_id
                .cmp(&b.record.audit_id)
                .then_with(|| match (a.record.item_index, b.record.item_index) {
                    (Some(x), Some(y)) => x.cmp(&y),
                    (Some(_), None) => std::cmp::Ordering::Less,
                    (None, Some(_)) => std::cmp::Ordering::Greater,
                    (None, None) => std::cmp::Ordering::Equal,
                })
        });
    }

    /// Input columns followed by the combined label column.
    ///
    /// A combined label column already present in the input is replaced.
    pub fn to_table(&self, name: &str) -> Table {
        let layout: Vec<&String> = self
            .columns
            .iter()
            .filter(|column| column.as_str() != COMBINED_LABEL)
            .collect();
        let mut header: Vec<String> = layout.iter().map(|column| (*column).clone()).collect();
        header.push(COMBINED_LABEL.to_string());
        let mut table = Table::new(name, header);

        for labeled in &self.records {
            let record = &labeled.record;
            let mut row: Vec<AnswerValue> = layout
                .iter()
                .map(|column| self.cell(record, column))
                .collect();
            row.push(AnswerValue::from_option(labeled.label.clone()));
            table.push_row(row);
        }
        table
    }

    fn cell(&self, record: &QuestionRecord, column: &str) -> AnswerValue {
        let text = |value: &Option<String>| AnswerValue::from_option(value.clone());
        match column {
            columns::AUDIT_ID => AnswerValue::from(record.audit_id.as_str()),
            columns::ITEM_ID => AnswerValue::from(record.item_id.as_str()),
            columns::ITEM_INDEX => {
                AnswerValue::from_option(record.item_index.map(|idx| idx.to_string()))
            }
            columns::PARENT_IDS => text(&record.parent_ids),
            columns::LABEL => text(&record.label),
            columns::CATEGORY => text(&record.category),
            columns::TYPE => AnswerValue::from(record.record_type.as_str()),
            columns::RESPONSE => record.response.clone(),
            other => self
                .extra_columns
                .iter()
                .position(|extra| extra == other)
                .and_then(|idx| record.extra.get(idx))
                .cloned()
                .unwrap_or_default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use audit_model::RecordType;

    fn labeled(audit: &str, index: Option<i64>, label: Option<&str>) -> LabeledRecord {
        LabeledRecord {
            record: QuestionRecord {
                audit_id: audit.to_string(),
                item_id: format!("{audit}-{index:?}"),
                parent_ids: None,
                record_type: RecordType::Question,
                category: Some("General".to_string()),
                label: Some("Model".to_string()),
                response: AnswerValue::from("X"),
                item_index: index,
                extra: vec![AnswerValue::from("2024-01-01")],
                raw_cells: Vec::new(),
            },
            label: label.map(str::to_string),
        }
    }

    fn items() -> LabeledItems {
        LabeledItems {
            columns: vec![
                "created_at".to_string(),
                "audit_id".to_string(),
                "item_id".to_string(),
                "item_index".to_string(),
                "parent_ids".to_string(),
                "label".to_string(),
                "category".to_string(),
                "type".to_string(),
                "response".to_string(),
            ],
            extra_columns: vec!["created_at".to_string()],
            records: vec![
                labeled("b", Some(2), Some("General - Model")),
                labeled("a", None, None),
                labeled("a", Some(10), Some("General - Model")),
                labeled("a", Some(9), Some("General - Model")),
            ],
        }
    }

    #[test]
    fn sorts_by_audit_then_index() {
        let mut items = items();
        items.sort();
        let order: Vec<(String, Option<i64>)> = items
            .records
            .iter()
            .map(|r| (r.record.audit_id.clone(), r.record.item_index))
            .collect();
        assert_eq!(
            order,
            vec![
                ("a".to_string(), Some(9)),
                ("a".to_string(), Some(10)),
                ("a".to_string(), None),
                ("b".to_string(), Some(2)),
            ]
        );
    }

    #[test]
    fn table_appends_label_column() {
        let table = items().to_table("combined_label");
        assert_eq!(table.columns.first().map(String::as_str), Some("created_at"));
        assert_eq!(table.columns.last().map(String::as_str), Some(COMBINED_LABEL));
        assert_eq!(table.value(0, "created_at"), Some(&AnswerValue::from("2024-01-01")));
        assert_eq!(table.value(0, "item_index"), Some(&AnswerValue::from("2")));
        assert_eq!(table.value(0, "type"), Some(&AnswerValue::from("question")));
        assert_eq!(table.value(1, COMBINED_LABEL), Some(&AnswerValue::Missing));
    }
}
