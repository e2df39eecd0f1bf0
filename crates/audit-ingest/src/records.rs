//! Conversion from an export frame to typed inspection records.

use polars::prelude::DataFrame;
use tracing::{debug, warn};

use audit_model::columns::{self, REQUIRED_COLUMNS};
use audit_model::{AnswerValue, InspectionItems, QuestionRecord, RecordType};

use crate::error::{IngestError, Result};
use crate::frame::string_values;

/// Builds inspection records from a CSV or snapshot frame.
///
/// All [`REQUIRED_COLUMNS`] must be present; any other column is carried along
/// verbatim so the labeled output keeps the input layout.
pub fn items_from_frame(df: &DataFrame) -> Result<InspectionItems> {
    let names: Vec<String> = df
        .get_column_names()
        .into_iter()
        .map(|name| name.to_string())
        .collect();
    for required in REQUIRED_COLUMNS {
        if !names.iter().any(|name| name == required) {
            return Err(IngestError::MissingColumn {
                column: required.to_string(),
            });
        }
    }

    let values: Vec<Vec<Option<String>>> = names
        .iter()
        .map(|name| string_values(df, name))
        .collect::<Result<_>>()?;
    let audit_ids = column(&names, &values, columns::AUDIT_ID)?;
    let item_ids = column(&names, &values, columns::ITEM_ID)?;
    let item_indexes = column(&names, &values, columns::ITEM_INDEX)?;
    let parent_ids = column(&names, &values, columns::PARENT_IDS)?;
    let labels = column(&names, &values, columns::LABEL)?;
    let categories = column(&names, &values, columns::CATEGORY)?;
    let types = column(&names, &values, columns::TYPE)?;
    let responses = column(&names, &values, columns::RESPONSE)?;

    let extra_columns: Vec<String> = names
        .iter()
        .filter(|name| !REQUIRED_COLUMNS.contains(&name.as_str()))
        .cloned()
        .collect();
    let extra_values = extra_columns
        .iter()
        .map(|name| column(&names, &values, name))
        .collect::<Result<Vec<_>>>()?;

    let mut records = Vec::with_capacity(df.height());
    let mut missing_audit_ids = 0usize;
    let mut unparsed_indexes = 0usize;
    for idx in 0..df.height() {
        let audit_id = non_blank(&audit_ids[idx]);
        if audit_id.is_none() {
            missing_audit_ids += 1;
        }
        let raw_index = non_blank(&item_indexes[idx]);
        let item_index = raw_index.as_deref().and_then(parse_item_index);
        if raw_index.is_some() && item_index.is_none() {
            unparsed_indexes += 1;
        }
        records.push(QuestionRecord {
            audit_id: audit_id.unwrap_or_default(),
            item_id: non_blank(&item_ids[idx]).unwrap_or_default(),
            parent_ids: non_blank(&parent_ids[idx]),
            record_type: RecordType::parse(types[idx].as_deref().unwrap_or_default()),
            category: non_blank(&categories[idx]),
            label: non_blank(&labels[idx]),
            response: AnswerValue::from_option(responses[idx].clone()),
            item_index,
            extra: extra_values
                .iter()
                .map(|column| AnswerValue::from_option(column[idx].clone()))
                .collect(),
            raw_cells: values.iter().map(|column| column[idx].clone()).collect(),
        });
    }

    if missing_audit_ids > 0 {
        warn!(count = missing_audit_ids, "records without an audit id");
    }
    if unparsed_indexes > 0 {
        warn!(count = unparsed_indexes, "item indexes that are not numbers");
    }
    debug!(
        records = records.len(),
        extra_columns = extra_columns.len(),
        "built inspection records"
    );

    Ok(InspectionItems {
        columns: names,
        extra_columns,
        records,
    })
}

fn column<'v>(
    names: &[String],
    values: &'v [Vec<Option<String>>],
    name: &str,
) -> Result<&'v [Option<String>]> {
    names
        .iter()
        .position(|candidate| candidate == name)
        .and_then(|idx| values.get(idx))
        .map(Vec::as_slice)
        .ok_or_else(|| IngestError::MissingColumn {
            column: name.to_string(),
        })
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .filter(|text| !text.trim().is_empty())
        .map(str::to_string)
}

/// Item indexes are integers, but spreadsheet round trips can turn them into `12.0`.
fn parse_item_index(value: &str) -> Option<i64> {
    let trimmed = value.trim();
    trimmed.parse::<i64>().ok().or_else(|| {
        trimmed
            .parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && v.fract() == 0.0)
            .map(|v| v as i64)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::frame_from_columns;

    fn column(name: &str, values: &[Option<&str>]) -> (String, Vec<Option<String>>) {
        (
            name.to_string(),
            values.iter().map(|v| v.map(str::to_string)).collect(),
        )
    }

    fn export_frame(with_extra: bool) -> DataFrame {
        let mut columns = vec![
            column("audit_id", &[Some("a1"), Some("a1")]),
            column("item_id", &[Some("i1"), Some("i2")]),
            column("item_index", &[Some("1"), Some("2.0")]),
            column("parent_ids", &[None, Some("i0,i1")]),
            column("label", &[Some("Model"), Some("  ")]),
            column("category", &[Some("General"), None]),
            column("type", &[Some("question"), Some("section")]),
            column("response", &[Some("X100"), None]),
        ];
        if with_extra {
            columns.insert(0, column("created_at", &[Some("2024-01-01"), None]));
        }
        frame_from_columns(columns).unwrap()
    }

    #[test]
    fn converts_rows_to_records() {
        let items = items_from_frame(&export_frame(false)).unwrap();
        assert_eq!(items.len(), 2);
        let first = &items.records[0];
        assert_eq!(first.audit_id, "a1");
        assert_eq!(first.record_type, RecordType::Question);
        assert_eq!(first.response, AnswerValue::from("X100"));
        assert_eq!(first.item_index, Some(1));
        let second = &items.records[1];
        assert_eq!(second.item_index, Some(2));
        assert_eq!(second.label, None);
        assert_eq!(second.parent_ids.as_deref(), Some("i0,i1"));
        assert_eq!(second.record_type, RecordType::Section);
    }

    #[test]
    fn keeps_extra_columns_in_input_order() {
        let items = items_from_frame(&export_frame(true)).unwrap();
        assert_eq!(items.columns[0], "created_at");
        assert_eq!(items.extra_columns, vec!["created_at".to_string()]);
        assert_eq!(items.records[0].extra, vec![AnswerValue::from("2024-01-01")]);
        assert_eq!(items.records[1].extra, vec![AnswerValue::Missing]);
    }

    #[test]
    fn records_keep_their_raw_cells() {
        let items = items_from_frame(&export_frame(true)).unwrap();
        assert_eq!(
            items.records[1].raw_cells,
            vec![
                None,
                Some("a1".to_string()),
                Some("i2".to_string()),
                Some("2.0".to_string()),
                Some("i0,i1".to_string()),
                Some("  ".to_string()),
                None,
                Some("section".to_string()),
                None,
            ]
        );
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let df = frame_from_columns(vec![column("audit_id", &[Some("a1")])]).unwrap();
        let error = items_from_frame(&df).unwrap_err();
        assert!(matches!(error, IngestError::MissingColumn { column } if column == "item_id"));
    }

    #[test]
    fn parses_item_indexes() {
        assert_eq!(parse_item_index("7"), Some(7));
        assert_eq!(parse_item_index(" 12.0 "), Some(12));
        assert_eq!(parse_item_index("1.5"), None);
        assert_eq!(parse_item_index("seven"), None);
    }
}
