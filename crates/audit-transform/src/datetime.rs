//! Service date parsing and normalization.
//!
//! The export writes timestamps as `YYYY-MM-DDTHH:MM:SSZ` or with a
//! fractional part, `YYYY-MM-DDTHH:MM:SS.fffZ`. Hand-edited exports also carry
//! plain dates and offset timestamps, which the lenient parser accepts.

use std::collections::BTreeSet;

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, Utc};

use audit_model::QuestionRecord;
use audit_model::columns::SERVICE_DATE_LABEL;

/// Whole-second UTC timestamp.
pub const SECONDS_FORMAT: &str = "%Y-%m-%dT%H:%M:%SZ";
/// UTC timestamp with fractional seconds.
pub const FRACTIONAL_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.fZ";
/// Text form of a normalized timestamp cell.
pub const CANONICAL_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Text form of the derived date column.
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Parses one of the two export timestamp shapes.
///
/// Returns `None` for anything else, including blank input.
pub fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    NaiveDateTime::parse_from_str(value, SECONDS_FORMAT)
        .or_else(|_| NaiveDateTime::parse_from_str(value, FRACTIONAL_FORMAT))
        .ok()
        .map(|naive| naive.and_utc())
}

/// Parses a service date cell.
///
/// Accepts the export shapes, RFC 3339 timestamps with an offset, the
/// canonical `YYYY-MM-DD HH:MM:SS` form and a bare `YYYY-MM-DD` date.
pub fn parse_service_date(value: &str) -> Option<DateTime<Utc>> {
    if let Some(parsed) = parse_timestamp(value) {
        return Some(parsed);
    }
    let value = value.trim();
    if value.is_empty() {
        return None;
    }
    if let Ok(parsed) = DateTime::parse_from_rfc3339(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(value, CANONICAL_FORMAT) {
        return Some(naive.and_utc());
    }
    NaiveDate::parse_from_str(value, DATE_FORMAT)
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

pub fn format_canonical(value: &DateTime<Utc>) -> String {
    value.format(CANONICAL_FORMAT).to_string()
}

pub fn format_date(value: &DateTime<Utc>) -> String {
    value.format(DATE_FORMAT).to_string()
}

/// `YYYY-MM` bucket used by the monthly statistics.
pub fn month_bucket(value: &DateTime<Utc>) -> String {
    value.format("%Y-%m").to_string()
}

/// Audits whose service date falls in one calendar year.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct YearSelection {
    pub audit_ids: BTreeSet<String>,
    /// Service date answers that could not be parsed.
    pub invalid_dates: usize,
}

/// Selects the audits whose service date question is answered with a date in `year`.
///
/// Only records whose question text is exactly the service date label count.
pub fn audits_in_year(records: &[QuestionRecord], year: i32) -> YearSelection {
    let mut selection = YearSelection::default();
    for record in records {
        if record.label.as_deref() != Some(SERVICE_DATE_LABEL) {
            continue;
        }
        let Some(raw) = record.response.as_str() else {
            continue;
        };
        match parse_timestamp(raw) {
            Some(date) if date.year() == year => {
                selection.audit_ids.insert(record.audit_id.clone());
            }
            Some(_) => {}
            None => selection.invalid_dates += 1,
        }
    }
    selection
}
