//! Descriptive statistics over the wide table.
//!
//! Read-only summaries printed to the run log once the artifacts are written.

use std::collections::{BTreeMap, HashMap};

use audit_model::{StatisticsOptions, Table};
use audit_transform::datetime::{month_bucket, parse_service_date};

/// Blank count and value frequencies of one column.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnOverview {
    pub column: String,
    pub total: usize,
    pub blank: usize,
    /// Non-blank values by descending count, ties in value order.
    pub frequencies: Vec<(String, usize)>,
}

impl ColumnOverview {
    pub fn blank_pct(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.blank as f64 / self.total as f64 * 100.0
        }
    }

    /// Part of the column name after the first ` - `, e.g. `Model` for
    /// `General Information - Model`.
    pub fn short_name(&self) -> &str {
        self.column
            .split_once(" - ")
            .map_or(self.column.as_str(), |(_, rest)| rest)
    }

    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec![format!(
            "Number of blank entries in {}: {} out of {} records, or {:.2}%",
            self.column,
            self.blank,
            self.total,
            self.blank_pct()
        )];
        lines.push(format!("Number of records per {} type:", self.short_name()));
        lines.extend(
            self.frequencies
                .iter()
                .map(|(value, count)| format!("    {value}: {count}")),
        );
        lines
    }
}

/// Overview of `column`, `None` if the table has no such column.
pub fn column_overview(table: &Table, column: &str) -> Option<ColumnOverview> {
    let values = table.column_values(column)?;
    let mut counts: HashMap<&str, usize> = HashMap::new();
    let mut blank = 0usize;
    for value in &values {
        match value.as_str() {
            Some(text) => *counts.entry(text).or_default() += 1,
            None => blank += 1,
        }
    }
    let mut frequencies: Vec<(String, usize)> = counts
        .into_iter()
        .map(|(value, count)| (value.to_string(), count))
        .collect();
    frequencies.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    Some(ColumnOverview {
        column: column.to_string(),
        total: values.len(),
        blank,
        frequencies,
    })
}

/// Non-blank site names whose first word is not a number.
pub fn count_non_numeric_sites(table: &Table, column: &str) -> Option<usize> {
    let values = table.column_values(column)?;
    Some(
        values
            .iter()
            .filter_map(|value| value.as_str())
            .filter(|site| {
                site.split_whitespace()
                    .next()
                    .is_none_or(|token| !token.chars().all(|c| c.is_ascii_digit()))
            })
            .count(),
    )
}

/// Service date summary: missing or unparseable cells and records per month.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DateSummary {
    pub invalid: usize,
    pub per_month: BTreeMap<String, usize>,
}

pub fn summarize_dates(table: &Table, column: &str) -> Option<DateSummary> {
    let values = table.column_values(column)?;
    let mut summary = DateSummary::default();
    for value in values {
        match value.as_str().and_then(parse_service_date) {
            Some(date) => *summary.per_month.entry(month_bucket(&date)).or_default() += 1,
            None => summary.invalid += 1,
        }
    }
    Some(summary)
}

/// Every statistic computed for one run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportStatistics {
    pub overviews: Vec<ColumnOverview>,
    /// Configured columns absent from the table.
    pub missing_columns: Vec<String>,
    pub non_numeric_sites: Option<usize>,
    pub dates: Option<DateSummary>,
}

impl ReportStatistics {
    pub fn compute(table: &Table, options: &StatisticsOptions, date_column: &str) -> Self {
        let mut statistics = Self::default();
        for column in &options.columns {
            match column_overview(table, column) {
                Some(overview) => statistics.overviews.push(overview),
                None => statistics.missing_columns.push(column.clone()),
            }
        }
        statistics.non_numeric_sites = count_non_numeric_sites(table, &options.site_column);
        statistics.dates = summarize_dates(table, date_column);
        statistics
    }

    /// Log lines in the order they are reported.
    pub fn describe(&self) -> Vec<String> {
        let mut lines = vec!["************ SOME DATA ANALYSIS ******************".to_string()];
        for overview in &self.overviews {
            lines.extend(overview.describe());
        }
        for column in &self.missing_columns {
            lines.push(format!("Column '{column}' does not exist in the main table."));
        }
        if let Some(count) = self.non_numeric_sites {
            lines.push(format!("Number of records without a site number: {count}"));
        }
        if let Some(dates) = &self.dates {
            lines.push(format!("Number of missing or invalid service dates: {}", dates.invalid));
            lines.push("Number of records per year and month:".to_string());
            lines.extend(
                dates
                    .per_month
                    .iter()
                    .map(|(month, count)| format!("    {month}: {count}")),
            );
        }
        lines
    }
}
