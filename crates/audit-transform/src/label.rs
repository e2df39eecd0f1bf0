//! Combined label resolution.
//!
//! A combined label is the pivot column key of a question. Plain questions are
//! keyed by `<category> - <question>`. Conditional questions carry a marker in
//! their text and take the question text of one of their parents instead of
//! the category, so that follow-up questions land next to the question that
//! triggered them.

use std::collections::HashMap;

use audit_model::{LabelMode, QuestionRecord, ReshapeOptions};

use crate::error::LabelError;

/// Which parent a conditional question is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentRule {
    /// The question contains the anomaly marker; the parent is the second entry.
    Anomaly,
    /// The question contains the response marker; the parent is the first entry.
    Response,
}

/// Parent ids a conditional question needs, whichever entry it reads.
pub const MIN_CONDITIONAL_PARENTS: usize = 2;

impl ParentRule {
    /// Position in the parent id list that holds the semantic parent.
    pub fn position(self) -> usize {
        match self {
            Self::Anomaly => 1,
            Self::Response => 0,
        }
    }
}

/// Markers and label mode driving resolution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LabelRules {
    pub anomaly_marker: String,
    pub response_marker: String,
    pub mode: LabelMode,
}

impl Default for LabelRules {
    fn default() -> Self {
        Self::from_options(&ReshapeOptions::default())
    }
}

impl LabelRules {
    pub fn from_options(options: &ReshapeOptions) -> Self {
        Self {
            anomaly_marker: options.anomaly_marker.clone(),
            response_marker: options.response_marker.clone(),
            mode: options.label_mode,
        }
    }

    /// Conditional rule matching `question`. The anomaly marker takes precedence.
    pub fn parent_rule(&self, question: &str) -> Option<ParentRule> {
        if !self.anomaly_marker.is_empty() && question.contains(&self.anomaly_marker) {
            Some(ParentRule::Anomaly)
        } else if !self.response_marker.is_empty() && question.contains(&self.response_marker) {
            Some(ParentRule::Response)
        } else {
            None
        }
    }

    fn marker(&self, rule: ParentRule) -> &str {
        match rule {
            ParentRule::Anomaly => &self.anomaly_marker,
            ParentRule::Response => &self.response_marker,
        }
    }
}

/// How a label was obtained.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LabelSource {
    Category,
    /// Parent question text found in the same audit.
    Parent,
    /// Parent id did not resolve; the raw id stands in for the text.
    UnresolvedParent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedLabel {
    pub label: String,
    pub source: LabelSource,
}

/// Resolves `record` against the other records of its audit.
///
/// `audit_records` may contain records of other audits; only those sharing the
/// audit id of `record` are considered as parents.
pub fn resolve_label(
    record: &QuestionRecord,
    audit_records: &[QuestionRecord],
    rules: &LabelRules,
) -> Result<ResolvedLabel, LabelError> {
    resolve_with(record, rules, |parent_id| {
        audit_records
            .iter()
            .find(|candidate| {
                candidate.audit_id == record.audit_id && candidate.item_id == parent_id
            })
            .and_then(QuestionRecord::question_text)
    })
}

/// Default label `<category> - <question>`, plus the item id in
/// [`LabelMode::WithItemId`].
pub fn category_label(record: &QuestionRecord, mode: LabelMode) -> Result<String, LabelError> {
    let question = question_text(record)?;
    let category = record.category.as_deref().unwrap_or_default();
    Ok(finish(format!("{category} - {question}"), record, mode))
}

/// Parent question lookup over a whole record set, keyed by (audit, item).
///
/// The first record of a duplicated item id wins.
#[derive(Debug, Default)]
pub struct LabelResolver<'a> {
    rules: LabelRules,
    /// audit id -> item id -> question text
    questions: HashMap<&'a str, HashMap<&'a str, &'a str>>,
}

impl<'a> LabelResolver<'a> {
    pub fn new(records: &'a [QuestionRecord], rules: LabelRules) -> Self {
        let mut questions: HashMap<&'a str, HashMap<&'a str, &'a str>> = HashMap::new();
        for record in records {
            if let Some(text) = record.question_text() {
                questions
                    .entry(record.audit_id.as_str())
                    .or_default()
                    .entry(record.item_id.as_str())
                    .or_insert(text);
            }
        }
        Self { rules, questions }
    }

    pub fn rules(&self) -> &LabelRules {
        &self.rules
    }

    pub fn resolve(&self, record: &QuestionRecord) -> Result<ResolvedLabel, LabelError> {
        resolve_with(record, &self.rules, |parent_id| {
            self.questions
                .get(record.audit_id.as_str())
                .and_then(|items| items.get(parent_id))
                .copied()
        })
    }
}

fn resolve_with<'p>(
    record: &QuestionRecord,
    rules: &LabelRules,
    parent_text: impl Fn(&str) -> Option<&'p str>,
) -> Result<ResolvedLabel, LabelError> {
    let question = question_text(record)?;
    let Some(rule) = rules.parent_rule(question) else {
        return Ok(ResolvedLabel {
            label: category_label(record, rules.mode)?,
            source: LabelSource::Category,
        });
    };

    let parents = record.parent_id_list();
    let position = rule.position();
    let parent_id = (parents.len() >= MIN_CONDITIONAL_PARENTS)
        .then(|| parents.get(position).copied())
        .flatten()
        .filter(|id| !id.is_empty());
    let Some(parent_id) = parent_id else {
        return Err(LabelError::ParentIdMissing {
            audit_id: record.audit_id.clone(),
            item_id: record.item_id.clone(),
            marker: rules.marker(rule).to_string(),
            position,
            found: parents.len(),
        });
    };

    let (prefix, source) = match parent_text(parent_id) {
        Some(text) => (text.to_string(), LabelSource::Parent),
        None => (parent_id.to_string(), LabelSource::UnresolvedParent),
    };
    Ok(ResolvedLabel {
        label: finish(format!("{prefix} - {question}"), record, rules.mode),
        source,
    })
}

fn question_text(record: &QuestionRecord) -> Result<&str, LabelError> {
    record
        .question_text()
        .ok_or_else(|| LabelError::EmptyQuestion {
            audit_id: record.audit_id.clone(),
            item_id: record.item_id.clone(),
        })
}

fn finish(label: String, record: &QuestionRecord, mode: LabelMode) -> String {
    match mode {
        LabelMode::Combined => label,
        LabelMode::WithItemId => format!("{label} - {}", record.item_id),
    }
}
