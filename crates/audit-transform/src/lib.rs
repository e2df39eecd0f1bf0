//! Long-to-wide reshaping of inspection-audit exports.
//!
//! - **datetime**: service date parsing and the year filter
//! - **label**: combined label resolution for plain and conditional questions
//! - **groups**: repeating-group extraction into child tables
//! - **pivot**: one row per audit, one column per combined label
//! - **reshape**: the stage-ordered engine tying the above together
//! - **progress**: the status and log channel passed into long-running steps

pub mod datetime;
pub mod error;
pub mod groups;
pub mod label;
pub mod labeled;
pub mod pivot;
pub mod progress;
pub mod reshape;

pub use datetime::{YearSelection, audits_in_year, parse_service_date, parse_timestamp};
pub use error::{LabelError, Result, TransformError};
pub use groups::{GroupExtraction, extract_repeating_group, max_group_index};
pub use label::{LabelResolver, LabelRules, LabelSource, ParentRule, ResolvedLabel, resolve_label};
pub use labeled::{LabeledItems, LabeledRecord};
pub use pivot::{PivotCollision, PivotOutcome, pivot_labeled};
pub use progress::{ProgressLog, ProgressSink, TracingProgress};
pub use reshape::{DateStats, LabelStats, ReshapeEngine, ReshapeOutput, ReshapeStats};
