//! Data model for inspection-audit exports.
//!
//! - **record**: long-form items as exported, one row per question per audit
//! - **table**: row-major tables used for the reshaped outputs
//! - **options**: run configuration with template defaults
//! - **columns**: fixed column and field names of the export

pub mod columns;
pub mod error;
pub mod options;
pub mod record;
pub mod table;

pub use error::{ModelError, Result};
pub use options::{
    LabelMode, RelationNames, RepeatingGroupSpec, ReportConfig, ReshapeOptions,
    StatisticsOptions,
};
pub use record::{AnswerValue, InspectionItems, QuestionRecord, RecordType};
pub use table::Table;
