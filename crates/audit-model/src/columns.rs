//! Column and field names of the inspection-items export.
//!
//! Names are case-sensitive and match the export byte for byte.

/// Audit (report) identifier.
pub const AUDIT_ID: &str = "audit_id";
/// Item identifier, unique within an audit.
pub const ITEM_ID: &str = "item_id";
/// Position of the item within its audit.
pub const ITEM_INDEX: &str = "item_index";
/// Comma-joined list of parent item identifiers.
pub const PARENT_IDS: &str = "parent_ids";
/// Question text.
pub const LABEL: &str = "label";
/// Category (section heading) of the question.
pub const CATEGORY: &str = "category";
/// Record type (`question`, `section`, ...).
pub const TYPE: &str = "type";
/// Answer value.
pub const RESPONSE: &str = "response";

/// Columns every input table must provide.
pub const REQUIRED_COLUMNS: [&str; 8] = [
    AUDIT_ID, ITEM_ID, ITEM_INDEX, PARENT_IDS, LABEL, CATEGORY, TYPE, RESPONSE,
];

/// Derived column appended to the labeled intermediate table.
pub const COMBINED_LABEL: &str = "Question combined label";

/// Relation holding the inspection items inside an exported snapshot.
pub const INSPECTION_ITEMS_RELATION: &str = "inspection_items";

/// Question text of the service date item, used by the year filter.
pub const SERVICE_DATE_LABEL: &str = "Service Date (YYYY-MM-DD)*";

// Pivoted column names used by the default report configuration.
pub const INVERTER_SN: &str = "General Information - Inverter Serial Number";
pub const INVERTER_MODEL: &str = "General Information - Model";
pub const CASE_TYPE: &str = "General Information - Type of Service";
pub const TECH_NAME: &str = "General Information - Technician Name*";
pub const SITE_NAME: &str = "Site Information - Site Name*";
pub const SERVICE_DATE: &str = "General Information - Service Date (YYYY-MM-DD)*";
pub const SERVICE_DATE_FORMATTED: &str = "Service date formatted Y-m-d";
pub const INVERTER_TECHNOLOGY: &str =
    "Inverter Preventive Actions - Checklist - Select Inverter technology";
