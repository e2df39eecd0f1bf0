//! Run configuration.
//!
//! Every field has a default matching the customer activity report template, so
//! a configuration file only needs the values that differ.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::columns;
use crate::error::{ModelError, Result};

/// How the pivot column key is built for each question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LabelMode {
    /// `<parent or category> - <question>`.
    #[default]
    Combined,
    /// Same as `Combined` with ` - <item id>` appended.
    WithItemId,
}

/// A numerically indexed set of form fields such as `Device 3 - Serial Number`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatingGroupSpec {
    /// Field-name prefix, e.g. `Device`.
    pub prefix: String,
    /// Field names of one group instance, in output order.
    pub suffixes: Vec<String>,
    /// Parent-row columns copied onto every child row.
    pub passthrough: Vec<String>,
}

impl RepeatingGroupSpec {
    pub fn new(prefix: impl Into<String>, suffixes: &[&str]) -> Self {
        Self {
            prefix: prefix.into(),
            suffixes: suffixes.iter().map(|suffix| (*suffix).to_string()).collect(),
            passthrough: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_passthrough(mut self, column: impl Into<String>) -> Self {
        self.passthrough.push(column.into());
        self
    }

    /// Wide-table column holding `suffix` for group `index`.
    pub fn column_name(&self, index: usize, suffix: &str) -> String {
        format!("{} {index} - {suffix}", self.prefix)
    }

    /// Parts replaced during the intervention.
    pub fn parts_replaced() -> Self {
        Self::new(
            "Part Data",
            &[
                "Part Designator",
                "Part Number",
                "Part Reference Designator (ex. PP601)",
                "Part Quantity",
                "Serial number - NEW part",
                "Serial number - REPLACED part",
            ],
        )
        .with_passthrough(columns::SERVICE_DATE)
    }

    /// Devices used during the intervention.
    pub fn devices() -> Self {
        Self::new(
            "Device",
            &["Indicate type:", "Serial Number", "Type of tool"],
        )
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.prefix.trim().is_empty() {
            return Err(ModelError::InvalidConfig(format!(
                "{name}: group prefix must not be empty"
            )));
        }
        if self.suffixes.is_empty() {
            return Err(ModelError::InvalidConfig(format!(
                "{name}: at least one group field is required"
            )));
        }
        Ok(())
    }
}

impl Default for RepeatingGroupSpec {
    fn default() -> Self {
        Self::new("", &[])
    }
}

/// Options for the reshape engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReshapeOptions {
    /// Record types dropped before labeling.
    pub excluded_types: Vec<String>,
    /// Marker of conditional questions whose parent is the second parent id.
    pub anomaly_marker: String,
    /// Marker of conditional questions whose parent is the first parent id.
    pub response_marker: String,
    pub label_mode: LabelMode,
    pub parts: RepeatingGroupSpec,
    pub devices: RepeatingGroupSpec,
    /// Pivoted service date column.
    pub service_date_column: String,
    /// Derived `YYYY-MM-DD` column.
    pub formatted_date_column: String,
    /// Restrict the run to audits serviced in this calendar year.
    pub year: Option<i32>,
}

impl Default for ReshapeOptions {
    fn default() -> Self {
        Self {
            excluded_types: vec![
                "information".to_string(),
                "section".to_string(),
                "signature".to_string(),
            ],
            anomaly_marker: "Anomaly?".to_string(),
            response_marker: "if response is".to_string(),
            label_mode: LabelMode::default(),
            parts: RepeatingGroupSpec::parts_replaced(),
            devices: RepeatingGroupSpec::devices(),
            service_date_column: columns::SERVICE_DATE.to_string(),
            formatted_date_column: columns::SERVICE_DATE_FORMATTED.to_string(),
            year: None,
        }
    }
}

/// Columns summarized after the run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatisticsOptions {
    /// Columns that get a blank count and value-frequency breakdown.
    pub columns: Vec<String>,
    /// Column whose first token is expected to be a site number.
    pub site_column: String,
}

impl Default for StatisticsOptions {
    fn default() -> Self {
        Self {
            columns: vec![
                columns::INVERTER_SN.to_string(),
                columns::INVERTER_TECHNOLOGY.to_string(),
                columns::INVERTER_MODEL.to_string(),
                columns::CASE_TYPE.to_string(),
                columns::TECH_NAME.to_string(),
                columns::SITE_NAME.to_string(),
                columns::SERVICE_DATE.to_string(),
            ],
            site_column: columns::SITE_NAME.to_string(),
        }
    }
}

/// Relation names inside the output snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RelationNames {
    pub main: String,
    pub parts: String,
    pub devices: String,
}

impl Default for RelationNames {
    fn default() -> Self {
        Self {
            main: "main_table".to_string(),
            parts: "replaced_parts".to_string(),
            devices: "devices".to_string(),
        }
    }
}

/// Complete configuration of one report run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    /// Shared stem of every output file.
    pub base_name: String,
    pub reshape: ReshapeOptions,
    pub statistics: StatisticsOptions,
    pub relations: RelationNames,
    pub write_database: bool,
    pub write_workbook: bool,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            base_name: "inspection_report".to_string(),
            reshape: ReshapeOptions::default(),
            statistics: StatisticsOptions::default(),
            relations: RelationNames::default(),
            write_database: true,
            write_workbook: true,
        }
    }
}

impl ReportConfig {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: Self = toml::from_str(source).map_err(ModelError::Toml)?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a TOML configuration file.
    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).map_err(|source| ModelError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    pub fn validate(&self) -> Result<()> {
        if self.base_name.trim().is_empty() {
            return Err(ModelError::InvalidConfig(
                "base_name must not be empty".to_string(),
            ));
        }
        self.reshape.parts.validate("reshape.parts")?;
        self.reshape.devices.validate("reshape.devices")?;
        Ok(())
    }
}
