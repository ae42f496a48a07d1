//! Source records handed over by the query layer.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use crate::spec::SpecReportLabels;

/// Production shift code as stored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum EnumShiftCode {
    /// Day shift (`DAY`).
    Day,
    /// Night shift (`NIGHT`).
    Night,
}

impl EnumShiftCode {
    /// Parse a stored shift code; tolerant of case and surrounding whitespace.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "DAY" => Some(Self::Day),
            "NIGHT" => Some(Self::Night),
            _ => None,
        }
    }

    /// Display label for this shift.
    pub fn label<'a>(&self, labels: &'a SpecReportLabels) -> &'a str {
        match self {
            Self::Day => &labels.shift_day,
            Self::Night => &labels.shift_night,
        }
    }
}

/// One production process row, already joined with display names.
///
/// Records must arrive sorted ascending by
/// `(prod_date, factory_name, workshop_name, line_name, process_name)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExportRecord {
    pub prod_date: NaiveDate,
    pub factory_name: String,
    pub workshop_name: String,
    pub line_name: String,
    pub process_name: String,
    #[serde(default)]
    pub shift: Option<EnumShiftCode>,
    #[serde(default)]
    pub machine_no: Option<String>,
    #[serde(default)]
    pub product_code: Option<String>,
    #[serde(default)]
    pub series_name: Option<String>,
    #[serde(default)]
    pub ct: Option<f64>,
    #[serde(default)]
    pub equipment_count: Option<i64>,
    #[serde(default)]
    pub run_minutes: Option<i64>,
    #[serde(default)]
    pub target_output: Option<i64>,
    #[serde(default)]
    pub actual_output: Option<i64>,
    #[serde(default)]
    pub down_minutes: Option<i64>,
    #[serde(default)]
    pub fa: Option<String>,
    #[serde(default)]
    pub ca: Option<String>,
}

impl ExportRecord {
    /// Record with the hierarchical key set and every other field empty.
    pub fn new(
        prod_date: NaiveDate,
        factory_name: impl Into<String>,
        workshop_name: impl Into<String>,
        line_name: impl Into<String>,
        process_name: impl Into<String>,
    ) -> Self {
        Self {
            prod_date,
            factory_name: factory_name.into(),
            workshop_name: workshop_name.into(),
            line_name: line_name.into(),
            process_name: process_name.into(),
            shift: None,
            machine_no: None,
            product_code: None,
            series_name: None,
            ct: None,
            equipment_count: None,
            run_minutes: None,
            target_output: None,
            actual_output: None,
            down_minutes: None,
            fa: None,
            ca: None,
        }
    }

    /// Set target/actual metrics.
    pub fn with_metrics(mut self, target_output: Option<i64>, actual_output: Option<i64>) -> Self {
        self.target_output = target_output;
        self.actual_output = actual_output;
        self
    }
}

/// One repair ticket row, already joined with display names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairRecord {
    pub occur_at: NaiveDateTime,
    #[serde(default)]
    pub shift: Option<EnumShiftCode>,
    pub factory_name: String,
    pub workshop_name: String,
    pub line_name: String,
    #[serde(default)]
    pub model_name: Option<String>,
    #[serde(default)]
    pub machine_no: Option<String>,
    #[serde(default)]
    pub abnormal_category_name: Option<String>,
    #[serde(default)]
    pub abnormal_type_name: Option<String>,
    #[serde(default)]
    pub abnormal_desc: Option<String>,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub is_fixed: bool,
    #[serde(default)]
    pub fixed_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub repair_minutes: Option<i64>,
    #[serde(default)]
    pub team_name: Option<String>,
    #[serde(default)]
    pub responsible_person_name: Option<String>,
    #[serde(default)]
    pub repair_person_names: Vec<String>,
}
