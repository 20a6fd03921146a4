use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, de};
use strum_macros::{Display, EnumString};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::model::sheet::Record;
use crate::model::time_period::TimePeriod;
use crate::utils::cells::{normalize_grade, parse_date, parse_optional_time, parse_time};

/// Column order of the checkin and checkout worksheets. Appends must follow
/// it exactly.
pub const LOG_COLUMNS: [&str; 7] = [
    "SubmitTime",
    "SubmitDate",
    "OverrideTime",
    "FullName",
    "LastName",
    "FirstName",
    "Grade",
];

pub const TIME_FORMAT: &str = "%H:%M:%S";
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Action {
    Checkin,
    Checkout,
}

impl<'de> Deserialize<'de> for Action {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.trim()
            .parse()
            .map_err(|_| de::Error::unknown_variant(&raw, &["checkin", "checkout"]))
    }
}

/// One row of the checkin or checkout log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct AttendanceEvent {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "2024-09-05", value_type = String, format = "date")]
    pub submit_date: NaiveDate,
    #[schema(example = "08:10:00", value_type = String)]
    pub submit_time: NaiveTime,
    #[schema(example = "08:00:00", value_type = Option<String>, nullable = true)]
    pub override_time: Option<NaiveTime>,
    #[schema(example = "3")]
    pub grade: String,
    pub action: Action,
}

impl AttendanceEvent {
    pub fn from_record(action: Action, record: &Record<'_>) -> Result<Self, AttendanceError> {
        Ok(Self {
            full_name: record.require("FullName")?.to_string(),
            first_name: record.get("FirstName").unwrap_or_default().to_string(),
            last_name: record.get("LastName").unwrap_or_default().to_string(),
            submit_date: parse_date(record.require("SubmitDate")?)?,
            submit_time: parse_time(record.require("SubmitTime")?)?,
            override_time: parse_optional_time(record.get("OverrideTime").unwrap_or_default())?,
            grade: normalize_grade(record.get("Grade").unwrap_or_default()),
            action,
        })
    }

    /// Cells in `LOG_COLUMNS` order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.submit_time.format(TIME_FORMAT).to_string(),
            self.submit_date.format(DATE_FORMAT).to_string(),
            self.override_time
                .map(|t| t.format(TIME_FORMAT).to_string())
                .unwrap_or_default(),
            self.full_name.clone(),
            self.last_name.clone(),
            self.first_name.clone(),
            self.grade.clone(),
        ]
    }

    /// Time shown to staff: the override when one was entered.
    pub fn display_time(&self) -> NaiveTime {
        self.override_time.unwrap_or(self.submit_time)
    }

    /// Bucketing always uses the recorded submit time, never the override.
    pub fn period(&self) -> TimePeriod {
        TimePeriod::classify(self.submit_time)
    }
}

/// One line of the merged checkin/checkout history. Field order is the
/// report's column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct TimelineRow {
    pub last_name: String,
    pub first_name: String,
    pub action: Action,
    #[schema(value_type = String, format = "date")]
    pub submit_date: NaiveDate,
    #[schema(value_type = String)]
    pub submit_time: NaiveTime,
    #[schema(value_type = Option<String>, nullable = true)]
    pub override_time: Option<NaiveTime>,
    pub grade: String,
}

impl From<AttendanceEvent> for TimelineRow {
    fn from(e: AttendanceEvent) -> Self {
        Self {
            last_name: e.last_name,
            first_name: e.first_name,
            action: e.action,
            submit_date: e.submit_date,
            submit_time: e.submit_time,
            override_time: e.override_time,
            grade: e.grade,
        }
    }
}
