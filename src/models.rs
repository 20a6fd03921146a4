use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::model::attendance::{Action, AttendanceEvent, TimelineRow};
use crate::model::correction::CorrectionRecord;
use crate::model::student::Student;
use crate::model::time_period::TimePeriod;

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct DayQuery {
    /// Day to report (YYYY-MM-DD). Defaults to today.
    #[param(value_type = Option<String>, example = "2024-09-05")]
    pub date: Option<NaiveDate>,
    /// morning or afternoon, any casing. Defaults to the current period.
    #[param(value_type = Option<String>, example = "morning")]
    pub period: Option<TimePeriod>,
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct RangeQuery {
    /// First day included (YYYY-MM-DD). Defaults to today.
    #[param(value_type = Option<String>, example = "2024-09-01")]
    pub date_start: Option<NaiveDate>,
    /// Last day included. Defaults to the day after `date_start`.
    #[param(value_type = Option<String>, example = "2024-09-30")]
    pub date_end: Option<NaiveDate>,
    /// Comma separated full names
    #[param(example = "Jane Doe,Bo Diaz")]
    pub students: Option<String>,
    /// Keep only the last row per student, day and action
    pub drop_duplicates: Option<bool>,
}

impl RangeQuery {
    pub fn student_filter(&self) -> Option<HashSet<String>> {
        let names: HashSet<String> = self
            .students
            .as_deref()?
            .split(',')
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(String::from)
            .collect();
        if names.is_empty() { None } else { Some(names) }
    }
}

#[derive(Debug, Default, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct BoardQuery {
    /// checkin (default) or checkout
    #[param(value_type = Option<String>, example = "checkin")]
    pub action: Option<Action>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SubmitRequest {
    #[schema(example = json!(["Jane Doe", "Bo Diaz"]))]
    pub students: Vec<String>,
    /// Time staff say the student actually arrived/left (HH:MM:SS)
    #[schema(example = "08:00:00", value_type = Option<String>, nullable = true)]
    pub override_time: Option<NaiveTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TodaySummary {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub period: TimePeriod,
    pub checked_in: Vec<AttendanceEvent>,
    pub checked_out: Vec<AttendanceEvent>,
    /// Checked in and not checked out, sorted
    pub present: Vec<String>,
    pub checked_in_count: usize,
    pub checked_out_count: usize,
    pub present_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CurrentView {
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub period: TimePeriod,
    pub present: Vec<String>,
    pub morning: Vec<AttendanceEvent>,
    pub afternoon: Vec<AttendanceEvent>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SubmitResult {
    pub log: Action,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub period: TimePeriod,
    pub written: Vec<AttendanceEvent>,
    /// Already recorded this period (or repeated in the request)
    pub skipped: Vec<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BoardEntry {
    pub full_name: String,
    pub first_name: String,
    pub last_name: String,
    pub grade: String,
    #[schema(example = "Jane Doe (3)")]
    pub label: String,
    pub recorded: bool,
    #[schema(value_type = Option<String>, nullable = true)]
    pub time: Option<NaiveTime>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct Board {
    pub log: Action,
    #[schema(value_type = String, format = "date")]
    pub date: NaiveDate,
    pub period: TimePeriod,
    pub grades: Vec<String>,
    pub last_name_initials: Vec<String>,
    pub students: Vec<BoardEntry>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct TimelineResponse {
    #[schema(value_type = String, format = "date")]
    pub date_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub date_end: NaiveDate,
    pub data: Vec<TimelineRow>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CorrectionsResponse {
    #[schema(value_type = String, format = "date")]
    pub date_start: NaiveDate,
    #[schema(value_type = String, format = "date")]
    pub date_end: NaiveDate,
    pub data: Vec<CorrectionRecord>,
    pub total: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct RosterResponse {
    pub data: Vec<Student>,
    pub total: usize,
}
