use std::collections::HashMap;

use once_cell::sync::Lazy;
use serde::Serialize;
use utoipa::ToSchema;

/// Form question titles mapped to the names used everywhere else. Columns
/// not listed keep their title.
static COLUMN_RENAMES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    HashMap::from([
        ("Choose Grade of Student", "Grade"),
        ("Email Address", "SubmittedBy"),
        ("Checkin, Checkout, or Remove?", "Action"),
        ("StudentName", "FullName"),
        ("Additional Notes", "Notes"),
    ])
});

/// Every per-grade student picker on the form starts with this.
pub const STUDENT_COLUMN_MARKER: &str = "Choose Student (Grade";

/// Columns copied onto every melted record.
pub const ID_COLUMNS: [&str; 8] = [
    "Timestamp",
    "SubmittedBy",
    "Grade",
    "Session",
    "Action",
    "Date",
    "Time",
    "Notes",
];

pub fn canonical_column(title: &str) -> &str {
    let title = title.trim();
    COLUMN_RENAMES.get(title).copied().unwrap_or(title)
}

pub fn is_student_column(title: &str) -> bool {
    title.contains(STUDENT_COLUMN_MARKER)
}

/// One student named on one correction form submission, formatted for display
/// (`Date` as MM/DD/YYYY, `Time` as HH:MM).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct CorrectionRecord {
    #[schema(example = "staff@school.org")]
    pub submitted_by: String,
    pub timestamp: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "09/05/2024")]
    pub date: String,
    #[schema(example = "Morning")]
    pub session: String,
    #[schema(example = "08:15")]
    pub time: String,
    #[schema(example = "checkin")]
    pub action: String,
    pub grade: String,
    pub notes: String,
}
