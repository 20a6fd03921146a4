use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::error::AttendanceError;
use crate::model::sheet::Record;
use crate::utils::cells::normalize_grade;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "PascalCase")]
pub struct Student {
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "Jane")]
    pub first_name: String,
    #[schema(example = "Doe")]
    pub last_name: String,
    #[schema(example = "3")]
    pub grade: String,
}

impl Student {
    /// `None` for roster rows with no name.
    pub fn from_record(record: &Record<'_>) -> Result<Option<Self>, AttendanceError> {
        let full_name = record.require("FullName")?;
        if full_name.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self {
            full_name: full_name.to_string(),
            first_name: record.require("FirstName")?.to_string(),
            last_name: record.require("LastName")?.to_string(),
            grade: normalize_grade(record.require("Grade")?),
        }))
    }

    /// "Jane Doe (3)"
    pub fn display_name(&self) -> String {
        format!("{} ({})", self.full_name, self.grade)
    }

    pub fn last_name_initial(&self) -> Option<char> {
        self.last_name.chars().next().map(|c| c.to_ascii_uppercase())
    }
}

/// Distinct grades in roster order.
pub fn grades(roster: &[Student]) -> Vec<String> {
    let mut seen = Vec::new();
    for s in roster {
        if !seen.contains(&s.grade) {
            seen.push(s.grade.clone());
        }
    }
    seen
}

pub fn last_name_initials(roster: &[Student]) -> Vec<char> {
    let mut letters: Vec<char> = roster.iter().filter_map(Student::last_name_initial).collect();
    letters.sort_unstable();
    letters.dedup();
    letters
}
