use std::collections::HashSet;

use chrono::{NaiveDate, NaiveTime};

use crate::error::AttendanceError;
use crate::model::correction::{CorrectionRecord, ID_COLUMNS, canonical_column, is_student_column};
use crate::model::sheet::{Record, Sheet};
use crate::utils::cells::{parse_optional_date, parse_optional_time};

/// A melted row before display formatting. Sorting happens on these typed
/// values; the MM/DD/YYYY and HH:MM strings would not sort correctly.
struct PendingCorrection<'a> {
    date: NaiveDate,
    time: Option<NaiveTime>,
    full_name: &'a str,
    record: Record<'a>,
}

impl PendingCorrection<'_> {
    fn id(&self, column: &str) -> String {
        self.record.get(column).unwrap_or_default().to_string()
    }

    fn into_record(self) -> CorrectionRecord {
        CorrectionRecord {
            submitted_by: self.id("SubmittedBy"),
            timestamp: self.id("Timestamp"),
            full_name: self.full_name.to_string(),
            date: self.date.format("%m/%d/%Y").to_string(),
            session: self.id("Session"),
            time: self
                .time
                .map(|t| t.format("%H:%M").to_string())
                .unwrap_or_default(),
            action: self.id("Action"),
            grade: self.id("Grade"),
            notes: self.id("Notes"),
        }
    }
}

/// Flattens the correction form (one picker column per grade) into one
/// record per named student, limited to `date_start..=date_end` and,
/// optionally, to `students`. Any unparseable Date or Time cell fails the
/// whole call, including rows outside the range.
pub fn normalize_corrections(
    raw: &Sheet,
    date_start: NaiveDate,
    date_end: NaiveDate,
    students: Option<&HashSet<String>>,
) -> Result<Vec<CorrectionRecord>, AttendanceError> {
    if date_end < date_start {
        return Err(AttendanceError::InvalidRange {
            start: date_start,
            end: date_end,
        });
    }

    let renamed = Sheet {
        header: raw.header.iter().map(|h| canonical_column(h).to_string()).collect(),
        rows: raw.rows.clone(),
    };

    if renamed.is_empty() {
        return Ok(Vec::new());
    }

    if let Some(missing) = ID_COLUMNS.iter().find(|c| renamed.column_index(c).is_none()) {
        return Err(AttendanceError::Parse(format!("missing column '{}'", missing)));
    }

    let student_columns: Vec<usize> = renamed
        .header
        .iter()
        .enumerate()
        .filter(|(_, h)| is_student_column(h))
        .map(|(idx, _)| idx)
        .collect();

    let mut in_range = Vec::new();
    for record in renamed.records() {
        let date = parse_optional_date(record.require("Date")?)?;
        let time = parse_optional_time(record.require("Time")?)?;
        if let Some(date) = date.filter(|d| *d >= date_start && *d <= date_end) {
            in_range.push((record, date, time));
        }
    }

    // one pass per picker column, like stacking the columns on top of each other
    let mut melted: Vec<PendingCorrection<'_>> = Vec::new();
    for &col in &student_columns {
        for (record, date, time) in &in_range {
            let full_name = record.cell(col);
            if full_name.is_empty() {
                continue;
            }
            if students.is_some_and(|s| !s.contains(full_name)) {
                continue;
            }
            melted.push(PendingCorrection {
                date: *date,
                time: *time,
                full_name,
                record: *record,
            });
        }
    }

    melted.sort_by(|a, b| {
        let session_a = a.record.get("Session").unwrap_or_default();
        let session_b = b.record.get("Session").unwrap_or_default();
        (a.date, a.full_name, session_a, a.time.is_none(), a.time).cmp(&(
            b.date,
            b.full_name,
            session_b,
            b.time.is_none(),
            b.time,
        ))
    });

    Ok(melted.into_iter().map(PendingCorrection::into_record).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    const HEADER: [&str; 12] = [
        "Timestamp",
        "Email Address",
        "Choose Grade of Student",
        "Checkin, Checkout, or Remove?",
        "StudentName",
        "Additional Notes",
        "Date",
        "Time",
        "Session",
        "Choose Student (Grade 3)",
        "Choose Student (Grade 4)",
        "Choose Student (Grade 5)",
    ];

    fn form(rows: Vec<Vec<String>>) -> Sheet {
        Sheet {
            header: HEADER.iter().map(|h| h.to_string()).collect(),
            rows,
        }
    }

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn submission(date: &str, time: &str, session: &str, g3: &str, g4: &str, g5: &str) -> Vec<String> {
        [
            "9/5/2024 10:00:00",
            "staff@school.org",
            "3",
            "checkin",
            "",
            "forgot to tap",
            date,
            time,
            session,
            g3,
            g4,
            g5,
        ]
        .iter()
        .map(|c| c.to_string())
        .collect()
    }

    #[test]
    fn blank_picker_columns_produce_no_records() {
        let sheet = form(vec![submission("9/5/2024", "8:15:00 AM", "Morning", "Jane Doe", "", "")]);
        let records = normalize_corrections(&sheet, day(1), day(30), None).unwrap();

        assert_eq!(records.len(), 1);
        let r = &records[0];
        assert_eq!(r.full_name, "Jane Doe");
        assert_eq!(r.submitted_by, "staff@school.org");
        assert_eq!(r.action, "checkin");
        assert_eq!(r.notes, "forgot to tap");
        assert_eq!(r.date, "09/05/2024");
        assert_eq!(r.time, "08:15");
    }

    #[test]
    fn one_submission_can_name_several_grades() {
        let sheet = form(vec![submission("9/5/2024", "15:00:00", "Afternoon", "Jane Doe", "Bo Diaz", "")]);
        let records = normalize_corrections(&sheet, day(5), day(5), None).unwrap();
        let names: Vec<_> = records.iter().map(|r| r.full_name.as_str()).collect();
        assert_eq!(names, vec!["Bo Diaz", "Jane Doe"]);
    }

    #[test]
    fn sorted_on_real_dates_not_display_strings() {
        // "12/01/2023" sorts before "02/01/2024" as text but after it as a date
        let sheet = form(vec![
            submission("2/1/2024", "08:00", "Morning", "Jane Doe", "", ""),
            submission("12/1/2023", "08:00", "Morning", "Jane Doe", "", ""),
        ]);
        let start = NaiveDate::from_ymd_opt(2023, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 12, 31).unwrap();
        let records = normalize_corrections(&sheet, start, end, None).unwrap();
        let dates: Vec<_> = records.iter().map(|r| r.date.as_str()).collect();
        assert_eq!(dates, vec!["12/01/2023", "02/01/2024"]);
    }

    #[test]
    fn filters_range_and_students_after_melting() {
        let sheet = form(vec![
            submission("9/2/2024", "08:00", "Morning", "Jane Doe", "Bo Diaz", ""),
            submission("9/9/2024", "08:00", "Morning", "Jane Doe", "", ""),
        ]);
        let only_bo = HashSet::from(["Bo Diaz".to_string()]);
        let records = normalize_corrections(&sheet, day(1), day(3), Some(&only_bo)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].full_name, "Bo Diaz");
    }

    #[test]
    fn bad_date_anywhere_fails_the_call() {
        let sheet = form(vec![
            submission("9/5/2024", "08:00", "Morning", "Jane Doe", "", ""),
            submission("someday", "08:00", "Morning", "Bo Diaz", "", ""),
        ]);
        let err = normalize_corrections(&sheet, day(5), day(5), None).unwrap_err();
        assert!(matches!(err, AttendanceError::Parse(_)));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = normalize_corrections(&form(vec![]), day(5), day(1), None).unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidRange { .. }));
    }

    #[test]
    fn empty_form_is_empty_result() {
        assert!(normalize_corrections(&Sheet::default(), day(1), day(2), None).unwrap().is_empty());
    }
}
