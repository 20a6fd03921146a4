//! Turns the raw checkin/checkout logs into attendance answers.
//!
//! The logs are append-only and may hold several rows for the same student
//! on the same day (double submits, concurrent sessions). Two tie-breaks are
//! used on purpose:
//!
//! * live presence keeps the **first** row of a period, since the earliest
//!   arrival is the one that counts;
//! * the history report keeps the **last** row per day and action, since a
//!   later submission is how staff correct an earlier one.

use std::collections::{HashMap, HashSet};

use chrono::NaiveDate;

use crate::error::AttendanceError;
use crate::model::attendance::{Action, AttendanceEvent, TimelineRow};
use crate::model::time_period::TimePeriod;

/// Effective events of one date/period: filtered, ordered by submit time,
/// first row per (student, date) kept.
pub fn deduplicate_period(
    events: &[AttendanceEvent],
    date: NaiveDate,
    period: TimePeriod,
) -> Vec<AttendanceEvent> {
    let mut bucket: Vec<&AttendanceEvent> = events
        .iter()
        .filter(|e| e.submit_date == date && e.period() == period)
        .collect();
    // stable: equal submit times keep log order
    bucket.sort_by_key(|e| e.submit_time);

    let mut seen: HashSet<(&str, NaiveDate)> = HashSet::new();
    bucket
        .into_iter()
        .filter(|e| seen.insert((e.full_name.as_str(), e.submit_date)))
        .cloned()
        .collect()
}

/// Students checked in but not (yet) checked out. Both inputs are expected
/// to be the same date/period bucket.
pub fn current_presence(
    checkin_events: &[AttendanceEvent],
    checkout_events: &[AttendanceEvent],
) -> HashSet<String> {
    let gone: HashSet<&str> = checkout_events.iter().map(|e| e.full_name.as_str()).collect();
    checkin_events
        .iter()
        .filter(|e| !gone.contains(e.full_name.as_str()))
        .map(|e| e.full_name.clone())
        .collect()
}

/// Both logs merged into one history between `date_start` and `date_end`
/// (inclusive), ordered by (LastName, FirstName, SubmitDate, SubmitTime).
/// With `drop_duplicates` only the last row of each
/// (LastName, FirstName, SubmitDate, Action) group survives.
pub fn merge_timeline(
    checkin_events: &[AttendanceEvent],
    checkout_events: &[AttendanceEvent],
    date_start: NaiveDate,
    date_end: NaiveDate,
    students: Option<&HashSet<String>>,
    drop_duplicates: bool,
) -> Result<Vec<TimelineRow>, AttendanceError> {
    if date_end < date_start {
        return Err(AttendanceError::InvalidRange {
            start: date_start,
            end: date_end,
        });
    }

    let tagged = checkin_events
        .iter()
        .map(|e| (Action::Checkin, e))
        .chain(checkout_events.iter().map(|e| (Action::Checkout, e)));

    let mut rows: Vec<AttendanceEvent> = tagged
        .filter(|(_, e)| e.submit_date >= date_start && e.submit_date <= date_end)
        .filter(|(_, e)| students.is_none_or(|s| s.contains(&e.full_name)))
        .map(|(action, e)| AttendanceEvent {
            action,
            ..e.clone()
        })
        .collect();

    rows.sort_by(|a, b| {
        (&a.last_name, &a.first_name, a.submit_date, a.submit_time).cmp(&(
            &b.last_name,
            &b.first_name,
            b.submit_date,
            b.submit_time,
        ))
    });

    if drop_duplicates {
        rows = keep_last_per_day_and_action(rows);
    }

    Ok(rows.into_iter().map(TimelineRow::from).collect())
}

fn keep_last_per_day_and_action(rows: Vec<AttendanceEvent>) -> Vec<AttendanceEvent> {
    let mut last: HashMap<(&str, &str, NaiveDate, Action), usize> = HashMap::new();
    for (idx, e) in rows.iter().enumerate() {
        last.insert(
            (e.last_name.as_str(), e.first_name.as_str(), e.submit_date, e.action),
            idx,
        );
    }
    let keep: HashSet<usize> = last.into_values().collect();

    rows.into_iter()
        .enumerate()
        .filter(|(idx, _)| keep.contains(idx))
        .map(|(_, e)| e)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 9, d).unwrap()
    }

    fn ev(name: &str, d: u32, time: &str) -> AttendanceEvent {
        let (first, last) = name.split_once(' ').unwrap();
        AttendanceEvent {
            full_name: name.into(),
            first_name: first.into(),
            last_name: last.into(),
            submit_date: day(d),
            submit_time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
            override_time: None,
            grade: "3".into(),
            action: Action::Checkin,
        }
    }

    fn times(rows: &[AttendanceEvent]) -> Vec<String> {
        rows.iter()
            .map(|e| format!("{} {}", e.full_name, e.submit_time))
            .collect()
    }

    #[test]
    fn first_checkin_of_the_period_wins() {
        let events = vec![ev("Jane Doe", 5, "08:45:00"), ev("Jane Doe", 5, "08:10:00")];
        let kept = deduplicate_period(&events, day(5), TimePeriod::Morning);
        assert_eq!(times(&kept), vec!["Jane Doe 08:10:00"]);
    }

    #[test]
    fn override_time_does_not_pick_the_winner() {
        let mut late_with_override = ev("Jane Doe", 5, "08:45:00");
        late_with_override.override_time = NaiveTime::from_hms_opt(8, 0, 0);
        let events = vec![late_with_override, ev("Jane Doe", 5, "08:10:00")];

        let kept = deduplicate_period(&events, day(5), TimePeriod::Morning);
        assert_eq!(times(&kept), vec!["Jane Doe 08:10:00"]);
        assert_eq!(kept[0].override_time, None);
    }

    #[test]
    fn override_time_does_not_move_the_period() {
        let mut afternoon_row = ev("Jane Doe", 5, "15:00:00");
        afternoon_row.override_time = NaiveTime::from_hms_opt(8, 30, 0);
        let events = vec![afternoon_row];

        assert!(deduplicate_period(&events, day(5), TimePeriod::Morning).is_empty());
        assert_eq!(deduplicate_period(&events, day(5), TimePeriod::Afternoon).len(), 1);
    }

    #[test]
    fn dedup_is_idempotent() {
        let events = vec![
            ev("Jane Doe", 5, "08:45:00"),
            ev("Bo Diaz", 5, "07:30:00"),
            ev("Jane Doe", 5, "08:10:00"),
            ev("Bo Diaz", 5, "08:59:59"),
            ev("Ann Lee", 5, "09:00:00"),
            ev("Ann Lee", 4, "08:00:00"),
        ];
        let once = deduplicate_period(&events, day(5), TimePeriod::Morning);
        let twice = deduplicate_period(&once, day(5), TimePeriod::Morning);
        assert_eq!(once, twice);
        assert_eq!(times(&once), vec!["Bo Diaz 07:30:00", "Jane Doe 08:10:00"]);
    }

    #[test]
    fn periods_are_independent_buckets() {
        let events = vec![ev("Jane Doe", 5, "08:59:59"), ev("Jane Doe", 5, "09:00:00")];
        assert_eq!(deduplicate_period(&events, day(5), TimePeriod::Morning).len(), 1);
        let afternoon = deduplicate_period(&events, day(5), TimePeriod::Afternoon);
        assert_eq!(times(&afternoon), vec!["Jane Doe 09:00:00"]);
    }

    #[test]
    fn empty_input_is_empty_output() {
        assert!(deduplicate_period(&[], day(5), TimePeriod::Morning).is_empty());
        assert!(current_presence(&[], &[]).is_empty());
    }

    #[test]
    fn presence_is_checkins_minus_checkouts() {
        let ins = vec![ev("Alice Smith", 5, "15:00:00"), ev("Bob Jones", 5, "15:05:00")];
        let outs = vec![ev("Alice Smith", 5, "17:00:00")];
        let present = current_presence(&ins, &outs);
        assert_eq!(present, HashSet::from(["Bob Jones".to_string()]));
    }

    #[test]
    fn timeline_keeps_last_row_when_dropping_duplicates() {
        let ins = vec![ev("Jane Doe", 5, "08:10:00"), ev("Jane Doe", 5, "08:45:00")];

        let all = merge_timeline(&ins, &[], day(5), day(5), None, false).unwrap();
        assert_eq!(all.len(), 2);

        let deduped = merge_timeline(&ins, &[], day(5), day(5), None, true).unwrap();
        assert_eq!(deduped.len(), 1);
        assert_eq!(deduped[0].submit_time, NaiveTime::from_hms_opt(8, 45, 0).unwrap());
    }

    #[test]
    fn timeline_dedup_is_per_action() {
        let ins = vec![ev("Jane Doe", 5, "08:10:00")];
        let outs = vec![ev("Jane Doe", 5, "17:00:00"), ev("Jane Doe", 5, "17:30:00")];
        let rows = merge_timeline(&ins, &outs, day(5), day(5), None, true).unwrap();
        let actions: Vec<_> = rows.iter().map(|r| (r.action, r.submit_time.to_string())).collect();
        assert_eq!(
            actions,
            vec![
                (Action::Checkin, "08:10:00".to_string()),
                (Action::Checkout, "17:30:00".to_string()),
            ]
        );
    }

    #[test]
    fn timeline_sorts_by_name_then_date_then_time() {
        let ins = vec![
            ev("Zoe Adams", 6, "08:00:00"),
            ev("Amy Baker", 5, "15:00:00"),
            ev("Zoe Adams", 5, "16:00:00"),
            ev("Ann Baker", 5, "07:00:00"),
        ];
        let outs = vec![ev("Zoe Adams", 5, "15:30:00")];
        let rows = merge_timeline(&ins, &outs, day(5), day(6), None, false).unwrap();
        let order: Vec<_> = rows
            .iter()
            .map(|r| format!("{} {} {}", r.first_name, r.submit_date, r.submit_time))
            .collect();
        assert_eq!(
            order,
            vec![
                "Zoe 2024-09-05 15:30:00",
                "Zoe 2024-09-05 16:00:00",
                "Zoe 2024-09-06 08:00:00",
                "Amy 2024-09-05 15:00:00",
                "Ann 2024-09-05 07:00:00",
            ]
        );
        assert_eq!(rows[0].action, Action::Checkout);
    }

    #[test]
    fn timeline_range_is_inclusive_and_filters_students() {
        let ins = vec![
            ev("Jane Doe", 1, "08:00:00"),
            ev("Jane Doe", 3, "08:00:00"),
            ev("Jane Doe", 6, "08:00:00"),
            ev("Bo Diaz", 3, "08:00:00"),
        ];
        let only_jane = HashSet::from(["Jane Doe".to_string()]);
        let rows = merge_timeline(&ins, &[], day(1), day(3), Some(&only_jane), false).unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|r| r.last_name == "Doe"));
    }

    #[test]
    fn reversed_range_is_rejected() {
        let err = merge_timeline(&[], &[], day(5), day(1), None, false).unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidRange { .. }));
    }
}
