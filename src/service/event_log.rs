use chrono::NaiveDate;

use crate::error::AttendanceError;
use crate::model::attendance::{Action, AttendanceEvent, LOG_COLUMNS};
use crate::model::sheet::{Sheet, SheetTarget};
use crate::model::time_period::TimePeriod;
use crate::store::SheetStore;

/// Where the two append-only logs live.
#[derive(Debug, Clone)]
pub struct EventLogs {
    pub checkins: SheetTarget,
    pub checkouts: SheetTarget,
}

impl EventLogs {
    pub fn target(&self, log: Action) -> &SheetTarget {
        match log {
            Action::Checkin => &self.checkins,
            Action::Checkout => &self.checkouts,
        }
    }

    /// Makes sure both log worksheets carry the column header appends rely on.
    pub async fn provision<S: SheetStore>(&self, store: &S) -> Result<(), AttendanceError> {
        store.ensure_header(&self.checkins, &LOG_COLUMNS).await?;
        store.ensure_header(&self.checkouts, &LOG_COLUMNS).await?;
        Ok(())
    }
}

/// Parses a log snapshot, tagging every row with `log`, then applies the
/// optional date and period filters. Source order is kept. Rows without a
/// FullName name no student and are skipped.
pub fn events_from_sheet(
    sheet: &Sheet,
    log: Action,
    date: Option<NaiveDate>,
    period: Option<TimePeriod>,
) -> Result<Vec<AttendanceEvent>, AttendanceError> {
    let mut events = Vec::with_capacity(sheet.rows.len());
    for record in sheet.records() {
        let event = AttendanceEvent::from_record(log, &record)?;
        if event.full_name.is_empty() {
            tracing::warn!(%log, date = %event.submit_date, time = %event.submit_time, "Skipping log row without FullName");
            continue;
        }
        if date.is_some_and(|d| d != event.submit_date) {
            continue;
        }
        if period.is_some_and(|p| !p.contains(event.submit_time)) {
            continue;
        }
        events.push(event);
    }
    Ok(events)
}

pub async fn read_events<S: SheetStore>(
    store: &S,
    logs: &EventLogs,
    log: Action,
    date: Option<NaiveDate>,
    period: Option<TimePeriod>,
) -> Result<Vec<AttendanceEvent>, AttendanceError> {
    let sheet = store.read(logs.target(log)).await?;
    let events = events_from_sheet(&sheet, log, date, period)?;

    tracing::debug!(
        %log,
        backend = store.backend_tag(),
        total = sheet.rows.len(),
        matched = events.len(),
        "Read attendance log"
    );

    Ok(events)
}

/// Appends `events` verbatim to the bottom of the worksheet. No uniqueness
/// check happens here; duplicates are resolved when the log is read back.
pub async fn append_events<S: SheetStore>(
    store: &S,
    log: Action,
    target: &SheetTarget,
    events: &[AttendanceEvent],
) -> Result<(), AttendanceError> {
    if events.is_empty() {
        return Ok(());
    }

    let rows: Vec<Vec<String>> = events.iter().map(AttendanceEvent::to_row).collect();
    store.append(target, &rows).await?;

    tracing::info!(
        %log,
        spreadsheet = %target.spreadsheet,
        worksheet = %target.worksheet,
        rows = rows.len(),
        "Appended attendance rows"
    );

    Ok(())
}
