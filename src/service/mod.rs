pub mod corrections;
pub mod event_log;
pub mod reconcile;
pub mod roster;

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Days, NaiveDate, NaiveTime, Timelike};
use chrono_tz::Tz;

use crate::config::Config;
use crate::error::AttendanceError;
use crate::model::attendance::{Action, AttendanceEvent};
use crate::model::sheet::SheetTarget;
use crate::model::student::{Student, grades, last_name_initials};
use crate::model::time_period::TimePeriod;
use crate::models::{
    Board, BoardEntry, CorrectionsResponse, CurrentView, RangeQuery, RosterResponse, SubmitResult,
    TimelineResponse, TodaySummary,
};
use crate::store::{SheetBackend, SheetStore};
use crate::utils::clock::Clock;
use crate::utils::query_cache::{QueryCache, QueryKey};

use corrections::normalize_corrections;
use event_log::{EventLogs, append_events, read_events};
use reconcile::{current_presence, deduplicate_period, merge_timeline};
use roster::RosterStore;

type Bucket = Vec<AttendanceEvent>;

/// Everything the handlers need, shared through `web::Data`.
pub struct Tracker {
    store: SheetBackend,
    logs: EventLogs,
    corrections_form: SheetTarget,
    roster: RosterStore,
    clock: Arc<dyn Clock>,
    /// Backs the check-in/check-out boards. Long lived, dropped on local appends.
    board_cache: QueryCache<Bucket>,
    /// Backs the today/current views, which must see other sessions' submits.
    presence_cache: QueryCache<Bucket>,
}

impl Tracker {
    pub fn new(store: SheetBackend, config: &Config, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            logs: EventLogs {
                checkins: config.checkin_log.clone(),
                checkouts: config.checkout_log.clone(),
            },
            corrections_form: config.corrections_form.clone(),
            roster: RosterStore::new(config.roster_sheet.clone(), config.roster_cache_ttl),
            clock,
            board_cache: QueryCache::new(config.board_cache_ttl),
            presence_cache: QueryCache::new(config.presence_cache_ttl),
        }
    }

    #[cfg(test)]
    pub fn store(&self) -> &SheetBackend {
        &self.store
    }

    pub async fn provision(&self) -> Result<(), AttendanceError> {
        self.logs.provision(&self.store).await
    }

    pub async fn warmup_roster(&self) -> anyhow::Result<()> {
        self.roster.warmup(&self.store).await
    }

    /// Current instant with its local date and period. Both caches are told
    /// about it so a period rollover empties them before any lookup.
    fn moment(&self) -> (DateTime<Tz>, NaiveDate, TimePeriod) {
        let now = self.clock.now();
        let date = now.date_naive();
        let period = TimePeriod::at(&now);
        self.board_cache.observe(date, period);
        self.presence_cache.observe(date, period);
        (now, date, period)
    }

    async fn bucket(
        &self,
        cache: &QueryCache<Bucket>,
        log: Action,
        date: NaiveDate,
        period: TimePeriod,
        now: &DateTime<Tz>,
    ) -> Result<Bucket, AttendanceError> {
        let key = QueryKey { log, date, period };
        if let Some(hit) = cache.get(&key, now).await {
            return Ok(hit);
        }

        let generation = cache.generation();
        let events = read_events(&self.store, &self.logs, log, Some(date), Some(period)).await?;
        let effective = deduplicate_period(&events, date, period);
        cache.insert(key, effective.clone(), *now, generation).await;
        Ok(effective)
    }

    async fn invalidate_bucket(&self, log: Action, date: NaiveDate, period: TimePeriod) {
        let key = QueryKey { log, date, period };
        self.board_cache.invalidate(&key).await;
        self.presence_cache.invalidate(&key).await;
    }

    pub async fn today(
        &self,
        date: Option<NaiveDate>,
        period: Option<TimePeriod>,
    ) -> Result<TodaySummary, AttendanceError> {
        let (now, today, current) = self.moment();
        let date = date.unwrap_or(today);
        let period = period.unwrap_or(current);

        let (checked_in, checked_out) = futures::try_join!(
            self.bucket(&self.presence_cache, Action::Checkin, date, period, &now),
            self.bucket(&self.presence_cache, Action::Checkout, date, period, &now),
        )?;
        let present = sorted(current_presence(&checked_in, &checked_out));

        Ok(TodaySummary {
            date,
            period,
            checked_in_count: checked_in.len(),
            checked_out_count: checked_out.len(),
            present_count: present.len(),
            checked_in,
            checked_out,
            present,
        })
    }

    /// Today's morning and afternoon check-ins plus who is in the building
    /// for the active period.
    pub async fn current(&self) -> Result<CurrentView, AttendanceError> {
        let (now, date, period) = self.moment();

        let (morning, afternoon, checked_out) = futures::try_join!(
            self.bucket(&self.presence_cache, Action::Checkin, date, TimePeriod::Morning, &now),
            self.bucket(&self.presence_cache, Action::Checkin, date, TimePeriod::Afternoon, &now),
            self.bucket(&self.presence_cache, Action::Checkout, date, period, &now),
        )?;
        let active = match period {
            TimePeriod::Morning => &morning,
            TimePeriod::Afternoon => &afternoon,
        };
        let present = sorted(current_presence(active, &checked_out));

        Ok(CurrentView {
            date,
            period,
            present,
            morning,
            afternoon,
        })
    }

    /// Appends one row per named student to `log`, stamped with the current
    /// local time. Every name must be on the roster or nothing is written.
    /// Students already recorded for this period are skipped.
    pub async fn submit(
        &self,
        log: Action,
        names: &[String],
        override_time: Option<NaiveTime>,
    ) -> Result<SubmitResult, AttendanceError> {
        let (now, date, period) = self.moment();
        let roster = self.roster.load_roster(&self.store).await?;

        let mut requested: Vec<&Student> = Vec::new();
        let mut skipped: Vec<String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for name in names.iter().map(|n| n.trim()).filter(|n| !n.is_empty()) {
            let student = roster
                .iter()
                .find(|s| s.full_name == name)
                .ok_or_else(|| AttendanceError::UnknownStudent(name.to_string()))?;
            if seen.insert(name) {
                requested.push(student);
            } else {
                skipped.push(name.to_string());
            }
        }

        // read past the caches: another session may have just submitted
        let existing = read_events(&self.store, &self.logs, log, Some(date), Some(period)).await?;
        let recorded: HashSet<String> = deduplicate_period(&existing, date, period)
            .into_iter()
            .map(|e| e.full_name)
            .collect();

        let submit_time = now.time().with_nanosecond(0).unwrap_or(now.time());
        let mut written = Vec::with_capacity(requested.len());
        for student in requested {
            if recorded.contains(&student.full_name) {
                skipped.push(student.full_name.clone());
                continue;
            }
            written.push(AttendanceEvent {
                full_name: student.full_name.clone(),
                first_name: student.first_name.clone(),
                last_name: student.last_name.clone(),
                submit_date: date,
                submit_time,
                override_time,
                grade: student.grade.clone(),
                action: log,
            });
        }

        append_events(&self.store, log, self.logs.target(log), &written).await?;
        if !written.is_empty() {
            self.invalidate_bucket(log, date, period).await;
        }

        tracing::info!(
            %log,
            %date,
            %period,
            written = written.len(),
            skipped = skipped.len(),
            "Submission processed"
        );

        Ok(SubmitResult {
            log,
            date,
            period,
            written,
            skipped,
        })
    }

    /// Every roster student for the current period of `log`, marked with
    /// whether they are already recorded.
    pub async fn board(&self, log: Action) -> Result<Board, AttendanceError> {
        let (now, date, period) = self.moment();
        let (roster, recorded) = futures::try_join!(
            self.roster.load_roster(&self.store),
            self.bucket(&self.board_cache, log, date, period, &now),
        )?;

        let by_name: HashMap<&str, &AttendanceEvent> =
            recorded.iter().map(|e| (e.full_name.as_str(), e)).collect();

        let mut students: Vec<BoardEntry> = roster
            .iter()
            .map(|s| {
                let hit = by_name.get(s.full_name.as_str());
                BoardEntry {
                    full_name: s.full_name.clone(),
                    first_name: s.first_name.clone(),
                    last_name: s.last_name.clone(),
                    grade: s.grade.clone(),
                    label: s.display_name(),
                    recorded: hit.is_some(),
                    time: hit.map(|e| e.display_time()),
                }
            })
            .collect();
        students.sort_by(|a, b| (&a.last_name, &a.first_name).cmp(&(&b.last_name, &b.first_name)));

        Ok(Board {
            log,
            date,
            period,
            grades: grades(&roster),
            last_name_initials: last_name_initials(&roster)
                .into_iter()
                .map(String::from)
                .collect(),
            students,
        })
    }

    pub async fn timeline(&self, query: &RangeQuery) -> Result<TimelineResponse, AttendanceError> {
        let (date_start, date_end) = self.resolve_range(query)?;

        let (checkins, checkouts) = futures::try_join!(
            read_events(&self.store, &self.logs, Action::Checkin, None, None),
            read_events(&self.store, &self.logs, Action::Checkout, None, None),
        )?;
        let data = merge_timeline(
            &checkins,
            &checkouts,
            date_start,
            date_end,
            query.student_filter().as_ref(),
            query.drop_duplicates.unwrap_or(false),
        )?;

        Ok(TimelineResponse {
            date_start,
            date_end,
            total: data.len(),
            data,
        })
    }

    pub async fn corrections(
        &self,
        query: &RangeQuery,
    ) -> Result<CorrectionsResponse, AttendanceError> {
        let (date_start, date_end) = self.resolve_range(query)?;

        let form = self.store.read(&self.corrections_form).await?;
        let data = normalize_corrections(&form, date_start, date_end, query.student_filter().as_ref())?;

        Ok(CorrectionsResponse {
            date_start,
            date_end,
            total: data.len(),
            data,
        })
    }

    pub async fn roster(&self) -> Result<RosterResponse, AttendanceError> {
        let roster = self.roster.load_roster(&self.store).await?;
        Ok(RosterResponse {
            data: roster.as_ref().clone(),
            total: roster.len(),
        })
    }

    /// Start defaults to today, end to the day after start. Checked before
    /// any store access.
    fn resolve_range(&self, query: &RangeQuery) -> Result<(NaiveDate, NaiveDate), AttendanceError> {
        let start = query
            .date_start
            .unwrap_or_else(|| self.clock.now().date_naive());
        let end = match query.date_end {
            Some(end) => end,
            None => start
                .checked_add_days(Days::new(1))
                .ok_or_else(|| AttendanceError::Parse(format!("no day after {}", start)))?,
        };
        if end < start {
            return Err(AttendanceError::InvalidRange { start, end });
        }
        Ok((start, end))
    }
}

fn sorted(names: HashSet<String>) -> Vec<String> {
    let mut names: Vec<String> = names.into_iter().collect();
    names.sort();
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::sheet::Sheet;
    use crate::store::MemorySheetStore;
    use crate::utils::clock::FixedClock;
    use std::sync::atomic::Ordering;

    fn roster_sheet() -> Sheet {
        let rows = [
            ("Jane Doe", "Jane", "Doe", "3"),
            ("Bo Diaz", "Bo", "Diaz", "4"),
            ("Ann Lee", "Ann", "Lee", "K"),
        ];
        Sheet {
            header: vec!["FullName".into(), "FirstName".into(), "LastName".into(), "Grade".into()],
            rows: rows
                .iter()
                .map(|(full, first, last, grade)| {
                    vec![full.to_string(), first.to_string(), last.to_string(), grade.to_string()]
                })
                .collect(),
        }
    }

    async fn tracker_at(h: u32, m: u32) -> (Tracker, Arc<FixedClock>) {
        let config = Config::default();
        let store = MemorySheetStore::default().with_sheet(config.roster_sheet.clone(), roster_sheet());
        let clock = Arc::new(FixedClock::at(2024, 9, 5, h, m, 0));
        let tracker = Tracker::new(SheetBackend::Memory(store), &config, clock.clone());
        tracker.provision().await.unwrap();
        (tracker, clock)
    }

    fn memory(tracker: &Tracker) -> &MemorySheetStore {
        match tracker.store() {
            SheetBackend::Memory(m) => m,
            SheetBackend::MySql(_) => unreachable!("tests run on the memory store"),
        }
    }

    #[actix_web::test]
    async fn checkin_then_checkout_updates_presence() {
        let (tracker, clock) = tracker_at(15, 0).await;
        let ins = tracker
            .submit(Action::Checkin, &["Jane Doe".into(), "Bo Diaz".into()], None)
            .await
            .unwrap();
        assert_eq!(ins.written.len(), 2);
        assert_eq!(ins.period, TimePeriod::Afternoon);

        clock.set(2024, 9, 5, 17, 0, 0);
        tracker.submit(Action::Checkout, &["Jane Doe".into()], None).await.unwrap();

        let today = tracker.today(None, None).await.unwrap();
        assert_eq!(today.present, vec!["Bo Diaz".to_string()]);
        assert_eq!(today.checked_in_count, 2);
        assert_eq!(today.checked_out_count, 1);
    }

    #[actix_web::test]
    async fn resubmitting_skips_students_already_recorded() {
        let (tracker, _clock) = tracker_at(8, 0).await;
        tracker.submit(Action::Checkin, &["Jane Doe".into()], None).await.unwrap();

        let again = tracker
            .submit(
                Action::Checkin,
                &["Jane Doe".into(), "Ann Lee".into(), "Ann Lee".into()],
                None,
            )
            .await
            .unwrap();
        let written: Vec<_> = again.written.iter().map(|e| e.full_name.as_str()).collect();
        assert_eq!(written, vec!["Ann Lee"]);
        assert_eq!(again.skipped, vec!["Ann Lee".to_string(), "Jane Doe".to_string()]);
    }

    #[actix_web::test]
    async fn unknown_student_rejects_the_whole_submission() {
        let (tracker, _clock) = tracker_at(8, 0).await;
        let err = tracker
            .submit(Action::Checkin, &["Jane Doe".into(), "Nobody Here".into()], None)
            .await
            .unwrap_err();
        assert!(matches!(err, AttendanceError::UnknownStudent(ref n) if n == "Nobody Here"));
        assert_eq!(memory(&tracker).append_calls.load(Ordering::Relaxed), 0);
    }

    #[actix_web::test]
    async fn board_marks_recorded_students_with_display_time() {
        let (tracker, _clock) = tracker_at(8, 30).await;
        let before = tracker.board(Action::Checkin).await.unwrap();
        assert!(before.students.iter().all(|s| !s.recorded));

        let override_time = NaiveTime::from_hms_opt(8, 5, 0);
        tracker
            .submit(Action::Checkin, &["Ann Lee".into()], override_time)
            .await
            .unwrap();

        let board = tracker.board(Action::Checkin).await.unwrap();
        let order: Vec<_> = board.students.iter().map(|s| s.last_name.as_str()).collect();
        assert_eq!(order, vec!["Diaz", "Doe", "Lee"]);
        let ann = &board.students[2];
        assert!(ann.recorded);
        assert_eq!(ann.label, "Ann Lee (K)");
        assert_eq!(ann.time, override_time);
        assert_eq!(board.grades, vec!["3", "4", "K"]);
        assert_eq!(board.last_name_initials, vec!["D", "L"]);
    }

    #[actix_web::test]
    async fn presence_reads_are_cached_within_ttl() {
        let (tracker, clock) = tracker_at(8, 0).await;
        tracker.today(None, None).await.unwrap();
        let reads = memory(&tracker).read_calls.load(Ordering::Relaxed);

        tracker.today(None, None).await.unwrap();
        assert_eq!(memory(&tracker).read_calls.load(Ordering::Relaxed), reads);

        clock.set(2024, 9, 5, 8, 0, 30);
        tracker.today(None, None).await.unwrap();
        assert_eq!(memory(&tracker).read_calls.load(Ordering::Relaxed), reads + 2);
    }

    #[actix_web::test]
    async fn morning_checkins_do_not_count_in_the_afternoon() {
        let (tracker, clock) = tracker_at(8, 0).await;
        tracker.submit(Action::Checkin, &["Jane Doe".into()], None).await.unwrap();

        clock.set(2024, 9, 5, 9, 0, 0);
        let current = tracker.current().await.unwrap();
        assert_eq!(current.period, TimePeriod::Afternoon);
        assert_eq!(current.morning.len(), 1);
        assert!(current.afternoon.is_empty());
        assert!(current.present.is_empty());

        // the afternoon bucket is a fresh one, so the same student can check in again
        let again = tracker.submit(Action::Checkin, &["Jane Doe".into()], None).await.unwrap();
        assert_eq!(again.written.len(), 1);
    }

    #[actix_web::test]
    async fn range_defaults_to_today_and_tomorrow() {
        let (tracker, _clock) = tracker_at(8, 0).await;
        tracker.submit(Action::Checkin, &["Jane Doe".into()], None).await.unwrap();

        let timeline = tracker.timeline(&RangeQuery::default()).await.unwrap();
        assert_eq!(timeline.date_start, NaiveDate::from_ymd_opt(2024, 9, 5).unwrap());
        assert_eq!(timeline.date_end, NaiveDate::from_ymd_opt(2024, 9, 6).unwrap());
        assert_eq!(timeline.total, 1);
        assert_eq!(timeline.data[0].last_name, "Doe");
    }

    #[actix_web::test]
    async fn reversed_range_fails_before_reading() {
        let (tracker, _clock) = tracker_at(8, 0).await;
        let reads = memory(&tracker).read_calls.load(Ordering::Relaxed);
        let query = RangeQuery {
            date_start: NaiveDate::from_ymd_opt(2024, 9, 5),
            date_end: NaiveDate::from_ymd_opt(2024, 9, 1),
            ..Default::default()
        };

        let err = tracker.corrections(&query).await.unwrap_err();
        assert!(matches!(err, AttendanceError::InvalidRange { .. }));
        assert_eq!(memory(&tracker).read_calls.load(Ordering::Relaxed), reads);
    }

    #[actix_web::test]
    async fn store_outage_surfaces_as_transport_error() {
        let (tracker, _clock) = tracker_at(8, 0).await;
        memory(&tracker).offline.store(true, Ordering::Relaxed);
        let err = tracker.today(None, None).await.unwrap_err();
        assert!(matches!(err, AttendanceError::Transport(_)));
    }
}
