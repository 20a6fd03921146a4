use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;

use crate::error::AttendanceError;
use crate::model::sheet::{Sheet, SheetTarget};
use crate::model::student::Student;
use crate::store::SheetStore;

pub fn roster_from_sheet(sheet: &Sheet) -> Result<Vec<Student>, AttendanceError> {
    let mut students = Vec::with_capacity(sheet.rows.len());
    for record in sheet.records() {
        if let Some(student) = Student::from_record(&record)? {
            students.push(student);
        }
    }
    Ok(students)
}

/// Read-only roster, refetched at most once per TTL. An expired entry is
/// simply missing, so the next call reloads it before returning.
pub struct RosterStore {
    target: SheetTarget,
    cache: Cache<SheetTarget, Arc<Vec<Student>>>,
}

impl RosterStore {
    pub fn new(target: SheetTarget, cache_ttl: Duration) -> Self {
        Self {
            target,
            cache: Cache::builder()
                .max_capacity(1)
                .time_to_live(cache_ttl)
                .build(),
        }
    }

    pub async fn load_roster<S: SheetStore>(
        &self,
        store: &S,
    ) -> Result<Arc<Vec<Student>>, AttendanceError> {
        if let Some(roster) = self.cache.get(&self.target).await {
            return Ok(roster);
        }

        let sheet = store.read(&self.target).await?;
        let roster = Arc::new(roster_from_sheet(&sheet)?);
        self.cache.insert(self.target.clone(), roster.clone()).await;

        tracing::info!(
            worksheet = %self.target.worksheet,
            students = roster.len(),
            "Roster refreshed"
        );

        Ok(roster)
    }

    /// Loads the roster ahead of the first request.
    pub async fn warmup<S: SheetStore>(&self, store: &S) -> anyhow::Result<()> {
        let roster = self.load_roster(store).await?;
        log::info!("Roster warmup complete: {} students", roster.len());
        Ok(())
    }

    #[cfg(test)]
    pub fn invalidate(&self) {
        self.cache.invalidate_all();
    }
}
