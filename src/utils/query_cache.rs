use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, NaiveDate};
use chrono_tz::Tz;
use moka::future::Cache;

use crate::model::attendance::Action;
use crate::model::time_period::TimePeriod;

/// One deduplicated log bucket.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryKey {
    pub log: Action,
    pub date: NaiveDate,
    pub period: TimePeriod,
}

#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    pub value: V,
    pub fetched_at: DateTime<Tz>,
    pub ttl: Duration,
}

/// True once `ttl` has elapsed since the entry was fetched. An entry that
/// claims to come from the future is treated as stale too.
pub fn is_stale<V>(entry: &CacheEntry<V>, now: &DateTime<Tz>) -> bool {
    match now.signed_duration_since(entry.fetched_at).to_std() {
        Ok(age) => age >= entry.ttl,
        Err(_) => true,
    }
}

/// Short-lived cache of log reads. Everything is dropped as soon as the
/// observed date or period changes, so a bucket never outlives its period.
///
/// Every invalidation bumps `generation`. A reader takes the generation
/// before it goes to the store and hands it back on `insert`, so a read that
/// raced an invalidation is never cached.
pub struct QueryCache<V> {
    entries: Cache<QueryKey, CacheEntry<V>>,
    ttl: Duration,
    observed: Mutex<Option<(NaiveDate, TimePeriod)>>,
    generation: AtomicU64,
}

impl<V: Clone + Send + Sync + 'static> QueryCache<V> {
    pub fn new(ttl: Duration) -> Self {
        Self {
            entries: Cache::builder()
                .max_capacity(64) // a handful of (log, date, period) buckets
                .time_to_live(ttl.max(Duration::from_secs(1)))
                .build(),
            ttl,
            observed: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Records the current date/period. Returns true when it differs from the
    /// last one seen, in which case every entry has been invalidated.
    pub fn observe(&self, date: NaiveDate, period: TimePeriod) -> bool {
        let mut observed = self.observed.lock().unwrap_or_else(|e| e.into_inner());
        let changed = match *observed {
            Some(prev) => prev != (date, period),
            None => false,
        };
        *observed = Some((date, period));
        drop(observed);

        if changed {
            tracing::debug!(%date, %period, "Cache: new date or period, invalidating");
            self.generation.fetch_add(1, Ordering::SeqCst);
            self.entries.invalidate_all();
        }
        changed
    }

    /// Fresh value for `key`, or `None` when missing or stale. A stale entry
    /// is evicted so the caller's reload replaces it.
    pub async fn get(&self, key: &QueryKey, now: &DateTime<Tz>) -> Option<V> {
        let entry = self.entries.get(key).await?;
        if is_stale(&entry, now) {
            tracing::debug!(log = %key.log, date = %key.date, period = %key.period, "Cache: stale entry");
            self.entries.invalidate(key).await;
            return None;
        }
        Some(entry.value)
    }

    /// Taken before reading the store, passed back to `insert`.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// Caches `value` unless an invalidation happened since `generation` was
    /// taken. Returns whether the entry was kept.
    pub async fn insert(&self, key: QueryKey, value: V, fetched_at: DateTime<Tz>, generation: u64) -> bool {
        if self.generation() != generation {
            return false;
        }
        self.entries
            .insert(
                key.clone(),
                CacheEntry {
                    value,
                    fetched_at,
                    ttl: self.ttl,
                },
            )
            .await;
        // An invalidation may have landed between the check and the insert.
        if self.generation() != generation {
            self.entries.invalidate(&key).await;
            return false;
        }
        true
    }

    pub async fn invalidate(&self, key: &QueryKey) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.entries.invalidate(key).await;
    }
}
