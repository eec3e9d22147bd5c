/// Daily condition log operations: get, upsert, range and backfill

use std::collections::BTreeMap;

use chrono::{NaiveDate, Utc};

use crate::domain::dates::{self, DateRange};
use crate::domain::DailyConditionLog;
use crate::storage::{JournalStore, StorageError};

/// Read and write daily logs through any store backend
pub struct DailyLogRepository<'a, S: JournalStore + ?Sized> {
    store: &'a S,
}

impl<'a, S: JournalStore + ?Sized> DailyLogRepository<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Get the log for `date`
    ///
    /// A read failure is logged and reported as "no log", the same as a miss.
    pub fn get(&self, date: NaiveDate) -> Option<DailyConditionLog> {
        match self.store.fetch_log(date) {
            Ok(log) => log,
            Err(e) => {
                tracing::warn!("Failed to read condition log for {}: {}", date, e);
                None
            }
        }
    }

    /// Get the log for `date`, reporting read failures
    ///
    /// Write paths use this so an unreadable row is never mistaken for an
    /// empty day.
    pub fn find(&self, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError> {
        self.store.fetch_log(date)
    }

    /// Save `log`, replacing any log already stored for its date
    ///
    /// Scores are clamped into 0-200; out-of-range symptom levels are
    /// rejected before anything is written.
    pub fn upsert(&self, log: DailyConditionLog) -> Result<DailyConditionLog, StorageError> {
        let log = log.normalized()?;
        let saved = self.store.upsert_log(&log, Utc::now())?;
        tracing::info!("Saved condition log for {}", saved.recorded_date);
        Ok(saved)
    }

    /// All stored logs in `[start, end]`, keyed by date
    ///
    /// Dates without a log are simply missing from the map. A reversed range
    /// is empty rather than an error; a range longer than a year is rejected.
    pub fn get_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<BTreeMap<NaiveDate, DailyConditionLog>, StorageError> {
        if start > end {
            return Ok(BTreeMap::new());
        }
        dates::check_range_span(start, end)?;

        let logs = self.store.fetch_logs_between(start, end)?;
        Ok(logs.into_iter().map(|log| (log.recorded_date, log)).collect())
    }

    /// Insert a default log for every date in `[start, end]` lacking one
    ///
    /// Existing logs are never modified. Returns the number of logs created.
    /// A range longer than a year is rejected before anything is written.
    pub fn ensure_defaults_for_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<usize, StorageError> {
        dates::check_range_span(start, end)?;
        let days: Vec<NaiveDate> = DateRange::inclusive(start, end).collect();
        if days.is_empty() {
            return Ok(0);
        }

        let inserted = self.store.insert_default_logs(&days, Utc::now())?;
        tracing::info!(
            "Backfilled {} of {} day(s) between {} and {}",
            inserted,
            days.len(),
            start,
            end
        );
        Ok(inserted)
    }

    /// Backfill the year ending today
    pub fn ensure_defaults_for_past_year(&self) -> Result<usize, StorageError> {
        self.ensure_defaults_for_past_year_from(dates::today())
    }

    /// Backfill `[today - 1 year, today]` for a given `today`
    pub fn ensure_defaults_for_past_year_from(&self, today: NaiveDate) -> Result<usize, StorageError> {
        let (start, end) = dates::past_year(today);
        self.ensure_defaults_for_range(start, end)
    }
}
