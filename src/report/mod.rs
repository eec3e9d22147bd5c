/// Calendar report built from stored daily logs
///
/// This module turns a span of dates into calendar days, each carrying the
/// classified status for its dot, and tallies how many days landed in each
/// tier.

use serde::Serialize;
use chrono::NaiveDate;

use crate::domain::dates::{self, DateRange};
use crate::domain::{classify_day, DailyConditionLog, DayStatus};
use crate::repository::DailyLogRepository;
use crate::storage::{JournalStore, StorageError};

/// One day of the calendar
#[derive(Debug, Clone, Serialize)]
pub struct CalendarDay {
    pub date: NaiveDate,
    pub status: DayStatus,
    /// False when nothing was stored for this day; `status` is then the
    /// no-data classification rather than a reading
    pub has_log: bool,
    pub has_memo: bool,
    pub log: Option<DailyConditionLog>,
}

/// Number of days in each status tier
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatusSummary {
    pub good: usize,
    pub caution: usize,
    pub poor: usize,
    /// Days with no stored log (also counted in `poor`)
    pub missing: usize,
}

impl StatusSummary {
    fn record(&mut self, day: &CalendarDay) {
        match day.status {
            DayStatus::Good => self.good += 1,
            DayStatus::Caution => self.caution += 1,
            DayStatus::Poor => self.poor += 1,
        }
        if !day.has_log {
            self.missing += 1;
        }
    }

    pub fn total(&self) -> usize {
        self.good + self.caution + self.poor
    }
}

/// Every day of a span with its status
#[derive(Debug, Clone, Serialize)]
pub struct CalendarReport {
    pub start: NaiveDate,
    pub end: NaiveDate,
    pub days: Vec<CalendarDay>,
    pub summary: StatusSummary,
}

impl CalendarReport {
    /// Build a report from logs already fetched for `[start, end]`
    pub fn from_logs(
        start: NaiveDate,
        end: NaiveDate,
        logs: impl IntoIterator<Item = DailyConditionLog>,
    ) -> Self {
        let mut by_date: std::collections::BTreeMap<NaiveDate, DailyConditionLog> = logs
            .into_iter()
            .map(|log| (log.recorded_date, log))
            .collect();

        let mut summary = StatusSummary::default();
        let days: Vec<CalendarDay> = DateRange::inclusive(start, end)
            .map(|date| {
                let log = by_date.remove(&date);
                let day = CalendarDay {
                    date,
                    status: classify_day(log.as_ref()),
                    has_log: log.is_some(),
                    has_memo: log.as_ref().is_some_and(DailyConditionLog::has_memo),
                    log,
                };
                summary.record(&day);
                day
            })
            .collect();

        Self {
            start,
            end,
            days,
            summary,
        }
    }

    /// Look up one day of the report
    pub fn day(&self, date: NaiveDate) -> Option<&CalendarDay> {
        self.days.iter().find(|day| day.date == date)
    }

    /// Plain-text rendering, one line per day
    pub fn to_text(&self) -> String {
        let mut text = format!(
            "Calendar {} to {}: {} good, {} caution, {} poor ({} without a log)\n",
            self.start,
            self.end,
            self.summary.good,
            self.summary.caution,
            self.summary.poor,
            self.summary.missing
        );

        for day in &self.days {
            let marker = if day.has_log { "" } else { " (no log)" };
            let memo = if day.has_memo { " *" } else { "" };
            text.push_str(&format!(
                "{} {:<9} {}{}{}\n",
                day.date,
                dates::weekday_label(day.date),
                day.status.as_str(),
                marker,
                memo
            ));
        }

        text
    }
}

/// Build the calendar for `[start, end]` from storage
pub fn calendar_for_range<S: JournalStore + ?Sized>(
    store: &S,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<CalendarReport, StorageError> {
    let logs = DailyLogRepository::new(store).get_range(start, end)?;
    Ok(CalendarReport::from_logs(start, end, logs.into_values()))
}

/// Build the calendar for a `YYYY-MM` month
pub fn calendar_for_month<S: JournalStore + ?Sized>(
    store: &S,
    month: &str,
) -> Result<CalendarReport, StorageError> {
    let (start, end) = dates::month_bounds(month)?;
    calendar_for_range(store, start, end)
}
