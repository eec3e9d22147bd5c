/// Tools for the calendar view and backfilling missing days
///
/// This module implements the condition_calendar and condition_backfill MCP
/// tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::{dates, DomainError};
use crate::report::{self, CalendarReport};
use crate::repository::DailyLogRepository;
use crate::storage::{JournalStore, StorageError};

/// Parameters for the calendar view
///
/// Give either `month`, or `start` and `end` at most a year apart. With
/// neither, the current month is shown.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct CalendarParams {
    /// Month to show (YYYY-MM)
    pub month: Option<String>,
    /// First day of a custom span (YYYY-MM-DD)
    pub start: Option<String>,
    /// Last day of a custom span (YYYY-MM-DD)
    pub end: Option<String>,
}

/// Response from the calendar tool
#[derive(Debug, Serialize)]
pub struct CalendarResponse {
    pub success: bool,
    pub message: String,
    pub report: CalendarReport,
}

/// Parameters for backfilling default logs
///
/// The span may cover at most one year.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct BackfillParams {
    /// First day to fill (YYYY-MM-DD); with `end` omitted too, the past year
    pub start: Option<String>,
    /// Last day to fill (YYYY-MM-DD, defaults to today)
    pub end: Option<String>,
}

/// Response from the backfill tool
#[derive(Debug, Serialize)]
pub struct BackfillResponse {
    pub success: bool,
    pub message: String,
    pub inserted: usize,
}

/// Build the calendar for a month or an explicit span
pub fn condition_calendar<S: JournalStore + ?Sized>(
    store: &S,
    params: CalendarParams,
) -> Result<CalendarResponse, StorageError> {
    let report = match (params.month, params.start, params.end) {
        (Some(month), None, None) => report::calendar_for_month(store, &month)?,
        (None, Some(start), Some(end)) => {
            let start = dates::parse_iso_date(&start)?;
            let end = dates::parse_iso_date(&end)?;
            report::calendar_for_range(store, start, end)?
        }
        (None, None, None) => {
            let month = dates::today().format("%Y-%m").to_string();
            report::calendar_for_month(store, &month)?
        }
        _ => {
            return Err(StorageError::Validation(DomainError::Validation {
                message: "Give either month, or both start and end".to_string(),
            }))
        }
    };

    Ok(CalendarResponse {
        success: true,
        message: report.to_text(),
        report,
    })
}

/// Insert default logs for days that have none
pub fn condition_backfill<S: JournalStore + ?Sized>(
    store: &S,
    params: BackfillParams,
) -> Result<BackfillResponse, StorageError> {
    let repo = DailyLogRepository::new(store);

    let (inserted, span) = match (params.start, params.end) {
        (None, None) => {
            let (start, end) = dates::past_year(dates::today());
            (repo.ensure_defaults_for_range(start, end)?, (start, end))
        }
        (start, end) => {
            let end = match end {
                Some(end) => dates::parse_iso_date(&end)?,
                None => dates::today(),
            };
            let start = match start {
                Some(start) => dates::parse_iso_date(&start)?,
                None => dates::past_year(end).0,
            };
            (repo.ensure_defaults_for_range(start, end)?, (start, end))
        }
    };

    Ok(BackfillResponse {
        success: true,
        message: format!(
            "Filled {} day(s) without a log between {} and {}",
            inserted, span.0, span.1
        ),
        inserted,
    })
}
