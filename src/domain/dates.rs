/// Calendar date helpers
///
/// Daily logs are keyed by ISO `YYYY-MM-DD` strings and medication start/end
/// dates are stored as `YYYYMMDD` integers. Everything in here is pure date
/// arithmetic over `chrono::NaiveDate`.

use std::fmt;

use chrono::{Datelike, Local, Months, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Format used for `recorded_date` keys
pub const ISO_DATE_FORMAT: &str = "%Y-%m-%d";

/// Today's date in the device's local time zone
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Parse an ISO `YYYY-MM-DD` date
pub fn parse_iso_date(s: &str) -> Result<NaiveDate, DomainError> {
    NaiveDate::parse_from_str(s.trim(), ISO_DATE_FORMAT)
        .map_err(|_| DomainError::InvalidDate(format!("'{}' is not a YYYY-MM-DD date", s)))
}

/// Format a date as an ISO `YYYY-MM-DD` key
pub fn format_iso_date(date: NaiveDate) -> String {
    date.format(ISO_DATE_FORMAT).to_string()
}

/// Parse a `YYYY-MM` month and return its first and last day
pub fn month_bounds(s: &str) -> Result<(NaiveDate, NaiveDate), DomainError> {
    let invalid = || DomainError::InvalidDate(format!("'{}' is not a YYYY-MM month", s));

    let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
    let year: i32 = year.parse().map_err(|_| invalid())?;
    let month: u32 = month.parse().map_err(|_| invalid())?;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|next| next.pred_opt())
        .ok_or_else(invalid)?;

    Ok((first, last))
}

/// Most days an inclusive range's end may lie after its start
///
/// One year, with room for a leap day.
pub const MAX_RANGE_SPAN_DAYS: i64 = 366;

/// Reject ranges whose end lies more than a year after their start
pub fn check_range_span(start: NaiveDate, end: NaiveDate) -> Result<(), DomainError> {
    if (end - start).num_days() > MAX_RANGE_SPAN_DAYS {
        return Err(DomainError::RangeTooLong { start, end });
    }
    Ok(())
}

/// The span `[today - 1 year, today]`
///
/// A leap day rolls back to February 28th of the previous year.
pub fn past_year(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let start = today
        .checked_sub_months(Months::new(12))
        .unwrap_or(NaiveDate::MIN);
    (start, today)
}

/// Full English weekday name, used in date headers
pub fn weekday_label(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Inclusive sequence of consecutive dates
///
/// Yields nothing when `start > end`.
#[derive(Debug, Clone)]
pub struct DateRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl DateRange {
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            next: (start <= end).then_some(start),
            end,
        }
    }
}

impl Iterator for DateRange {
    type Item = NaiveDate;

    fn next(&mut self) -> Option<NaiveDate> {
        let current = self.next?;
        self.next = current.succ_opt().filter(|next| *next <= self.end);
        Some(current)
    }
}

/// A calendar date encoded as the integer `YYYYMMDD` (e.g. 20250115)
///
/// Storage accepts any value; `to_date` returns `None` for codes that do not
/// name a real day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DateCode(pub i64);

impl DateCode {
    pub fn from_date(date: NaiveDate) -> Self {
        Self(date.year() as i64 * 10_000 + date.month() as i64 * 100 + date.day() as i64)
    }

    /// Build a code from user input, rejecting codes that are not real dates
    pub fn parse_checked(code: i64) -> Result<Self, DomainError> {
        let date_code = Self(code);
        date_code
            .to_date()
            .map(|_| date_code)
            .ok_or_else(|| DomainError::InvalidDate(format!("{} is not a YYYYMMDD date", code)))
    }

    pub fn value(self) -> i64 {
        self.0
    }

    pub fn to_date(self) -> Option<NaiveDate> {
        if !(10_000_101..=99_991_231).contains(&self.0) {
            return None;
        }
        let year = (self.0 / 10_000) as i32;
        let month = ((self.0 / 100) % 100) as u32;
        let day = (self.0 % 100) as u32;
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

impl fmt::Display for DateCode {
    /// `YYYY/MM/DD`, or `-` when the code is not a real date
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_date() {
            Some(date) => write!(f, "{}", date.format("%Y/%m/%d")),
            None => f.write_str("-"),
        }
    }
}
