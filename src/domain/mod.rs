/// Domain module containing core business logic and data types
///
/// This module defines the core entities (DailyConditionLog, Medication) and
/// their validation rules, plus the calendar status classification. These
/// types represent the fundamental concepts of the condition journal.

pub mod condition;
pub mod dates;
pub mod medication;
pub mod status;
pub mod types;

// Re-export public types for easy access
pub use condition::*;
pub use medication::*;
pub use status::*;
pub use types::*;

use chrono::NaiveDate;
use thiserror::Error;

/// Errors that can occur during domain operations
///
/// Every variant is a validation failure: the caller handed us data that
/// cannot be persisted as-is.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Invalid symptom level for {symptom}: {value} (expected 1-5)")]
    InvalidLevel { symptom: &'static str, value: i64 },

    #[error("Medication name cannot be empty")]
    BlankMedicationName,

    #[error("Invalid intake timing code: {0} (expected 1-12)")]
    InvalidIntakeTiming(i64),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Date range {start} to {end} is longer than one year")]
    RangeTooLong { start: NaiveDate, end: NaiveDate },
}
