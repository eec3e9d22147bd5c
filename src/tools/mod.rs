/// MCP tools for the condition journal
///
/// This module contains all the MCP tools that external clients (like Claude)
/// can call. Each tool takes a parameter struct deserialized from the call
/// arguments and returns a response with a human-readable message.

pub mod calendar;
pub mod condition;
pub mod medication;

// Re-export tool functions for easy access
pub use calendar::*;
pub use condition::*;
pub use medication::*;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::domain::dates;
use crate::storage::StorageError;

/// Parse an optional `YYYY-MM-DD` argument, defaulting to today
pub(crate) fn date_or_today(date: Option<&str>) -> Result<NaiveDate, StorageError> {
    match date {
        Some(date) => Ok(dates::parse_iso_date(date)?),
        None => Ok(dates::today()),
    }
}

/// Deserialize a field that may be omitted, `null`, or set
///
/// Pair with `#[serde(default)]`: omitted gives `None`, `null` gives
/// `Some(None)`.
pub(crate) fn nullable<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A tool outcome: a message for the user plus serializable detail
pub trait ToolResponse: Serialize {
    fn message(&self) -> &str;
}

impl ToolResponse for ConditionLogResponse {
    fn message(&self) -> &str {
        &self.message
    }
}

impl ToolResponse for CalendarResponse {
    fn message(&self) -> &str {
        &self.message
    }
}

impl ToolResponse for BackfillResponse {
    fn message(&self) -> &str {
        &self.message
    }
}

impl ToolResponse for ListMedicationsResponse {
    fn message(&self) -> &str {
        &self.message
    }
}

impl ToolResponse for MedicationResponse {
    fn message(&self) -> &str {
        &self.message
    }
}
