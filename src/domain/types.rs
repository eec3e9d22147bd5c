/// Core types and enums used throughout the domain layer
///
/// This module defines the fundamental types like IntakeTiming and the
/// medication ID type that are used by Medication and the storage layer.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::DomainError;

/// Unique identifier for a medication
///
/// This is a wrapper around the integer id assigned by the store on insert,
/// so a medication id can't be confused with any other integer column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MedicationId(pub i64);

impl MedicationId {
    pub fn value(self) -> i64 {
        self.0
    }
}

impl fmt::Display for MedicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When a medication dose is taken relative to meals and sleep
///
/// Persisted as its integer code (1-12). The codes are part of the on-disk
/// format and must never be renumbered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum IntakeTiming {
    Morning = 1,
    BeforeBreakfast = 2,
    AfterBreakfast = 3,
    Noon = 4,
    BeforeLunch = 5,
    AfterLunch = 6,
    Evening = 7,
    BeforeDinner = 8,
    AfterDinner = 9,
    Bedtime = 10,
    BetweenMeals = 11,
    AsNeeded = 12,
}

impl IntakeTiming {
    /// All timing slots in code order (the order a picker shows them)
    pub const ALL: [IntakeTiming; 12] = [
        IntakeTiming::Morning,
        IntakeTiming::BeforeBreakfast,
        IntakeTiming::AfterBreakfast,
        IntakeTiming::Noon,
        IntakeTiming::BeforeLunch,
        IntakeTiming::AfterLunch,
        IntakeTiming::Evening,
        IntakeTiming::BeforeDinner,
        IntakeTiming::AfterDinner,
        IntakeTiming::Bedtime,
        IntakeTiming::BetweenMeals,
        IntakeTiming::AsNeeded,
    ];

    /// Integer code used in storage
    pub fn code(self) -> i64 {
        self as i64
    }

    /// Look up a timing slot by its storage code
    pub fn from_code(code: i64) -> Result<Self, DomainError> {
        Self::ALL
            .iter()
            .copied()
            .find(|timing| timing.code() == code)
            .ok_or(DomainError::InvalidIntakeTiming(code))
    }

    /// Get the display label for this timing slot
    pub fn label(self) -> &'static str {
        match self {
            IntakeTiming::Morning => "Morning",
            IntakeTiming::BeforeBreakfast => "Before breakfast",
            IntakeTiming::AfterBreakfast => "After breakfast",
            IntakeTiming::Noon => "Noon",
            IntakeTiming::BeforeLunch => "Before lunch",
            IntakeTiming::AfterLunch => "After lunch",
            IntakeTiming::Evening => "Evening",
            IntakeTiming::BeforeDinner => "Before dinner",
            IntakeTiming::AfterDinner => "After dinner",
            IntakeTiming::Bedtime => "Bedtime",
            IntakeTiming::BetweenMeals => "Between meals",
            IntakeTiming::AsNeeded => "As needed",
        }
    }
}

impl Default for IntakeTiming {
    fn default() -> Self {
        IntakeTiming::Morning
    }
}

impl TryFrom<i64> for IntakeTiming {
    type Error = DomainError;

    fn try_from(code: i64) -> Result<Self, Self::Error> {
        Self::from_code(code)
    }
}

impl From<IntakeTiming> for i64 {
    fn from(timing: IntakeTiming) -> Self {
        timing.code()
    }
}

impl fmt::Display for IntakeTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codes_are_contiguous() {
        for (index, timing) in IntakeTiming::ALL.iter().enumerate() {
            assert_eq!(timing.code(), index as i64 + 1);
            assert_eq!(IntakeTiming::from_code(timing.code()).unwrap(), *timing);
        }
    }

    #[test]
    fn test_unknown_code_rejected() {
        assert_eq!(
            IntakeTiming::from_code(0),
            Err(DomainError::InvalidIntakeTiming(0))
        );
        assert!(IntakeTiming::from_code(13).is_err());
    }

    #[test]
    fn test_serializes_as_code() {
        let json = serde_json::to_string(&IntakeTiming::Bedtime).unwrap();
        assert_eq!(json, "10");
        let back: IntakeTiming = serde_json::from_str("12").unwrap();
        assert_eq!(back, IntakeTiming::AsNeeded);
        assert!(serde_json::from_str::<IntakeTiming>("42").is_err());
    }
}
