/// DailyConditionLog entity for one day's self-reported condition
///
/// This module defines the DailyConditionLog struct that represents a single
/// calendar day's symptom levels, condition scores and blood pressure, along
/// with the default values and the normalisation applied before saving.

use serde::{Deserialize, Serialize};
use chrono::{DateTime, NaiveDate, Utc};
use crate::domain::DomainError;

/// Worst symptom level
pub const LEVEL_MIN: u8 = 1;
/// Best symptom level, meaning "no symptom"
pub const LEVEL_MAX: u8 = 5;
/// Level used for any symptom the user has not rated
pub const DEFAULT_LEVEL: u8 = LEVEL_MAX;

pub const CONDITION_MIN: i32 = 0;
pub const CONDITION_MAX: i32 = 200;
/// Baseline ("normal") physical and mental condition
pub const DEFAULT_CONDITION: i32 = 100;

/// A record of how the user felt on one calendar day
///
/// At most one log exists per `recorded_date`; saving again for the same
/// date overwrites every field. Symptom levels run from 1 (worst) to 5
/// (best), condition scores from 0 to 200 with 100 as the baseline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyConditionLog {
    /// Which day this log is for (unique key)
    pub recorded_date: NaiveDate,
    /// Free-text notes
    pub memo: Option<String>,
    pub headache_level: u8,
    pub seizure_level: u8,
    pub right_side_level: u8,
    pub left_side_level: u8,
    pub speech_impairment_level: u8,
    pub memory_impairment_level: u8,
    /// Physical condition score (0-200)
    pub physical_condition: i32,
    /// Mental condition score (0-200)
    pub mental_condition: i32,
    pub blood_pressure_systolic: Option<i32>,
    pub blood_pressure_diastolic: Option<i32>,
    /// Set by the store on first insert; `None` until persisted
    pub created_at: Option<DateTime<Utc>>,
    /// Refreshed by the store on every write; `None` until persisted
    pub updated_at: Option<DateTime<Utc>>,
}

impl DailyConditionLog {
    /// Create a log for `recorded_date` with every field at its default
    ///
    /// This is exactly the row backfill inserts: no symptoms, baseline
    /// condition, no blood pressure and no memo.
    pub fn new(recorded_date: NaiveDate) -> Self {
        Self {
            recorded_date,
            memo: None,
            headache_level: DEFAULT_LEVEL,
            seizure_level: DEFAULT_LEVEL,
            right_side_level: DEFAULT_LEVEL,
            left_side_level: DEFAULT_LEVEL,
            speech_impairment_level: DEFAULT_LEVEL,
            memory_impairment_level: DEFAULT_LEVEL,
            physical_condition: DEFAULT_CONDITION,
            mental_condition: DEFAULT_CONDITION,
            blood_pressure_systolic: None,
            blood_pressure_diastolic: None,
            created_at: None,
            updated_at: None,
        }
    }

    /// The six symptom levels with their column-style names
    pub fn named_levels(&self) -> [(&'static str, u8); 6] {
        [
            ("headache", self.headache_level),
            ("seizure", self.seizure_level),
            ("right_side", self.right_side_level),
            ("left_side", self.left_side_level),
            ("speech_impairment", self.speech_impairment_level),
            ("memory_impairment", self.memory_impairment_level),
        ]
    }

    /// The six symptom levels in a fixed order
    pub fn levels(&self) -> [u8; 6] {
        self.named_levels().map(|(_, level)| level)
    }

    /// Both condition scores (physical, mental)
    pub fn condition_scores(&self) -> [i32; 2] {
        [self.physical_condition, self.mental_condition]
    }

    /// Prepare a log for writing
    ///
    /// Condition scores are clamped into 0-200 rather than rejected.
    /// Symptom levels outside 1-5 are rejected.
    pub fn normalized(mut self) -> Result<Self, DomainError> {
        for (symptom, level) in self.named_levels() {
            if !(LEVEL_MIN..=LEVEL_MAX).contains(&level) {
                return Err(DomainError::InvalidLevel {
                    symptom,
                    value: level as i64,
                });
            }
        }

        self.physical_condition = clamp_condition(self.physical_condition as i64);
        self.mental_condition = clamp_condition(self.mental_condition as i64);
        Ok(self)
    }

    /// Compare every user-entered field, ignoring the timestamps
    pub fn same_content(&self, other: &Self) -> bool {
        self.recorded_date == other.recorded_date
            && self.memo == other.memo
            && self.levels() == other.levels()
            && self.condition_scores() == other.condition_scores()
            && self.blood_pressure_systolic == other.blood_pressure_systolic
            && self.blood_pressure_diastolic == other.blood_pressure_diastolic
    }

    /// Check if every field still holds its default value
    pub fn is_default(&self) -> bool {
        self.same_content(&Self::new(self.recorded_date))
    }

    /// Check if this log has non-blank notes
    pub fn has_memo(&self) -> bool {
        self.memo.as_deref().is_some_and(|memo| !memo.trim().is_empty())
    }
}

/// Clamp a raw condition score into `[0, 200]`
pub fn clamp_condition(raw: i64) -> i32 {
    raw.clamp(CONDITION_MIN as i64, CONDITION_MAX as i64) as i32
}

/// Colour family of a symptom level
///
/// The scale is asymmetric around the neutral midpoint: 1 and 2 are
/// red-toned, 3 is neutral, 4 and 5 are blue-toned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LevelTone {
    Bad,
    Neutral,
    Good,
}

impl LevelTone {
    pub fn for_level(level: u8) -> Self {
        match level {
            0..=2 => LevelTone::Bad,
            3 => LevelTone::Neutral,
            _ => LevelTone::Good,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LevelTone::Bad => "bad",
            LevelTone::Neutral => "neutral",
            LevelTone::Good => "good",
        }
    }
}
