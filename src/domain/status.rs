/// Calendar status classification
///
/// Reduces one daily log to a three-tier status used to colour the calendar
/// dot for that day. Pure functions only; nothing here touches storage.

use serde::{Deserialize, Serialize};
use crate::domain::condition::{DailyConditionLog, DEFAULT_CONDITION, LEVEL_MAX};

/// Lower bound of the "caution" condition-score band `[50, 100)`
pub const CAUTION_SCORE_FLOOR: i32 = 50;

/// Severity tier of one calendar day
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStatus {
    Good,
    Caution,
    Poor,
}

impl DayStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            DayStatus::Good => "good",
            DayStatus::Caution => "caution",
            DayStatus::Poor => "poor",
        }
    }
}

/// Classify a daily log
///
/// Rules apply in order:
/// 1. `Good` when every symptom level is 5 and both scores are at least 100.
/// 2. `Caution` when every level is 3 or 4, or either score lies in `[50, 100)`.
/// 3. `Poor` otherwise.
pub fn classify(log: &DailyConditionLog) -> DayStatus {
    let levels = log.levels();
    let scores = log.condition_scores();

    let all_clear = levels.iter().all(|&level| level == LEVEL_MAX);
    let scores_at_baseline = scores.iter().all(|&score| score >= DEFAULT_CONDITION);
    if all_clear && scores_at_baseline {
        return DayStatus::Good;
    }

    let all_moderate = levels.iter().all(|&level| matches!(level, 3 | 4));
    let score_dipped = scores
        .iter()
        .any(|&score| (CAUTION_SCORE_FLOOR..DEFAULT_CONDITION).contains(&score));
    if all_moderate || score_dipped {
        return DayStatus::Caution;
    }

    DayStatus::Poor
}

/// Classify a day that may have no log at all
///
/// A missing log is classified with every level and score substituted by 0,
/// which always lands on `Poor`.
pub fn classify_day(log: Option<&DailyConditionLog>) -> DayStatus {
    match log {
        Some(log) => classify(log),
        None => classify(&zeroed_log()),
    }
}

fn zeroed_log() -> DailyConditionLog {
    DailyConditionLog {
        headache_level: 0,
        seizure_level: 0,
        right_side_level: 0,
        left_side_level: 0,
        speech_impairment_level: 0,
        memory_impairment_level: 0,
        physical_condition: 0,
        mental_condition: 0,
        ..DailyConditionLog::new(chrono::NaiveDate::MIN)
    }
}
