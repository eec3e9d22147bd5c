/// Tools for reading and saving daily condition logs
///
/// This module implements the condition_log_get and condition_log_save MCP
/// tools.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::domain::condition::{clamp_condition, LevelTone};
use crate::domain::{classify, dates, DailyConditionLog, DayStatus};
use crate::repository::DailyLogRepository;
use crate::storage::{JournalStore, StorageError};
use crate::tools::{date_or_today, nullable};

/// Parameters for reading one day's log
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetConditionLogParams {
    /// Date to read (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
}

/// A condition score as sent by a client: a number or a numeric string
///
/// Anything that does not parse as a number counts as 0. The value is then
/// clamped into 0-200.
#[derive(Debug, Clone, PartialEq, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum ScoreInput {
    Number(f64),
    Text(String),
}

impl ScoreInput {
    pub fn to_score(&self) -> i32 {
        let raw = match self {
            ScoreInput::Number(n) => *n,
            ScoreInput::Text(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        };
        if raw.is_finite() {
            clamp_condition(raw.trunc() as i64)
        } else {
            0
        }
    }
}

/// Parameters for saving one day's log
///
/// Fields left out keep their stored value, or the default for a day that
/// has no log yet. Blood pressure given as `null` is cleared.
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct SaveConditionLogParams {
    /// Date to save (YYYY-MM-DD, defaults to today)
    pub date: Option<String>,
    /// Free-text notes; an empty string clears them
    pub memo: Option<String>,
    /// Symptom levels, 1 (worst) to 5 (no symptom)
    pub headache_level: Option<u8>,
    pub seizure_level: Option<u8>,
    pub right_side_level: Option<u8>,
    pub left_side_level: Option<u8>,
    pub speech_impairment_level: Option<u8>,
    pub memory_impairment_level: Option<u8>,
    /// Physical condition, 0-200 with 100 as normal
    pub physical_condition: Option<ScoreInput>,
    /// Mental condition, 0-200 with 100 as normal
    pub mental_condition: Option<ScoreInput>,
    /// Systolic blood pressure; `null` clears it
    #[serde(default, deserialize_with = "nullable")]
    #[schemars(with = "Option<i32>")]
    pub blood_pressure_systolic: Option<Option<i32>>,
    /// Diastolic blood pressure; `null` clears it
    #[serde(default, deserialize_with = "nullable")]
    #[schemars(with = "Option<i32>")]
    pub blood_pressure_diastolic: Option<Option<i32>>,
}

/// Response carrying one day's log
#[derive(Debug, Serialize)]
pub struct ConditionLogResponse {
    pub success: bool,
    pub message: String,
    /// False when the day has no stored log and `log` holds the defaults
    pub found: bool,
    pub status: DayStatus,
    pub log: DailyConditionLog,
}

/// Read the log for a day
pub fn get_condition_log<S: JournalStore + ?Sized>(
    store: &S,
    params: GetConditionLogParams,
) -> Result<ConditionLogResponse, StorageError> {
    let date = date_or_today(params.date.as_deref())?;
    let repo = DailyLogRepository::new(store);

    match repo.get(date) {
        Some(log) => Ok(ConditionLogResponse {
            success: true,
            message: describe_log(&log),
            found: true,
            status: classify(&log),
            log,
        }),
        None => {
            let log = DailyConditionLog::new(date);
            Ok(ConditionLogResponse {
                success: true,
                message: format!(
                    "No record for {} ({}). Defaults: every symptom 5, condition 100/100.",
                    date,
                    dates::weekday_label(date)
                ),
                found: false,
                status: classify(&log),
                log,
            })
        }
    }
}

/// Save the log for a day, merging the given fields over what is stored
pub fn save_condition_log<S: JournalStore + ?Sized>(
    store: &S,
    params: SaveConditionLogParams,
) -> Result<ConditionLogResponse, StorageError> {
    let date = date_or_today(params.date.as_deref())?;
    let repo = DailyLogRepository::new(store);

    // A stored log that can't be read aborts the save rather than being
    // overwritten with defaults
    let mut log = repo
        .find(date)?
        .unwrap_or_else(|| DailyConditionLog::new(date));

    if let Some(memo) = params.memo {
        log.memo = Some(memo).filter(|memo| !memo.trim().is_empty());
    }
    let levels = [
        (params.headache_level, &mut log.headache_level),
        (params.seizure_level, &mut log.seizure_level),
        (params.right_side_level, &mut log.right_side_level),
        (params.left_side_level, &mut log.left_side_level),
        (params.speech_impairment_level, &mut log.speech_impairment_level),
        (params.memory_impairment_level, &mut log.memory_impairment_level),
    ];
    for (given, field) in levels {
        if let Some(level) = given {
            *field = level;
        }
    }
    if let Some(score) = &params.physical_condition {
        log.physical_condition = score.to_score();
    }
    if let Some(score) = &params.mental_condition {
        log.mental_condition = score.to_score();
    }
    if let Some(systolic) = params.blood_pressure_systolic {
        log.blood_pressure_systolic = systolic;
    }
    if let Some(diastolic) = params.blood_pressure_diastolic {
        log.blood_pressure_diastolic = diastolic;
    }

    let saved = repo.upsert(log)?;

    Ok(ConditionLogResponse {
        success: true,
        message: format!("Saved condition log.\n{}", describe_log(&saved)),
        found: true,
        status: classify(&saved),
        log: saved,
    })
}

fn describe_log(log: &DailyConditionLog) -> String {
    let levels = log
        .named_levels()
        .iter()
        .map(|(name, level)| {
            format!("{} {} ({})", name, level, LevelTone::for_level(*level).as_str())
        })
        .collect::<Vec<_>>()
        .join(", ");

    let mut text = format!(
        "{} ({}): {}\nSymptoms: {}\nCondition: physical {}, mental {}",
        log.recorded_date,
        dates::weekday_label(log.recorded_date),
        classify(log).as_str(),
        levels,
        log.physical_condition,
        log.mental_condition
    );

    match (log.blood_pressure_systolic, log.blood_pressure_diastolic) {
        (None, None) => {}
        (systolic, diastolic) => text.push_str(&format!(
            "\nBlood pressure: {}/{}",
            systolic.map_or("-".to_string(), |v| v.to_string()),
            diastolic.map_or("-".to_string(), |v| v.to_string())
        )),
    }
    if let Some(memo) = log.memo.as_deref().filter(|_| log.has_memo()) {
        text.push_str(&format!("\nMemo: {}", memo));
    }

    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{KvStore, SqliteStore};

    #[test]
    fn test_score_input_parsing() {
        assert_eq!(ScoreInput::Number(75.0).to_score(), 75);
        assert_eq!(ScoreInput::Number(250.0).to_score(), 200);
        assert_eq!(ScoreInput::Text(" 120 ".to_string()).to_score(), 120);
        assert_eq!(ScoreInput::Text("-3".to_string()).to_score(), 0);
        assert_eq!(ScoreInput::Text("abc".to_string()).to_score(), 0);
        assert_eq!(ScoreInput::Text(String::new()).to_score(), 0);
    }

    #[test]
    fn test_score_input_deserializes_both_shapes() {
        let params: SaveConditionLogParams = serde_json::from_value(serde_json::json!({
            "date": "2025-01-15",
            "physical_condition": "80",
            "mental_condition": 90
        }))
        .unwrap();

        assert_eq!(params.physical_condition.unwrap().to_score(), 80);
        assert_eq!(params.mental_condition.unwrap().to_score(), 90);
    }

    #[test]
    fn test_get_missing_day_returns_defaults() {
        let store = SqliteStore::open_in_memory().unwrap();
        let response = get_condition_log(
            &store,
            GetConditionLogParams {
                date: Some("2025-01-15".to_string()),
            },
        )
        .unwrap();

        assert!(!response.found);
        assert!(response.message.contains("No record for 2025-01-15"));
        assert!(response.log.is_default());
    }

    #[test]
    fn test_save_merges_over_stored_log() {
        let store = SqliteStore::open_in_memory().unwrap();

        save_condition_log(
            &store,
            SaveConditionLogParams {
                date: Some("2025-01-15".to_string()),
                headache_level: Some(2),
                memo: Some("rough night".to_string()),
                ..Default::default()
            },
        )
        .unwrap();

        let response = save_condition_log(
            &store,
            SaveConditionLogParams {
                date: Some("2025-01-15".to_string()),
                blood_pressure_systolic: Some(Some(128)),
                ..Default::default()
            },
        )
        .unwrap();

        assert_eq!(response.log.headache_level, 2);
        assert_eq!(response.log.memo.as_deref(), Some("rough night"));
        assert_eq!(response.log.blood_pressure_systolic, Some(128));
        assert_eq!(response.status, DayStatus::Poor);
        assert!(response.message.contains("Blood pressure: 128/-"));
        assert!(response.message.contains("headache 2 (bad)"));
        assert!(response.message.contains("seizure 5 (good)"));
    }

    #[test]
    fn test_null_blood_pressure_clears_it() {
        let store = SqliteStore::open_in_memory().unwrap();
        let save = |arguments: serde_json::Value| {
            let params: SaveConditionLogParams = serde_json::from_value(arguments).unwrap();
            save_condition_log(&store, params).unwrap()
        };

        save(serde_json::json!({
            "date": "2025-01-15",
            "blood_pressure_systolic": 120,
            "blood_pressure_diastolic": 80
        }));

        let omitted = save(serde_json::json!({"date": "2025-01-15", "memo": "slept well"}));
        assert_eq!(omitted.log.blood_pressure_systolic, Some(120));

        let cleared = save(serde_json::json!({"date": "2025-01-15", "blood_pressure_systolic": null}));
        assert_eq!(cleared.log.blood_pressure_systolic, None);
        assert_eq!(cleared.log.blood_pressure_diastolic, Some(80));
        assert!(cleared.message.contains("Blood pressure: -/80"));
    }

    #[test]
    fn test_unreadable_stored_log_is_not_overwritten() {
        let store = KvStore::in_memory();
        let original = r#"{"recordedDate":"2025-01-15","memo":"keep me","headacheLevel":"one"}"#;
        store
            .put_raw_entry("daily_condition_logs:2025-01-15", original)
            .unwrap();

        let result = save_condition_log(
            &store,
            SaveConditionLogParams {
                date: Some("2025-01-15".to_string()),
                blood_pressure_systolic: Some(Some(120)),
                ..Default::default()
            },
        );
        assert!(result.is_err());

        let raw = store.raw_entry("daily_condition_logs:2025-01-15").unwrap();
        assert_eq!(raw.as_deref(), Some(original));
    }

    #[test]
    fn test_save_rejects_bad_date() {
        let store = SqliteStore::open_in_memory().unwrap();
        let result = save_condition_log(
            &store,
            SaveConditionLogParams {
                date: Some("15/01/2025".to_string()),
                ..Default::default()
            },
        );
        assert!(result.unwrap_err().is_validation());
    }
}
