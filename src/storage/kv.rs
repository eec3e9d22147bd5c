/// Key-value implementation of the journal storage interface
///
/// Used where no embedded SQL engine is available. The whole store is a
/// flat map of `"<entity>:<primary-key>"` keys to JSON-encoded records,
/// kept in memory and written back to a single JSON file after each write.
/// Range scans walk the computed date sequence, so they are O(days) rather
/// than indexed.
///
/// Records are written with camelCase field names. The read path also
/// accepts the snake_case column names used by the SQLite schema.

use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::domain::condition::{DEFAULT_CONDITION, DEFAULT_LEVEL};
use crate::domain::dates::{self, DateCode, DateRange};
use crate::domain::{DailyConditionLog, IntakeTiming, Medication, MedicationId};
use crate::storage::{
    JournalStore, MigrationFailure, SchemaReport, StorageError, LOGS_TABLE, MEDICATIONS_TABLE,
};

/// Key holding the last medication id handed out
const MEDICATION_SEQ_KEY: &str = "meta:medication_seq";

type Entries = BTreeMap<String, String>;

fn log_key(date: NaiveDate) -> String {
    format!("{}:{}", LOGS_TABLE, dates::format_iso_date(date))
}

fn medication_key(id: MedicationId) -> String {
    format!("{}:{}", MEDICATIONS_TABLE, id)
}

fn default_level() -> u8 {
    DEFAULT_LEVEL
}

fn default_condition() -> i32 {
    DEFAULT_CONDITION
}

fn default_timing() -> i64 {
    IntakeTiming::Morning.code()
}

/// Stored form of a daily condition log
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LogRecord {
    #[serde(alias = "recorded_date")]
    recorded_date: String,
    #[serde(default)]
    memo: Option<String>,
    #[serde(default = "default_level", alias = "headache_level")]
    headache_level: u8,
    #[serde(default = "default_level", alias = "seizure_level")]
    seizure_level: u8,
    #[serde(default = "default_level", alias = "right_side_level")]
    right_side_level: u8,
    #[serde(default = "default_level", alias = "left_side_level")]
    left_side_level: u8,
    #[serde(default = "default_level", alias = "speech_impairment_level")]
    speech_impairment_level: u8,
    #[serde(default = "default_level", alias = "memory_impairment_level")]
    memory_impairment_level: u8,
    #[serde(default = "default_condition", alias = "physical_condition")]
    physical_condition: i32,
    #[serde(default = "default_condition", alias = "mental_condition")]
    mental_condition: i32,
    #[serde(default, alias = "blood_pressure_systolic")]
    blood_pressure_systolic: Option<i32>,
    #[serde(default, alias = "blood_pressure_diastolic")]
    blood_pressure_diastolic: Option<i32>,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

impl LogRecord {
    fn from_log(log: &DailyConditionLog) -> Self {
        Self {
            recorded_date: dates::format_iso_date(log.recorded_date),
            memo: log.memo.clone(),
            headache_level: log.headache_level,
            seizure_level: log.seizure_level,
            right_side_level: log.right_side_level,
            left_side_level: log.left_side_level,
            speech_impairment_level: log.speech_impairment_level,
            memory_impairment_level: log.memory_impairment_level,
            physical_condition: log.physical_condition,
            mental_condition: log.mental_condition,
            blood_pressure_systolic: log.blood_pressure_systolic,
            blood_pressure_diastolic: log.blood_pressure_diastolic,
            created_at: log.created_at,
            updated_at: log.updated_at,
        }
    }

    fn into_log(self) -> Result<DailyConditionLog, StorageError> {
        Ok(DailyConditionLog {
            recorded_date: dates::parse_iso_date(&self.recorded_date)?,
            memo: self.memo,
            headache_level: self.headache_level,
            seizure_level: self.seizure_level,
            right_side_level: self.right_side_level,
            left_side_level: self.left_side_level,
            speech_impairment_level: self.speech_impairment_level,
            memory_impairment_level: self.memory_impairment_level,
            physical_condition: self.physical_condition,
            mental_condition: self.mental_condition,
            blood_pressure_systolic: self.blood_pressure_systolic,
            blood_pressure_diastolic: self.blood_pressure_diastolic,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Stored form of a medication
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct MedicationRecord {
    id: i64,
    #[serde(alias = "medication_name")]
    medication_name: String,
    #[serde(default)]
    dosage: Option<String>,
    #[serde(default = "default_timing", alias = "intake_timing")]
    intake_timing: i64,
    #[serde(default, alias = "start_date")]
    start_date: Option<i64>,
    #[serde(default, alias = "end_date")]
    end_date: Option<i64>,
    #[serde(default, alias = "created_at")]
    created_at: Option<DateTime<Utc>>,
    #[serde(default, alias = "updated_at")]
    updated_at: Option<DateTime<Utc>>,
}

impl MedicationRecord {
    fn from_medication(id: MedicationId, medication: &Medication) -> Self {
        Self {
            id: id.value(),
            medication_name: medication.medication_name.clone(),
            dosage: medication.dosage.clone(),
            intake_timing: medication.intake_timing.code(),
            start_date: medication.start_date.map(DateCode::value),
            end_date: medication.end_date.map(DateCode::value),
            created_at: medication.created_at,
            updated_at: medication.updated_at,
        }
    }

    fn into_medication(self) -> Result<Medication, StorageError> {
        Ok(Medication {
            id: Some(MedicationId(self.id)),
            medication_name: self.medication_name,
            dosage: self.dosage,
            intake_timing: IntakeTiming::from_code(self.intake_timing)?,
            start_date: self.start_date.map(DateCode),
            end_date: self.end_date.map(DateCode),
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

/// Flat key-value store persisted as one JSON file
pub struct KvStore {
    /// `None` keeps everything in memory only
    path: Option<PathBuf>,
    entries: Mutex<Entries>,
}

impl KvStore {
    /// Open the store file at `path`, creating it on first write
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let path = path.into();
        let entries = load_entries(&path)?;

        let store = Self {
            path: Some(path),
            entries: Mutex::new(entries),
        };
        store.ensure_schema()?;

        tracing::info!(
            "Key-value storage initialized at: {:?}",
            store.path.as_deref().unwrap_or_else(|| Path::new(""))
        );
        Ok(store)
    }

    /// A store that never touches the disk
    pub fn in_memory() -> Self {
        Self {
            path: None,
            entries: Mutex::new(Entries::new()),
        }
    }

    /// Raw JSON blob stored under `key` (for diagnostics and tests)
    pub fn raw_entry(&self, key: &str) -> Result<Option<String>, StorageError> {
        Ok(self.entries()?.get(key).cloned())
    }

    /// Store a raw JSON blob under `key`, bypassing record encoding
    pub fn put_raw_entry(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.write(|entries| {
            entries.insert(key.to_string(), value.to_string());
            Ok(())
        })
    }

    fn entries(&self) -> Result<MutexGuard<'_, Entries>, StorageError> {
        self.entries
            .lock()
            .map_err(|_| StorageError::StoreUnavailable("Key-value store lock poisoned".to_string()))
    }

    /// Apply `change` to a copy of the map, persist it, then swap it in
    ///
    /// If persisting fails the in-memory map is left as it was.
    fn write<T>(
        &self,
        change: impl FnOnce(&mut Entries) -> Result<T, StorageError>,
    ) -> Result<T, StorageError> {
        let mut entries = self.entries()?;
        let mut updated = entries.clone();
        let result = change(&mut updated)?;

        if let Some(path) = &self.path {
            persist_entries(path, &updated)?;
        }
        *entries = updated;
        Ok(result)
    }
}

fn load_entries(path: &Path) -> Result<Entries, StorageError> {
    match fs::read_to_string(path) {
        Ok(contents) if contents.trim().is_empty() => Ok(Entries::new()),
        Ok(contents) => serde_json::from_str(&contents).map_err(|e| {
            StorageError::StoreUnavailable(format!("Unreadable store file {}: {}", path.display(), e))
        }),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Entries::new()),
        Err(e) => Err(StorageError::StoreUnavailable(format!(
            "Failed to read {}: {}",
            path.display(),
            e
        ))),
    }
}

/// Write through a temporary file and rename so a crash never leaves a
/// half-written store behind
fn persist_entries(path: &Path, entries: &Entries) -> Result<(), StorageError> {
    let failed = |e: std::io::Error| {
        StorageError::KeyValueFailed(format!("Failed to write {}: {}", path.display(), e))
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(failed)?;
    }

    let tmp_path = path.with_extension("tmp");
    fs::write(&tmp_path, serde_json::to_string(entries)?).map_err(failed)?;
    fs::rename(&tmp_path, path).map_err(failed)?;
    Ok(())
}

fn read_log(entries: &Entries, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError> {
    entries
        .get(&log_key(date))
        .map(|blob| serde_json::from_str::<LogRecord>(blob)?.into_log())
        .transpose()
}

/// Decode `blob` and encode it again with the current field names
fn rewrite_record<R>(blob: &str) -> Result<String, serde_json::Error>
where
    R: Serialize + for<'de> Deserialize<'de>,
{
    serde_json::to_string(&serde_json::from_str::<R>(blob)?)
}

fn next_medication_id(entries: &Entries) -> Result<MedicationId, StorageError> {
    let last = match entries.get(MEDICATION_SEQ_KEY) {
        Some(seq) => serde_json::from_str::<i64>(seq)?,
        // Stores written before the counter existed: continue after the
        // highest id present
        None => entries
            .iter()
            .filter(|(key, _)| key.starts_with(MEDICATIONS_TABLE))
            .filter_map(|(_, blob)| serde_json::from_str::<MedicationRecord>(blob).ok())
            .map(|record| record.id)
            .max()
            .unwrap_or(0),
    };
    Ok(MedicationId(last + 1))
}

impl JournalStore for KvStore {
    fn backend_name(&self) -> &'static str {
        "key-value"
    }

    /// Rewrite legacy snake_case records with the current field names
    ///
    /// There are no columns to add: missing fields already read back as
    /// their defaults. A record that cannot be decoded is left as it is and
    /// listed in the report's failures.
    fn ensure_schema(&self) -> Result<SchemaReport, StorageError> {
        let mut report = SchemaReport::default();
        let pending: Vec<(String, String)> = {
            let entries = self.entries()?;
            let mut pending = Vec::new();
            for (key, blob) in entries.iter() {
                let (entity, rewritten) = if key.starts_with(&format!("{}:", LOGS_TABLE)) {
                    (LOGS_TABLE, rewrite_record::<LogRecord>(blob))
                } else if key.starts_with(&format!("{}:", MEDICATIONS_TABLE)) {
                    (MEDICATIONS_TABLE, rewrite_record::<MedicationRecord>(blob))
                } else {
                    continue;
                };
                match rewritten {
                    Ok(rewritten) if &rewritten != blob => pending.push((key.clone(), rewritten)),
                    Ok(_) => {}
                    Err(e) => {
                        tracing::warn!("Skipping unreadable key-value record {}: {}", key, e);
                        report.failures.push(MigrationFailure {
                            table: entity.to_string(),
                            column: key.clone(),
                            message: e.to_string(),
                        });
                    }
                }
            }
            pending
        };

        if pending.is_empty() {
            return Ok(report);
        }

        report.rewritten_records = pending.len();
        self.write(|entries| {
            entries.extend(pending);
            Ok(())
        })?;

        tracing::info!("Rewrote {} legacy key-value record(s)", report.rewritten_records);
        Ok(report)
    }

    fn fetch_log(&self, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError> {
        let entries = self.entries()?;
        read_log(&entries, date)
    }

    fn fetch_logs_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyConditionLog>, StorageError> {
        let entries = self.entries()?;
        let mut logs = Vec::new();
        for date in DateRange::inclusive(start, end) {
            if let Some(log) = read_log(&entries, date)? {
                logs.push(log);
            }
        }
        Ok(logs)
    }

    fn upsert_log(
        &self,
        log: &DailyConditionLog,
        now: DateTime<Utc>,
    ) -> Result<DailyConditionLog, StorageError> {
        let saved = self.write(|entries| {
            let created_at = read_log(entries, log.recorded_date)?
                .and_then(|existing| existing.created_at)
                .unwrap_or(now);

            let saved = DailyConditionLog {
                created_at: Some(created_at),
                updated_at: Some(now),
                ..log.clone()
            };
            entries.insert(
                log_key(log.recorded_date),
                serde_json::to_string(&LogRecord::from_log(&saved))?,
            );
            Ok(saved)
        })?;

        tracing::debug!("Upserted condition log for {}", log.recorded_date);
        Ok(saved)
    }

    fn insert_default_logs(
        &self,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let missing: Vec<NaiveDate> = {
            let entries = self.entries()?;
            dates
                .iter()
                .copied()
                .filter(|date| !entries.contains_key(&log_key(*date)))
                .collect()
        };
        if missing.is_empty() {
            return Ok(0);
        }

        let inserted = self.write(|entries| {
            let mut inserted = 0;
            for date in &missing {
                let key = log_key(*date);
                if entries.contains_key(&key) {
                    continue;
                }
                let log = DailyConditionLog {
                    created_at: Some(now),
                    updated_at: Some(now),
                    ..DailyConditionLog::new(*date)
                };
                entries.insert(key, serde_json::to_string(&LogRecord::from_log(&log))?);
                inserted += 1;
            }
            Ok(inserted)
        })?;

        tracing::debug!("Backfilled {} default condition log(s)", inserted);
        Ok(inserted)
    }

    fn list_medications(&self) -> Result<Vec<Medication>, StorageError> {
        let entries = self.entries()?;
        let prefix = format!("{}:", MEDICATIONS_TABLE);

        let mut medications = entries
            .iter()
            .filter(|(key, _)| key.starts_with(&prefix))
            .map(|(_, blob)| serde_json::from_str::<MedicationRecord>(blob)?.into_medication())
            .collect::<Result<Vec<_>, StorageError>>()?;

        medications.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(medications)
    }

    fn insert_medication(
        &self,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Medication, StorageError> {
        let stored = self.write(|entries| {
            let id = next_medication_id(entries)?;
            let stored = Medication {
                id: Some(id),
                created_at: Some(now),
                updated_at: Some(now),
                ..medication.clone()
            };
            entries.insert(
                medication_key(id),
                serde_json::to_string(&MedicationRecord::from_medication(id, &stored))?,
            );
            entries.insert(MEDICATION_SEQ_KEY.to_string(), id.value().to_string());
            Ok(stored)
        })?;

        tracing::debug!("Created medication: {} ({:?})", stored.medication_name, stored.id);
        Ok(stored)
    }

    fn update_medication(
        &self,
        id: MedicationId,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Option<Medication>, StorageError> {
        let key = medication_key(id);
        if !self.entries()?.contains_key(&key) {
            return Ok(None);
        }

        // Checked again under the write lock: a delete may have won the race
        let updated = self.write(|entries| {
            let Some(blob) = entries.get(&key) else {
                return Ok(None);
            };
            // An unreadable record is overwritten, keeping no creation time
            let created_at = serde_json::from_str::<MedicationRecord>(blob)
                .ok()
                .and_then(|record| record.created_at);

            let stored = Medication {
                id: Some(id),
                created_at: created_at.or(Some(now)),
                updated_at: Some(now),
                ..medication.clone()
            };
            entries.insert(
                key.clone(),
                serde_json::to_string(&MedicationRecord::from_medication(id, &stored))?,
            );
            Ok(Some(stored))
        })?;

        tracing::debug!("Updated medication {} (found: {})", id, updated.is_some());
        Ok(updated)
    }

    fn delete_medication(&self, id: MedicationId) -> Result<bool, StorageError> {
        let key = medication_key(id);
        if !self.entries()?.contains_key(&key) {
            return Ok(false);
        }

        let removed = self.write(|entries| Ok(entries.remove(&key).is_some()))?;

        tracing::debug!("Deleted medication {} (removed: {})", id, removed);
        Ok(removed)
    }
}
