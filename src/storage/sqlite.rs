/// SQLite implementation of the journal storage interface
///
/// This module provides the concrete SQLite implementation for storing
/// and retrieving journal data. It handles all SQL queries and data
/// conversion. Every value is bound as a positional parameter.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::domain::dates::DateCode;
use crate::domain::{DailyConditionLog, IntakeTiming, Medication, MedicationId};
use crate::storage::{migrations, JournalStore, SchemaReport, StorageError};

const LOG_COLUMNS: &str = "recorded_date, memo, headache_level, seizure_level,
    right_side_level, left_side_level, speech_impairment_level, memory_impairment_level,
    physical_condition, mental_condition, blood_pressure_systolic, blood_pressure_diastolic,
    created_at, updated_at";

const MEDICATION_COLUMNS: &str =
    "id, medication_name, dosage, intake_timing, start_date, end_date, created_at, updated_at";

/// SQLite-based storage implementation
///
/// This struct owns the connection to the SQLite database and implements
/// all the storage operations defined in the JournalStore trait. The
/// connection sits behind a mutex so one store can be shared between
/// threads; SQLite serialises the statements anyway.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    /// Open (or create) the database at `db_path`
    ///
    /// This opens the database file and runs the schema check so the
    /// tables are ready before the first query.
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let db_path = db_path.as_ref();

        let conn = Connection::open(db_path).map_err(|e| {
            StorageError::StoreUnavailable(format!(
                "Failed to open database {}: {}",
                db_path.display(),
                e
            ))
        })?;

        let store = Self::from_connection(conn)?;
        tracing::info!("SQLite storage initialized at: {:?}", db_path);
        Ok(store)
    }

    /// Open a private in-memory database (used by tests)
    pub fn open_in_memory() -> Result<Self, StorageError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            StorageError::StoreUnavailable(format!("Failed to open in-memory database: {}", e))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StorageError> {
        configure_connection(&conn)?;

        let report = migrations::ensure_schema(&conn)?;
        if !report.failures.is_empty() {
            tracing::warn!(
                "Schema check finished with {} non-fatal failure(s)",
                report.failures.len()
            );
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, StorageError> {
        self.conn
            .lock()
            .map_err(|_| StorageError::StoreUnavailable("Database connection lock poisoned".to_string()))
    }
}

fn configure_connection(conn: &Connection) -> Result<(), StorageError> {
    let unavailable =
        |e: rusqlite::Error| StorageError::StoreUnavailable(format!("Failed to configure database: {}", e));

    // In-memory databases answer "memory" here, which is fine
    conn.pragma_update_and_check(None, "journal_mode", "WAL", |row| row.get::<_, String>(0))
        .map_err(unavailable)?;
    conn.pragma_update(None, "foreign_keys", "ON")
        .map_err(unavailable)?;

    Ok(())
}

/// Parse a timestamp column
///
/// Rows written here hold RFC 3339. Rows stamped by SQLite itself
/// (`CURRENT_TIMESTAMP`) hold `YYYY-MM-DD HH:MM:SS` in UTC.
fn timestamp_column(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S").map(|dt| dt.and_utc()))
}

/// Build a log from a row selected with `LOG_COLUMNS`
fn log_from_row(row: &Row) -> rusqlite::Result<DailyConditionLog> {
    let recorded_date: String = row.get(0)?;
    let recorded_date = NaiveDate::parse_from_str(&recorded_date, "%Y-%m-%d")
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

    Ok(DailyConditionLog {
        recorded_date,
        memo: row.get(1)?,
        headache_level: row.get(2)?,
        seizure_level: row.get(3)?,
        right_side_level: row.get(4)?,
        left_side_level: row.get(5)?,
        speech_impairment_level: row.get(6)?,
        memory_impairment_level: row.get(7)?,
        physical_condition: row.get(8)?,
        mental_condition: row.get(9)?,
        blood_pressure_systolic: row.get(10)?,
        blood_pressure_diastolic: row.get(11)?,
        created_at: Some(timestamp_column(row, 12)?),
        updated_at: Some(timestamp_column(row, 13)?),
    })
}

/// Build a medication from a row selected with `MEDICATION_COLUMNS`
fn medication_from_row(row: &Row) -> rusqlite::Result<Medication> {
    let timing_code: i64 = row.get(3)?;
    let intake_timing = IntakeTiming::from_code(timing_code)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(3, Type::Integer, Box::new(e)))?;

    Ok(Medication {
        id: Some(MedicationId(row.get(0)?)),
        medication_name: row.get(1)?,
        dosage: row.get(2)?,
        intake_timing,
        start_date: row.get::<_, Option<i64>>(4)?.map(DateCode),
        end_date: row.get::<_, Option<i64>>(5)?.map(DateCode),
        created_at: Some(timestamp_column(row, 6)?),
        updated_at: Some(timestamp_column(row, 7)?),
    })
}

impl JournalStore for SqliteStore {
    fn backend_name(&self) -> &'static str {
        "sqlite"
    }

    fn ensure_schema(&self) -> Result<SchemaReport, StorageError> {
        let conn = self.conn()?;
        migrations::ensure_schema(&conn)
    }

    /// Get the log recorded for `date`, if any
    fn fetch_log(&self, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM daily_condition_logs WHERE recorded_date = ?1 LIMIT 1",
            LOG_COLUMNS
        ))?;

        let log = stmt
            .query_row(params![date.to_string()], log_from_row)
            .optional()?;
        Ok(log)
    }

    /// Get all logs within a date range
    fn fetch_logs_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyConditionLog>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM daily_condition_logs
             WHERE recorded_date BETWEEN ?1 AND ?2
             ORDER BY recorded_date ASC",
            LOG_COLUMNS
        ))?;

        let log_iter = stmt.query_map(params![start.to_string(), end.to_string()], log_from_row)?;

        let mut logs = Vec::new();
        for log in log_iter {
            logs.push(log?);
        }

        Ok(logs)
    }

    /// Insert or update the log for its date in one statement
    ///
    /// The write is committed only after the returned row decodes, so an
    /// error always means nothing changed.
    fn upsert_log(
        &self,
        log: &DailyConditionLog,
        now: DateTime<Utc>,
    ) -> Result<DailyConditionLog, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut stmt = tx.prepare(&format!(
            "INSERT INTO daily_condition_logs (
                recorded_date, memo, headache_level, seizure_level, right_side_level,
                left_side_level, speech_impairment_level, memory_impairment_level,
                physical_condition, mental_condition, blood_pressure_systolic,
                blood_pressure_diastolic, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            ON CONFLICT (recorded_date) DO UPDATE SET
                memo = excluded.memo,
                headache_level = excluded.headache_level,
                seizure_level = excluded.seizure_level,
                right_side_level = excluded.right_side_level,
                left_side_level = excluded.left_side_level,
                speech_impairment_level = excluded.speech_impairment_level,
                memory_impairment_level = excluded.memory_impairment_level,
                physical_condition = excluded.physical_condition,
                mental_condition = excluded.mental_condition,
                blood_pressure_systolic = excluded.blood_pressure_systolic,
                blood_pressure_diastolic = excluded.blood_pressure_diastolic,
                updated_at = excluded.updated_at
            RETURNING {}",
            LOG_COLUMNS
        ))?;

        let saved = stmt.query_row(
            params![
                log.recorded_date.to_string(),
                log.memo,
                log.headache_level,
                log.seizure_level,
                log.right_side_level,
                log.left_side_level,
                log.speech_impairment_level,
                log.memory_impairment_level,
                log.physical_condition,
                log.mental_condition,
                log.blood_pressure_systolic,
                log.blood_pressure_diastolic,
                now.to_rfc3339(),
            ],
            log_from_row,
        )?;
        drop(stmt);
        tx.commit()?;

        tracing::debug!("Upserted condition log for {}", log.recorded_date);
        Ok(saved)
    }

    /// Insert default rows for missing dates inside one transaction
    fn insert_default_logs(
        &self,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let now = now.to_rfc3339();
        let mut inserted = 0;

        {
            // Level and score columns fall back to their column defaults
            let mut stmt = tx.prepare(
                "INSERT OR IGNORE INTO daily_condition_logs (recorded_date, created_at, updated_at)
                 VALUES (?1, ?2, ?2)",
            )?;
            for date in dates {
                inserted += stmt.execute(params![date.to_string(), now])?;
            }
        }

        tx.commit()?;

        if inserted > 0 {
            tracing::debug!("Backfilled {} default condition log(s)", inserted);
        }
        Ok(inserted)
    }

    /// List medications, newest first
    fn list_medications(&self) -> Result<Vec<Medication>, StorageError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&format!(
            "SELECT {} FROM medications ORDER BY id DESC",
            MEDICATION_COLUMNS
        ))?;

        let medication_iter = stmt.query_map([], medication_from_row)?;

        let mut medications = Vec::new();
        for medication in medication_iter {
            medications.push(medication?);
        }

        Ok(medications)
    }

    /// Create a new medication
    fn insert_medication(
        &self,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Medication, StorageError> {
        let conn = self.conn()?;
        let stamp = now.to_rfc3339();

        conn.execute(
            "INSERT INTO medications (
                medication_name, dosage, intake_timing, start_date, end_date, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?6)",
            params![
                medication.medication_name,
                medication.dosage,
                medication.intake_timing.code(),
                medication.start_date.map(DateCode::value),
                medication.end_date.map(DateCode::value),
                stamp,
            ],
        )?;

        let id = MedicationId(conn.last_insert_rowid());
        tracing::debug!("Created medication: {} ({})", medication.medication_name, id);
        Ok(Medication {
            id: Some(id),
            created_at: Some(now),
            updated_at: Some(now),
            ..medication.clone()
        })
    }

    /// Update an existing medication
    fn update_medication(
        &self,
        id: MedicationId,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Option<Medication>, StorageError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;
        let mut stmt = tx.prepare(&format!(
            "UPDATE medications SET
                medication_name = ?2,
                dosage = ?3,
                intake_timing = ?4,
                start_date = ?5,
                end_date = ?6,
                updated_at = ?7
             WHERE id = ?1
             RETURNING {}",
            MEDICATION_COLUMNS
        ))?;

        let updated = stmt
            .query_row(
                params![
                    id.value(),
                    medication.medication_name,
                    medication.dosage,
                    medication.intake_timing.code(),
                    medication.start_date.map(DateCode::value),
                    medication.end_date.map(DateCode::value),
                    now.to_rfc3339(),
                ],
                medication_from_row,
            )
            .optional()?;
        drop(stmt);
        tx.commit()?;

        tracing::debug!("Updated medication {} (found: {})", id, updated.is_some());
        Ok(updated)
    }

    /// Delete a medication by id
    fn delete_medication(&self, id: MedicationId) -> Result<bool, StorageError> {
        let conn = self.conn()?;
        let rows_affected = conn.execute("DELETE FROM medications WHERE id = ?1", params![id.value()])?;

        tracing::debug!("Deleted medication {} ({} row(s))", id, rows_affected);
        Ok(rows_affected > 0)
    }
}
