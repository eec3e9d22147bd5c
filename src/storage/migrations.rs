/// Database schema management
///
/// This module creates the SQLite tables and additively migrates databases
/// created by older versions. Columns are only ever added, never removed,
/// so migrating forward can't destroy user data and no down-migration
/// exists.

use std::collections::BTreeSet;

use rusqlite::Connection;
use serde::Serialize;

use crate::storage::{StorageError, LOGS_TABLE, MEDICATIONS_TABLE};

/// A column introduced after the first released schema
struct AdditiveColumn {
    table: &'static str,
    column: &'static str,
    definition: &'static str,
}

/// Columns older databases may be missing, in the order they were introduced
const ADDITIVE_COLUMNS: &[AdditiveColumn] = &[
    // Older installs tracked hand and leg separately
    AdditiveColumn {
        table: LOGS_TABLE,
        column: "right_side_level",
        definition: "INTEGER NOT NULL DEFAULT 5",
    },
    AdditiveColumn {
        table: LOGS_TABLE,
        column: "left_side_level",
        definition: "INTEGER NOT NULL DEFAULT 5",
    },
    AdditiveColumn {
        table: LOGS_TABLE,
        column: "blood_pressure_systolic",
        definition: "INTEGER",
    },
    AdditiveColumn {
        table: LOGS_TABLE,
        column: "blood_pressure_diastolic",
        definition: "INTEGER",
    },
    AdditiveColumn {
        table: MEDICATIONS_TABLE,
        column: "dosage",
        definition: "TEXT",
    },
    AdditiveColumn {
        table: MEDICATIONS_TABLE,
        column: "start_date",
        definition: "INTEGER",
    },
    AdditiveColumn {
        table: MEDICATIONS_TABLE,
        column: "end_date",
        definition: "INTEGER",
    },
];

/// A migration step that failed for a reason other than "already applied"
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigrationFailure {
    pub table: String,
    pub column: String,
    pub message: String,
}

/// What a schema check changed
///
/// Non-fatal failures are collected here for diagnostics; the store keeps
/// working with whatever shape the database has.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SchemaReport {
    /// `table.column` for each column added by this run
    pub added_columns: Vec<String>,
    /// Legacy key-value records rewritten to the current field names
    pub rewritten_records: usize,
    pub failures: Vec<MigrationFailure>,
}

impl SchemaReport {
    /// True when the database was already at the latest shape
    pub fn is_noop(&self) -> bool {
        self.added_columns.is_empty() && self.rewritten_records == 0 && self.failures.is_empty()
    }
}

/// Create both tables if absent and add any missing columns
///
/// Safe to call on every access. Each additive column is attempted
/// independently; one failure does not stop the others.
pub fn ensure_schema(conn: &Connection) -> Result<SchemaReport, StorageError> {
    create_tables(conn)?;

    let mut report = SchemaReport::default();

    for table in [LOGS_TABLE, MEDICATIONS_TABLE] {
        let existing = table_columns(conn, table)?;

        for column in ADDITIVE_COLUMNS
            .iter()
            .filter(|c| c.table == table && !existing.contains(c.column))
        {
            match add_column(conn, column) {
                Ok(()) => {
                    tracing::info!("Added column {}.{}", column.table, column.column);
                    report
                        .added_columns
                        .push(format!("{}.{}", column.table, column.column));
                }
                Err(e) if is_duplicate_column(&e) => {
                    tracing::debug!("Column {}.{} already exists", column.table, column.column);
                }
                Err(e) => {
                    tracing::warn!(
                        "Could not add column {}.{}: {}",
                        column.table,
                        column.column,
                        e
                    );
                    report.failures.push(MigrationFailure {
                        table: column.table.to_string(),
                        column: column.column.to_string(),
                        message: e.to_string(),
                    });
                }
            }
        }
    }

    create_indexes(conn, &mut report);

    Ok(report)
}

/// Create the tables with the current column set
fn create_tables(conn: &Connection) -> Result<(), StorageError> {
    conn.execute(
        "CREATE TABLE IF NOT EXISTS daily_condition_logs (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_date TEXT NOT NULL,
            memo TEXT,
            headache_level INTEGER NOT NULL DEFAULT 5,
            seizure_level INTEGER NOT NULL DEFAULT 5,
            right_side_level INTEGER NOT NULL DEFAULT 5,
            left_side_level INTEGER NOT NULL DEFAULT 5,
            speech_impairment_level INTEGER NOT NULL DEFAULT 5,
            memory_impairment_level INTEGER NOT NULL DEFAULT 5,
            physical_condition INTEGER NOT NULL DEFAULT 100,
            mental_condition INTEGER NOT NULL DEFAULT 100,
            blood_pressure_systolic INTEGER,
            blood_pressure_diastolic INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_failed(LOGS_TABLE, e))?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS medications (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            medication_name TEXT NOT NULL,
            dosage TEXT,
            intake_timing INTEGER NOT NULL DEFAULT 1,
            start_date INTEGER,
            end_date INTEGER,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        [],
    )
    .map_err(|e| migration_failed(MEDICATIONS_TABLE, e))?;

    Ok(())
}

/// Create indexes; failures are recorded, not fatal
///
/// The unique index on `recorded_date` is what makes upserts work. An old
/// database holding duplicate dates can't get it; that is reported and
/// writes for such a database fail until the duplicates are resolved.
fn create_indexes(conn: &Connection, report: &mut SchemaReport) {
    let result = conn.execute(
        "CREATE UNIQUE INDEX IF NOT EXISTS idx_daily_condition_logs_recorded_date
         ON daily_condition_logs (recorded_date)",
        [],
    );

    if let Err(e) = result {
        tracing::warn!("Could not create unique index on recorded_date: {}", e);
        report.failures.push(MigrationFailure {
            table: LOGS_TABLE.to_string(),
            column: "recorded_date".to_string(),
            message: e.to_string(),
        });
    }
}

/// Names of the columns currently installed in `table`
fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>, StorageError> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({})", table))
        .map_err(|e| migration_failed(table, e))?;

    let names = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .and_then(|rows| rows.collect::<rusqlite::Result<BTreeSet<_>>>())
        .map_err(|e| migration_failed(table, e))?;

    Ok(names)
}

fn add_column(conn: &Connection, column: &AdditiveColumn) -> rusqlite::Result<()> {
    conn.execute(
        &format!(
            "ALTER TABLE {} ADD COLUMN {} {}",
            column.table, column.column, column.definition
        ),
        [],
    )?;
    Ok(())
}

fn is_duplicate_column(error: &rusqlite::Error) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(_, Some(message)) if message.contains("duplicate column name")
    )
}

fn migration_failed(table: &str, error: rusqlite::Error) -> StorageError {
    StorageError::SchemaMigrationFailed {
        table: table.to_string(),
        message: error.to_string(),
    }
}
