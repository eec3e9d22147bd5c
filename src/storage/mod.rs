/// Storage layer for persisting journal data
///
/// This module handles all persistence. Two backends implement the same
/// `JournalStore` interface: SQLite (the embedded engine) and a flat
/// key-value JSON store used where no embedded engine is available. The
/// backend is picked once at startup; repository code never branches on it.

pub mod kv;
pub mod migrations;
pub mod sqlite;

// Re-export the main storage types
pub use kv::KvStore;
pub use migrations::{MigrationFailure, SchemaReport};
pub use sqlite::SqliteStore;

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

use crate::domain::{DailyConditionLog, DomainError, Medication, MedicationId};

/// Table (and key-value entity prefix) holding daily condition logs
pub const LOGS_TABLE: &str = "daily_condition_logs";
/// Table (and key-value entity prefix) holding medications
pub const MEDICATIONS_TABLE: &str = "medications";

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Schema migration failed for {table}: {message}")]
    SchemaMigrationFailed { table: String, message: String },

    #[error("Statement failed: {0}")]
    StatementFailed(#[from] rusqlite::Error),

    #[error("Key-value operation failed: {0}")]
    KeyValueFailed(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    Validation(#[from] DomainError),

    #[error("Medication not found: {id}")]
    MedicationNotFound { id: MedicationId },
}

impl StorageError {
    /// Whether this error was caused by bad input rather than the store
    pub fn is_validation(&self) -> bool {
        matches!(self, StorageError::Validation(_))
    }
}

/// Trait defining the persistence interface for the journal
///
/// Every write is a single atomic operation: a failed write leaves the
/// previously persisted state untouched.
pub trait JournalStore: Send + Sync {
    /// Short name of the backend for logging ("sqlite", "key-value")
    fn backend_name(&self) -> &'static str;

    /// Create or additively migrate the schema; idempotent
    fn ensure_schema(&self) -> Result<SchemaReport, StorageError>;

    /// Get the log for a single date
    fn fetch_log(&self, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError>;

    /// Get all persisted logs in `[start, end]`, ascending by date
    fn fetch_logs_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyConditionLog>, StorageError>;

    /// Insert or overwrite the log for `log.recorded_date`
    ///
    /// `created_at` is set only when the row is new; `updated_at` is always
    /// set to `now`. Returns the log as persisted.
    fn upsert_log(
        &self,
        log: &DailyConditionLog,
        now: DateTime<Utc>,
    ) -> Result<DailyConditionLog, StorageError>;

    /// Insert a default-valued log for every date that has none
    ///
    /// Existing rows are never touched. Returns how many rows were inserted.
    fn insert_default_logs(
        &self,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError>;

    /// List all medications, newest first
    fn list_medications(&self) -> Result<Vec<Medication>, StorageError>;

    /// Insert a new medication and return it with its assigned id
    fn insert_medication(
        &self,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Medication, StorageError>;

    /// Overwrite the mutable fields of medication `id`
    ///
    /// Returns the medication as persisted, or `None` when no medication has
    /// that id. Other stored medications are never read.
    fn update_medication(
        &self,
        id: MedicationId,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Option<Medication>, StorageError>;

    /// Delete medication `id`, returning whether a row was removed
    fn delete_medication(&self, id: MedicationId) -> Result<bool, StorageError>;
}

/// Which backend to open
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum BackendKind {
    /// SQLite when it can be opened, the key-value file otherwise
    #[default]
    Auto,
    /// SQLite only
    Sqlite,
    /// Key-value JSON file only
    Kv,
}

/// Where and how to open the store
#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub backend: BackendKind,
    /// SQLite database path; the key-value fallback lives next to it
    pub path: PathBuf,
}

impl StoreConfig {
    pub fn new(backend: BackendKind, path: impl Into<PathBuf>) -> Self {
        Self {
            backend,
            path: path.into(),
        }
    }

    /// Path of the key-value file for this configuration
    ///
    /// With `--backend kv` the configured path is used as-is; otherwise the
    /// fallback file sits beside the database with a `.json` extension.
    pub fn kv_path(&self) -> PathBuf {
        match self.backend {
            BackendKind::Kv => self.path.clone(),
            _ => self.path.with_extension("json"),
        }
    }
}

/// The store selected at startup
///
/// An explicit, owned instance handed to repositories; there is no global
/// connection.
pub enum StoreBackend {
    Sqlite(SqliteStore),
    KeyValue(KvStore),
}

impl StoreBackend {
    /// Open the configured backend and bring its schema up to date
    pub fn open(config: &StoreConfig) -> Result<Self, StorageError> {
        match config.backend {
            BackendKind::Sqlite => Ok(Self::Sqlite(SqliteStore::open(&config.path)?)),
            BackendKind::Kv => Ok(Self::KeyValue(KvStore::open(config.kv_path())?)),
            BackendKind::Auto => match SqliteStore::open(&config.path) {
                Ok(store) => Ok(Self::Sqlite(store)),
                Err(StorageError::StoreUnavailable(reason)) => {
                    let kv_path = config.kv_path();
                    tracing::warn!(
                        "SQLite unavailable ({}), falling back to key-value store at {}",
                        reason,
                        kv_path.display()
                    );
                    Ok(Self::KeyValue(KvStore::open(kv_path)?))
                }
                Err(e) => Err(e),
            },
        }
    }

    /// Path-only convenience for the default (auto) selection
    pub fn open_path(path: &Path) -> Result<Self, StorageError> {
        Self::open(&StoreConfig::new(BackendKind::Auto, path))
    }

    fn inner(&self) -> &dyn JournalStore {
        match self {
            StoreBackend::Sqlite(store) => store,
            StoreBackend::KeyValue(store) => store,
        }
    }
}

impl JournalStore for StoreBackend {
    fn backend_name(&self) -> &'static str {
        self.inner().backend_name()
    }

    fn ensure_schema(&self) -> Result<SchemaReport, StorageError> {
        self.inner().ensure_schema()
    }

    fn fetch_log(&self, date: NaiveDate) -> Result<Option<DailyConditionLog>, StorageError> {
        self.inner().fetch_log(date)
    }

    fn fetch_logs_between(
        &self,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<DailyConditionLog>, StorageError> {
        self.inner().fetch_logs_between(start, end)
    }

    fn upsert_log(
        &self,
        log: &DailyConditionLog,
        now: DateTime<Utc>,
    ) -> Result<DailyConditionLog, StorageError> {
        self.inner().upsert_log(log, now)
    }

    fn insert_default_logs(
        &self,
        dates: &[NaiveDate],
        now: DateTime<Utc>,
    ) -> Result<usize, StorageError> {
        self.inner().insert_default_logs(dates, now)
    }

    fn list_medications(&self) -> Result<Vec<Medication>, StorageError> {
        self.inner().list_medications()
    }

    fn insert_medication(
        &self,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Medication, StorageError> {
        self.inner().insert_medication(medication, now)
    }

    fn update_medication(
        &self,
        id: MedicationId,
        medication: &Medication,
        now: DateTime<Utc>,
    ) -> Result<Option<Medication>, StorageError> {
        self.inner().update_medication(id, medication, now)
    }

    fn delete_medication(&self, id: MedicationId) -> Result<bool, StorageError> {
        self.inner().delete_medication(id)
    }
}
