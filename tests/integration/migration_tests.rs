/// Opening stores written by older versions
use condition_journal_mcp::*;
use rusqlite::Connection;

fn date(s: &str) -> chrono::NaiveDate {
    dates::parse_iso_date(s).unwrap()
}

#[test]
fn test_old_sqlite_database_gains_columns_without_losing_rows() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("journal.db");

    {
        let conn = Connection::open(&db_path).unwrap();
        conn.execute_batch(
            "CREATE TABLE daily_condition_logs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                recorded_date TEXT NOT NULL,
                memo TEXT,
                headache_level INTEGER NOT NULL DEFAULT 5,
                seizure_level INTEGER NOT NULL DEFAULT 5,
                speech_impairment_level INTEGER NOT NULL DEFAULT 5,
                memory_impairment_level INTEGER NOT NULL DEFAULT 5,
                physical_condition INTEGER NOT NULL DEFAULT 100,
                mental_condition INTEGER NOT NULL DEFAULT 100,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            CREATE TABLE medications (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                medication_name TEXT NOT NULL,
                intake_timing INTEGER NOT NULL DEFAULT 1,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            INSERT INTO daily_condition_logs
                (recorded_date, memo, headache_level, physical_condition, created_at, updated_at)
            VALUES
                ('2024-11-02', 'first week after surgery', 2, 60,
                 '2024-11-02T08:00:00+00:00', '2024-11-02T08:00:00+00:00');
            INSERT INTO medications (medication_name, intake_timing, created_at, updated_at)
            VALUES ('Dexamethasone', 3, '2024-11-01T08:00:00+00:00', '2024-11-01T08:00:00+00:00');",
        )
        .unwrap();
    }

    let store = StoreBackend::open(&StoreConfig::new(BackendKind::Sqlite, &db_path)).unwrap();

    let log = DailyLogRepository::new(&store).get(date("2024-11-02")).unwrap();
    assert_eq!(log.memo.as_deref(), Some("first week after surgery"));
    assert_eq!(log.headache_level, 2);
    assert_eq!(log.right_side_level, 5);
    assert_eq!(log.physical_condition, 60);
    assert_eq!(log.blood_pressure_systolic, None);

    let medications = MedicationRepository::new(&store).list().unwrap();
    assert_eq!(medications.len(), 1);
    assert_eq!(medications[0].dosage, None);
    assert_eq!(medications[0].start_date, None);

    // New fields can be written once the columns exist
    let saved = DailyLogRepository::new(&store)
        .upsert(DailyConditionLog {
            blood_pressure_systolic: Some(118),
            ..log
        })
        .unwrap();
    assert_eq!(saved.blood_pressure_systolic, Some(118));
    assert_eq!(
        saved.created_at.unwrap().to_rfc3339(),
        "2024-11-02T08:00:00+00:00"
    );

    // A second open changes nothing
    assert!(store.ensure_schema().unwrap().is_noop());
}

#[test]
fn test_key_value_store_reads_snake_case_blobs() {
    let dir = tempfile::tempdir().unwrap();
    let kv_path = dir.path().join("journal.json");

    let blobs = serde_json::json!({
        "daily_condition_logs:2024-10-10": serde_json::json!({
            "recorded_date": "2024-10-10",
            "seizure_level": 1,
            "mental_condition": 45
        }).to_string(),
        "medications:4": serde_json::json!({
            "id": 4,
            "medication_name": "Temozolomide",
            "dosage": "140mg",
            "intake_timing": 10,
            "start_date": 20241001
        }).to_string()
    });
    std::fs::write(&kv_path, blobs.to_string()).unwrap();

    let store = KvStore::open(&kv_path).unwrap();

    let log = DailyLogRepository::new(&store).get(date("2024-10-10")).unwrap();
    assert_eq!(log.seizure_level, 1);
    assert_eq!(log.headache_level, 5);
    assert_eq!(log.mental_condition, 45);
    assert_eq!(classify(&log), DayStatus::Poor);

    let medications = MedicationRepository::new(&store).list().unwrap();
    assert_eq!(medications[0].id, Some(MedicationId(4)));
    assert_eq!(medications[0].intake_timing, IntakeTiming::Bedtime);

    // Opening rewrote the records with current field names
    let raw = store.raw_entry("medications:4").unwrap().unwrap();
    assert!(raw.contains("\"medicationName\""));

    // New ids continue after the legacy record
    let added = MedicationRepository::new(&store)
        .save(Medication::new("Ondansetron", None, IntakeTiming::AsNeeded, None, None).unwrap())
        .unwrap();
    assert_eq!(added.id, Some(MedicationId(5)));
}

#[test]
fn test_auto_backend_falls_back_to_key_value_file() {
    let dir = tempfile::tempdir().unwrap();
    let blocked = dir.path().join("journal.db");
    std::fs::create_dir_all(&blocked).unwrap();

    let server = JournalServer::new(StoreConfig::new(BackendKind::Auto, &blocked)).unwrap();
    assert_eq!(server.storage().backend_name(), "key-value");

    DailyLogRepository::new(server.storage())
        .upsert(DailyConditionLog::new(date("2025-01-01")))
        .unwrap();
    assert!(dir.path().join("journal.json").exists());
}
