/// Repository properties that must hold on every backend
///
/// Each property is written once against `&dyn JournalStore` and run for
/// both the SQLite and the key-value store.
use chrono::NaiveDate;
use condition_journal_mcp::*;
use tempfile::TempDir;

fn date(s: &str) -> NaiveDate {
    dates::parse_iso_date(s).unwrap()
}

/// Open one store of each kind in a fresh directory
fn stores() -> (TempDir, Vec<StoreBackend>) {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let sqlite = StoreBackend::open(&StoreConfig::new(
        BackendKind::Sqlite,
        dir.path().join("journal.db"),
    ))
    .expect("Failed to open SQLite store");
    let kv = StoreBackend::open(&StoreConfig::new(
        BackendKind::Kv,
        dir.path().join("journal.json"),
    ))
    .expect("Failed to open key-value store");
    (dir, vec![sqlite, kv])
}

fn for_each_backend(check: impl Fn(&dyn JournalStore)) {
    let (_dir, stores) = stores();
    for store in &stores {
        check(store);
    }
}

#[test]
fn test_upsert_is_idempotent() {
    for_each_backend(|store| {
        let repo = DailyLogRepository::new(store);
        let mut log = DailyConditionLog::new(date("2025-01-15"));
        log.seizure_level = 3;
        log.memo = Some("aura before lunch".to_string());

        let first = repo.upsert(log.clone()).unwrap();
        let second = repo.upsert(log.clone()).unwrap();

        let range = repo.get_range(date("2025-01-01"), date("2025-01-31")).unwrap();
        assert_eq!(range.len(), 1, "{}", store.backend_name());

        let stored = repo.get(date("2025-01-15")).unwrap();
        assert!(stored.same_content(&log));
        assert_eq!(second.created_at, first.created_at);
        assert!(second.updated_at >= first.updated_at);
    });
}

#[test]
fn test_last_write_wins() {
    for_each_backend(|store| {
        let repo = DailyLogRepository::new(store);
        let day = date("2025-03-02");

        repo.upsert(DailyConditionLog {
            headache_level: 1,
            blood_pressure_systolic: Some(150),
            ..DailyConditionLog::new(day)
        })
        .unwrap();
        repo.upsert(DailyConditionLog {
            headache_level: 4,
            ..DailyConditionLog::new(day)
        })
        .unwrap();

        let stored = repo.get(day).unwrap();
        assert_eq!(stored.headache_level, 4);
        assert_eq!(stored.blood_pressure_systolic, None, "{}", store.backend_name());
    });
}

#[test]
fn test_range_returns_exactly_persisted_dates() {
    for_each_backend(|store| {
        let repo = DailyLogRepository::new(store);
        for day in ["2024-12-31", "2025-01-01", "2025-01-20", "2025-01-31", "2025-02-01"] {
            repo.upsert(DailyConditionLog::new(date(day))).unwrap();
        }

        let range = repo.get_range(date("2025-01-01"), date("2025-01-31")).unwrap();
        let keys: Vec<_> = range.keys().copied().collect();
        assert_eq!(
            keys,
            vec![date("2025-01-01"), date("2025-01-20"), date("2025-01-31")],
            "{}",
            store.backend_name()
        );

        let single = repo.get_range(date("2025-01-20"), date("2025-01-20")).unwrap();
        assert_eq!(single.len(), 1);
    });
}

#[test]
fn test_scores_are_clamped_on_save() {
    for_each_backend(|store| {
        let repo = DailyLogRepository::new(store);
        let saved = repo
            .upsert(DailyConditionLog {
                physical_condition: 500,
                mental_condition: -20,
                ..DailyConditionLog::new(date("2025-01-15"))
            })
            .unwrap();
        assert_eq!(saved.condition_scores(), [200, 0]);
        assert_eq!(repo.get(date("2025-01-15")).unwrap().condition_scores(), [200, 0]);
    });
}

#[test]
fn test_backfill_never_overwrites() {
    for_each_backend(|store| {
        let repo = DailyLogRepository::new(store);
        let edited = DailyConditionLog {
            memory_impairment_level: 2,
            mental_condition: 60,
            ..DailyConditionLog::new(date("2025-01-03"))
        };
        repo.upsert(edited.clone()).unwrap();

        let inserted = repo
            .ensure_defaults_for_range(date("2025-01-01"), date("2025-01-05"))
            .unwrap();
        assert_eq!(inserted, 4, "{}", store.backend_name());

        assert!(repo.get(date("2025-01-03")).unwrap().same_content(&edited));
        assert!(repo.get(date("2025-01-04")).unwrap().is_default());

        let again = repo
            .ensure_defaults_for_range(date("2025-01-01"), date("2025-01-05"))
            .unwrap();
        assert_eq!(again, 0);
    });
}

#[test]
fn test_medication_crud_round_trip() {
    for_each_backend(|store| {
        let repo = MedicationRepository::new(store);

        let saved = repo
            .save(
                Medication::new(
                    "Levetiracetam",
                    Some("500mg"),
                    IntakeTiming::AfterBreakfast,
                    Some(dates::DateCode(20250101)),
                    Some(dates::DateCode(20241231)),
                )
                .unwrap(),
            )
            .unwrap();
        let id = saved.id.unwrap();

        let listed = repo.list().unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].medication_name, "Levetiracetam");
        assert_eq!(listed[0].dosage.as_deref(), Some("500mg"));
        assert_eq!(listed[0].intake_timing, IntakeTiming::AfterBreakfast);
        // End before start is stored as given
        assert_eq!(listed[0].end_date, Some(dates::DateCode(20241231)));

        let mut edited = listed[0].clone();
        edited.intake_timing = IntakeTiming::AsNeeded;
        edited.medication_name = "  Keppra ".to_string();
        let updated = repo.save(edited).unwrap();
        assert_eq!(updated.id, Some(id));
        assert_eq!(updated.medication_name, "Keppra");

        repo.delete(id).unwrap();
        assert!(repo.list().unwrap().is_empty(), "{}", store.backend_name());
    });
}

#[test]
fn test_schema_check_is_idempotent() {
    for_each_backend(|store| {
        let first = store.ensure_schema().unwrap();
        let second = store.ensure_schema().unwrap();
        assert!(first.failures.is_empty());
        assert!(second.is_noop(), "{}", store.backend_name());
    });
}

#[test]
fn test_data_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();

    for backend in [BackendKind::Sqlite, BackendKind::Kv] {
        let config = StoreConfig::new(backend, dir.path().join(format!("{:?}.store", backend)));

        {
            let store = StoreBackend::open(&config).unwrap();
            DailyLogRepository::new(&store)
                .upsert(DailyConditionLog {
                    blood_pressure_diastolic: Some(82),
                    ..DailyConditionLog::new(date("2025-05-05"))
                })
                .unwrap();
        }

        let store = StoreBackend::open(&config).unwrap();
        let log = DailyLogRepository::new(&store).get(date("2025-05-05")).unwrap();
        assert_eq!(log.blood_pressure_diastolic, Some(82));
        assert_eq!(log.blood_pressure_systolic, None);
    }
}
