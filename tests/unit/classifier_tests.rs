/// Status classification boundary cases
use chrono::NaiveDate;
use condition_journal_mcp::*;

fn log(levels: [u8; 6], physical: i32, mental: i32) -> DailyConditionLog {
    DailyConditionLog {
        headache_level: levels[0],
        seizure_level: levels[1],
        right_side_level: levels[2],
        left_side_level: levels[3],
        speech_impairment_level: levels[4],
        memory_impairment_level: levels[5],
        physical_condition: physical,
        mental_condition: mental,
        ..DailyConditionLog::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap())
    }
}

#[test]
fn test_default_log_is_good() {
    let default = DailyConditionLog::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap());
    assert_eq!(classify(&default), DayStatus::Good);
}

#[test]
fn test_boundary_table() {
    let cases = [
        ([5, 5, 5, 5, 5, 5], 100, 100, DayStatus::Good),
        ([5, 5, 5, 5, 5, 5], 200, 200, DayStatus::Good),
        ([5, 5, 5, 5, 5, 5], 99, 100, DayStatus::Caution),
        ([5, 5, 5, 5, 5, 5], 100, 50, DayStatus::Caution),
        ([5, 5, 5, 5, 5, 5], 49, 49, DayStatus::Poor),
        ([3, 3, 3, 3, 3, 3], 0, 0, DayStatus::Caution),
        ([4, 4, 4, 4, 4, 4], 200, 200, DayStatus::Caution),
        ([4, 4, 4, 4, 4, 5], 200, 200, DayStatus::Poor),
        ([1, 5, 5, 5, 5, 5], 200, 200, DayStatus::Poor),
        ([2, 2, 2, 2, 2, 2], 75, 0, DayStatus::Caution),
    ];

    for (levels, physical, mental, expected) in cases {
        assert_eq!(
            classify(&log(levels, physical, mental)),
            expected,
            "levels {:?}, scores {}/{}",
            levels,
            physical,
            mental
        );
    }
}

#[test]
fn test_no_log_classifies_as_poor() {
    assert_eq!(classify_day(None), DayStatus::Poor);
}

#[test]
fn test_status_serializes_lowercase() {
    assert_eq!(serde_json::to_string(&DayStatus::Caution).unwrap(), "\"caution\"");
    assert_eq!(DayStatus::Poor.as_str(), "poor");
}
