/// Basic unit tests to verify the domain types
use chrono::NaiveDate;
use condition_journal_mcp::dates::{self, DateCode};
use condition_journal_mcp::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[test]
fn test_clamp_law() {
    assert_eq!(clamp_condition(-1), 0);
    assert_eq!(clamp_condition(0), 0);
    assert_eq!(clamp_condition(137), 137);
    assert_eq!(clamp_condition(200), 200);
    assert_eq!(clamp_condition(201), 200);
    assert_eq!(clamp_condition(i64::MAX), 200);
}

#[test]
fn test_intake_timing_codes_are_stable() {
    let codes: Vec<i64> = IntakeTiming::ALL.iter().map(|t| t.code()).collect();
    assert_eq!(codes, (1..=12).collect::<Vec<_>>());

    assert_eq!(IntakeTiming::from_code(10).unwrap(), IntakeTiming::Bedtime);
    assert_eq!(
        IntakeTiming::from_code(0),
        Err(DomainError::InvalidIntakeTiming(0))
    );
    assert_eq!(serde_json::to_string(&IntakeTiming::AsNeeded).unwrap(), "12");
}

#[test]
fn test_medication_trims_and_requires_name() {
    let med = Medication::new(" Temozolomide ", Some(""), IntakeTiming::Bedtime, None, None)
        .unwrap();
    assert_eq!(med.medication_name, "Temozolomide");
    assert_eq!(med.dosage, None);

    let blank = Medication::new("\t ", None, IntakeTiming::Morning, None, None);
    assert_eq!(blank, Err(DomainError::BlankMedicationName));
}

#[test]
fn test_date_codes() {
    let code = DateCode::from_date(date(2025, 1, 15));
    assert_eq!(code.value(), 20250115);
    assert_eq!(code.to_string(), "2025/01/15");
    assert_eq!(code.to_date(), Some(date(2025, 1, 15)));

    // Stored codes are not checked, display falls back to a dash
    assert_eq!(DateCode(20251301).to_string(), "-");
    assert!(DateCode::parse_checked(20250229).is_err());
    assert!(DateCode::parse_checked(20240229).is_ok());
}

#[test]
fn test_month_bounds_and_past_year() {
    assert_eq!(
        dates::month_bounds("2024-02").unwrap(),
        (date(2024, 2, 1), date(2024, 2, 29))
    );
    assert!(dates::month_bounds("2024").is_err());

    assert_eq!(
        dates::past_year(date(2024, 2, 29)),
        (date(2023, 2, 28), date(2024, 2, 29))
    );
}
