//! Period tests exercised through the public API

use chrono::NaiveDate;
use core_kernel::Period;

#[test]
fn from_date_matches_year_and_month() {
    let date = NaiveDate::from_ymd_opt(2025, 3, 17).unwrap();
    let period = Period::from_date(date);
    assert_eq!(period.year(), 2025);
    assert_eq!(period.month(), 3);
}

#[test]
fn first_and_last_day_bracket_the_month() {
    let period = Period::new(2025, 4).unwrap();
    assert_eq!(period.first_day(), NaiveDate::from_ymd_opt(2025, 4, 1).unwrap());
    assert_eq!(period.last_day(), NaiveDate::from_ymd_opt(2025, 4, 30).unwrap());
}

#[test]
fn serde_uses_the_string_form() {
    let period = Period::new(2025, 12).unwrap();
    let json = serde_json::to_string(&period).unwrap();
    assert_eq!(json, "\"2025-12\"");
    let back: Period = serde_json::from_str(&json).unwrap();
    assert_eq!(back, period);
}

#[test]
fn serde_rejects_invalid_month() {
    let result: Result<Period, _> = serde_json::from_str("\"2025-13\"");
    assert!(result.is_err());
}

#[test]
fn a_year_of_next_calls_returns_to_the_same_month() {
    let mut period = Period::new(2024, 7).unwrap();
    for _ in 0..12 {
        period = period.next();
    }
    assert_eq!(period, Period::new(2025, 7).unwrap());
}
