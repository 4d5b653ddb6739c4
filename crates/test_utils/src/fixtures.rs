//! Pre-built test fixtures
//!
//! Canonical amounts and dates used across the test suite, chosen to be
//! consistent and predictable.

use chrono::NaiveDate;
use core_kernel::{Money, Period};
use domain_dues::PeriodCharges;
use once_cell::sync::Lazy;

/// Every suite evaluates "today" at the same fixed date
static REFERENCE_DATE: Lazy<NaiveDate> =
    Lazy::new(|| NaiveDate::from_ymd_opt(2025, 6, 15).expect("valid fixture date"));

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    /// The standard monthly flat fee (20.00)
    pub fn flat_fee() -> Money {
        Money::from_minor(2000)
    }

    /// The standard monthly assistance fee (10.00)
    pub fn assistance_fee() -> Money {
        Money::from_minor(1000)
    }

    /// The arrears divisor: one typical month of dues (30.00)
    pub fn average_monthly_due() -> Money {
        Money::from_minor(3000)
    }

    /// A small overpayment credit (10.00)
    pub fn small_credit() -> Money {
        Money::from_minor(1000)
    }

    /// A legacy yearly balance (40.00)
    pub fn legacy_debt() -> Money {
        Money::from_minor(4000)
    }
}

/// Fixture for temporal test data
pub struct PeriodFixtures;

impl PeriodFixtures {
    pub fn january() -> Period {
        Period::new(2025, 1).expect("valid fixture period")
    }

    pub fn february() -> Period {
        Period::new(2025, 2).expect("valid fixture period")
    }

    pub fn march() -> Period {
        Period::new(2025, 3).expect("valid fixture period")
    }

    /// The suite's fixed evaluation date (2025-06-15); the fixture
    /// periods above are all overdue relative to it
    pub fn reference_date() -> NaiveDate {
        *REFERENCE_DATE
    }
}

/// Fixture for period charges
pub struct ChargeFixtures;

impl ChargeFixtures {
    /// Standard charges: 20.00 flat fee + 10.00 assistance fee
    pub fn standard(period: Period) -> PeriodCharges {
        PeriodCharges::new(
            period,
            MoneyFixtures::flat_fee(),
            MoneyFixtures::assistance_fee(),
        )
        .expect("fixture charges are positive")
    }
}
