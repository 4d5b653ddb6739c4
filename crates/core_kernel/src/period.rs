//! Period, the structured year-month of a recurring due
//!
//! The membership ledger charges dues per civil month. Periods replace
//! the string-encoded `"2025-03"` form at every internal seam; the string
//! form survives only at I/O boundaries (API payloads, storage columns
//! keep the two integers).

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors related to period handling
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PeriodError {
    #[error("month {0} is out of range (1-12)")]
    InvalidMonth(u32),

    #[error("year {0} is out of range")]
    InvalidYear(i32),

    #[error("cannot parse period from {0:?}, expected YYYY-MM")]
    Unparseable(String),
}

/// A civil year-month, the billing unit for recurring obligations
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Period {
    year: i32,
    month: u32,
}

impl Period {
    /// Creates a validated period
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        if !(1900..=9999).contains(&year) {
            return Err(PeriodError::InvalidYear(year));
        }
        Ok(Self { year, month })
    }

    /// The period a given calendar date falls in
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the period
    pub fn first_day(&self) -> NaiveDate {
        // month is validated on construction
        NaiveDate::from_ymd_opt(self.year, self.month, 1).expect("validated period")
    }

    /// Last calendar day of the period; obligations fall due on this day
    pub fn last_day(&self) -> NaiveDate {
        self.next()
            .first_day()
            .pred_opt()
            .expect("valid predecessor of a month start")
    }

    /// The following period, rolling over the year boundary
    pub fn next(&self) -> Period {
        if self.month == 12 {
            Period {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Period {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for Period {
    type Err = PeriodError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (year, month) = s
            .split_once('-')
            .ok_or_else(|| PeriodError::Unparseable(s.to_string()))?;
        let year: i32 = year
            .parse()
            .map_err(|_| PeriodError::Unparseable(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| PeriodError::Unparseable(s.to_string()))?;
        Period::new(year, month)
    }
}

impl Serialize for Period {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Period {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}
