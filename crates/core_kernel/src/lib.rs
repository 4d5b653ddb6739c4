//! Core Kernel - Foundational types for the membership system
//!
//! This crate provides the building blocks shared by every domain module:
//! - Money with exact minor-unit arithmetic
//! - Period, the structured year-month used by recurring dues
//! - Strongly-typed identifiers

pub mod identifiers;
pub mod money;
pub mod period;

pub use identifiers::{
    CreditId, InitialDebtId, MemberId, ObligationId, PaymentId, ReminderId,
};
pub use money::{Money, MoneyError};
pub use period::{Period, PeriodError};
