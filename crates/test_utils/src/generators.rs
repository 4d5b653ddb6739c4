//! Property-based test data generators
//!
//! Proptest strategies that produce domain values while maintaining their
//! invariants.

use core_kernel::{Money, Period};
use domain_dues::{DueType, PaymentMethod};
use proptest::prelude::*;

/// Strategy for positive amounts in minor units (one cent to 10,000.00)
pub fn positive_amount_minor_strategy() -> impl Strategy<Value = i64> {
    1i64..1_000_000i64
}

/// Strategy for positive Money values
pub fn positive_money_strategy() -> impl Strategy<Value = Money> {
    positive_amount_minor_strategy().prop_map(Money::from_minor)
}

/// Strategy for Money values including zero
pub fn money_strategy() -> impl Strategy<Value = Money> {
    (0i64..1_000_000i64).prop_map(Money::from_minor)
}

/// Strategy for valid periods between 2020 and 2030
pub fn period_strategy() -> impl Strategy<Value = Period> {
    (2020i32..2030i32, 1u32..=12u32)
        .prop_map(|(year, month)| Period::new(year, month).expect("generated period is valid"))
}

/// Strategy over both due types
pub fn due_type_strategy() -> impl Strategy<Value = DueType> {
    prop_oneof![Just(DueType::FlatFee), Just(DueType::AssistanceFee)]
}

/// Strategy over payment methods
pub fn payment_method_strategy() -> impl Strategy<Value = PaymentMethod> {
    prop_oneof![
        Just(PaymentMethod::BankTransfer),
        Just(PaymentMethod::Check),
        Just(PaymentMethod::Cash),
        Just(PaymentMethod::Card),
    ]
}
