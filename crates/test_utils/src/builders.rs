//! Test data builders
//!
//! Builders with sensible defaults so tests specify only the fields they
//! care about.

use chrono::{Duration, NaiveDate};
use core_kernel::{MemberId, Money, Period};
use fake::faker::name::en::Name;
use fake::Fake;

use domain_dues::{Credit, DueType, InitialDebt, Member, MemberBook, Obligation};

use crate::fixtures::{MoneyFixtures, PeriodFixtures};

/// Builder for test members
pub struct MemberBuilder {
    name: Option<String>,
    email: Option<String>,
    active: bool,
}

impl Default for MemberBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberBuilder {
    pub fn new() -> Self {
        Self {
            name: None,
            email: None,
            active: true,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn inactive(mut self) -> Self {
        self.active = false;
        self
    }

    pub fn build(self) -> Member {
        let name = self.name.unwrap_or_else(|| Name().fake());
        let mut member = Member::new(name);
        if let Some(email) = self.email {
            member = member.with_email(email);
        }
        if !self.active {
            member = member.deactivated();
        }
        member
    }
}

/// Builder for test obligations
pub struct ObligationBuilder {
    member_id: MemberId,
    due_type: DueType,
    period: Period,
    amount: Money,
    as_of: NaiveDate,
}

impl ObligationBuilder {
    pub fn for_member(member_id: MemberId) -> Self {
        Self {
            member_id,
            due_type: DueType::FlatFee,
            period: PeriodFixtures::january(),
            amount: MoneyFixtures::flat_fee(),
            as_of: PeriodFixtures::reference_date(),
        }
    }

    pub fn assistance_fee(mut self) -> Self {
        self.due_type = DueType::AssistanceFee;
        self.amount = MoneyFixtures::assistance_fee();
        self
    }

    pub fn in_period(mut self, period: Period) -> Self {
        self.period = period;
        self
    }

    pub fn expecting(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn seen_at(mut self, as_of: NaiveDate) -> Self {
        self.as_of = as_of;
        self
    }

    pub fn build(self) -> Obligation {
        Obligation::new(
            self.member_id,
            self.due_type,
            self.period,
            self.amount,
            self.as_of,
        )
    }
}

/// Builder for test credits; age shifts `created_at` backwards so FIFO
/// order is controllable
pub struct CreditBuilder {
    member_id: MemberId,
    amount: Money,
    age_hours: i64,
}

impl CreditBuilder {
    pub fn for_member(member_id: MemberId) -> Self {
        Self {
            member_id,
            amount: MoneyFixtures::small_credit(),
            age_hours: 0,
        }
    }

    pub fn of(mut self, amount: Money) -> Self {
        self.amount = amount;
        self
    }

    pub fn aged_hours(mut self, hours: i64) -> Self {
        self.age_hours = hours;
        self
    }

    pub fn build(self) -> Credit {
        let mut credit = Credit::new(self.member_id, self.amount);
        credit.created_at = credit.created_at - Duration::hours(self.age_hours);
        credit
    }
}

/// Builder for a complete member book
pub struct MemberBookBuilder {
    member: Member,
    obligations: Vec<Obligation>,
    initial_debts: Vec<InitialDebt>,
    credits: Vec<Credit>,
}

impl Default for MemberBookBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl MemberBookBuilder {
    pub fn new() -> Self {
        Self {
            member: MemberBuilder::new().build(),
            obligations: Vec::new(),
            initial_debts: Vec::new(),
            credits: Vec::new(),
        }
    }

    pub fn with_member(mut self, member: Member) -> Self {
        self.member = member;
        self
    }

    pub fn member_id(&self) -> MemberId {
        self.member.id
    }

    pub fn with_obligation(mut self, obligation: Obligation) -> Self {
        self.obligations.push(obligation);
        self
    }

    /// Adds an unpaid flat-fee obligation for the period
    pub fn owing_month(mut self, period: Period) -> Self {
        self.obligations.push(
            ObligationBuilder::for_member(self.member.id)
                .in_period(period)
                .build(),
        );
        self
    }

    pub fn with_initial_debt(mut self, year: i32, amount: Money) -> Self {
        self.initial_debts
            .push(InitialDebt::new(self.member.id, year, amount));
        self
    }

    pub fn with_credit(mut self, credit: Credit) -> Self {
        self.credits.push(credit);
        self
    }

    pub fn build(self) -> MemberBook {
        MemberBook {
            member: self.member,
            obligations: self.obligations,
            initial_debts: self.initial_debts,
            credits: self.credits,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn built_book_satisfies_the_ledger_invariants() {
        let book = MemberBookBuilder::new()
            .owing_month(PeriodFixtures::january())
            .owing_month(PeriodFixtures::february())
            .with_initial_debt(2022, MoneyFixtures::legacy_debt())
            .build();

        book.check_invariants().unwrap();
        assert_eq!(book.obligations.len(), 2);
    }

    #[test]
    fn aged_credits_order_before_fresh_ones() {
        let member = MemberBuilder::new().with_name("FIFO").build();
        let old = CreditBuilder::for_member(member.id).aged_hours(48).build();
        let new = CreditBuilder::for_member(member.id).build();

        let book = MemberBookBuilder::new()
            .with_member(member)
            .with_credit(new.clone())
            .with_credit(old.clone())
            .build();

        assert_eq!(book.available_credit_ids(), vec![old.id, new.id]);
    }
}
