//! PostgreSQL implementation of the ledger store port
//!
//! One commit = one transaction. The member row is locked with
//! `SELECT ... FOR UPDATE` before any write, which serializes concurrent
//! allocation units for the same member across processes; the schema's
//! check constraints back up the invariant check performed here.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::debug;
use uuid::Uuid;

use core_kernel::{CreditId, InitialDebtId, MemberId, Money, ObligationId, Period};
use domain_dues::{
    Credit, CreditStatus, InitialDebt, LedgerError, LedgerStore, Member, MemberBook, Obligation,
    ObligationStatus, Payment, PaymentMethod, Reminder, ReminderChannel, ReminderStatus,
};

use crate::error::DatabaseError;

/// Repository for the dues ledger backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgLedgerStore {
    pool: PgPool,
}

impl PgLedgerStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn fetch_member(&self, id: MemberId) -> Result<Option<Member>, DatabaseError> {
        let row = sqlx::query(
            "SELECT member_id, name, email, active, created_at FROM members WHERE member_id = $1",
        )
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(map_member).transpose()
    }

    async fn fetch_book(&self, member_id: MemberId) -> Result<Option<MemberBook>, DatabaseError> {
        // one repeatable-read transaction gives the aggregation a
        // consistent snapshot across the four row sets
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ")
            .execute(&mut *tx)
            .await?;

        let member_row = sqlx::query(
            "SELECT member_id, name, email, active, created_at FROM members WHERE member_id = $1",
        )
        .bind(*member_id.as_uuid())
        .fetch_optional(&mut *tx)
        .await?;
        let Some(member_row) = member_row else {
            tx.commit().await?;
            return Ok(None);
        };
        let member = map_member(&member_row)?;

        let obligations = sqlx::query(
            "SELECT obligation_id, member_id, due_type, period_year, period_month, \
                    amount_expected, amount_paid, amount_remaining, status, due_date, \
                    created_at, updated_at \
             FROM obligations WHERE member_id = $1 \
             ORDER BY period_year, period_month, created_at",
        )
        .bind(*member_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(map_obligation)
        .collect::<Result<Vec<_>, _>>()?;

        let initial_debts = sqlx::query(
            "SELECT debt_id, member_id, year, amount, amount_paid, amount_remaining, \
                    created_at, updated_at \
             FROM initial_debts WHERE member_id = $1 ORDER BY year",
        )
        .bind(*member_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(map_initial_debt)
        .collect::<Result<Vec<_>, _>>()?;

        let credits = sqlx::query(
            "SELECT credit_id, member_id, amount, amount_used, amount_remaining, status, \
                    created_at, updated_at \
             FROM credits WHERE member_id = $1 ORDER BY created_at",
        )
        .bind(*member_id.as_uuid())
        .fetch_all(&mut *tx)
        .await?
        .iter()
        .map(map_credit)
        .collect::<Result<Vec<_>, _>>()?;

        tx.commit().await?;

        Ok(Some(MemberBook {
            member,
            obligations,
            initial_debts,
            credits,
        }))
    }

    async fn persist_book(
        &self,
        book: &MemberBook,
        payment: Option<&Payment>,
    ) -> Result<bool, DatabaseError> {
        let mut tx = self.pool.begin().await?;

        // serializes concurrent allocation units for this member
        let locked = sqlx::query("SELECT member_id FROM members WHERE member_id = $1 FOR UPDATE")
            .bind(*book.member.id.as_uuid())
            .fetch_optional(&mut *tx)
            .await?;
        if locked.is_none() {
            return Ok(false);
        }

        for o in &book.obligations {
            sqlx::query(
                "INSERT INTO obligations (obligation_id, member_id, due_type, period_year, \
                        period_month, amount_expected, amount_paid, amount_remaining, status, \
                        due_date, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
                 ON CONFLICT (obligation_id) DO UPDATE SET \
                        amount_paid = EXCLUDED.amount_paid, \
                        amount_remaining = EXCLUDED.amount_remaining, \
                        status = EXCLUDED.status, \
                        updated_at = EXCLUDED.updated_at",
            )
            .bind(*o.id.as_uuid())
            .bind(*o.member_id.as_uuid())
            .bind(o.due_type.as_str())
            .bind(o.period.year())
            .bind(o.period.month() as i32)
            .bind(o.amount_expected.to_decimal())
            .bind(o.amount_paid.to_decimal())
            .bind(o.amount_remaining.to_decimal())
            .bind(o.status.as_str())
            .bind(o.due_date)
            .bind(o.created_at)
            .bind(o.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        for d in &book.initial_debts {
            sqlx::query(
                "INSERT INTO initial_debts (debt_id, member_id, year, amount, amount_paid, \
                        amount_remaining, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (debt_id) DO UPDATE SET \
                        amount_paid = EXCLUDED.amount_paid, \
                        amount_remaining = EXCLUDED.amount_remaining, \
                        updated_at = EXCLUDED.updated_at",
            )
            .bind(*d.id.as_uuid())
            .bind(*d.member_id.as_uuid())
            .bind(d.year)
            .bind(d.amount.to_decimal())
            .bind(d.amount_paid.to_decimal())
            .bind(d.amount_remaining.to_decimal())
            .bind(d.created_at)
            .bind(d.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        for c in &book.credits {
            sqlx::query(
                "INSERT INTO credits (credit_id, member_id, amount, amount_used, \
                        amount_remaining, status, created_at, updated_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
                 ON CONFLICT (credit_id) DO UPDATE SET \
                        amount_used = EXCLUDED.amount_used, \
                        amount_remaining = EXCLUDED.amount_remaining, \
                        status = EXCLUDED.status, \
                        updated_at = EXCLUDED.updated_at",
            )
            .bind(*c.id.as_uuid())
            .bind(*c.member_id.as_uuid())
            .bind(c.amount.to_decimal())
            .bind(c.amount_used.to_decimal())
            .bind(c.amount_remaining.to_decimal())
            .bind(c.status.as_str())
            .bind(c.created_at)
            .bind(c.updated_at)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(p) = payment {
            sqlx::query(
                "INSERT INTO payments (payment_id, member_id, obligation_id, amount, method, \
                        paid_on, reference, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8)",
            )
            .bind(*p.id.as_uuid())
            .bind(*p.member_id.as_uuid())
            .bind(p.obligation_id.map(|o| *o.as_uuid()))
            .bind(p.amount.to_decimal())
            .bind(p.method.as_str())
            .bind(p.paid_on)
            .bind(p.reference.clone())
            .bind(p.created_at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!(member = %book.member.id, "book committed");
        Ok(true)
    }
}

#[async_trait]
impl LedgerStore for PgLedgerStore {
    async fn insert_member(&self, member: &Member) -> Result<(), LedgerError> {
        sqlx::query(
            "INSERT INTO members (member_id, name, email, active, created_at) \
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(*member.id.as_uuid())
        .bind(member.name.clone())
        .bind(member.email.clone())
        .bind(member.active)
        .bind(member.created_at)
        .execute(&self.pool)
        .await
        .map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn member(&self, id: MemberId) -> Result<Option<Member>, LedgerError> {
        Ok(self.fetch_member(id).await?)
    }

    async fn active_members(&self) -> Result<Vec<Member>, LedgerError> {
        let rows = sqlx::query(
            "SELECT member_id, name, email, active, created_at FROM members \
             WHERE active ORDER BY created_at",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(DatabaseError::from)?;

        let members = rows
            .iter()
            .map(map_member)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(members)
    }

    async fn load_book(&self, member_id: MemberId) -> Result<MemberBook, LedgerError> {
        self.fetch_book(member_id)
            .await?
            .ok_or_else(|| LedgerError::not_found("member", member_id))
    }

    async fn commit_book(
        &self,
        book: &MemberBook,
        payment: Option<&Payment>,
    ) -> Result<(), LedgerError> {
        book.check_invariants()?;
        let committed = self.persist_book(book, payment).await?;
        if !committed {
            return Err(LedgerError::not_found("member", book.member.id));
        }
        Ok(())
    }

    async fn insert_reminders(&self, reminders: &[Reminder]) -> Result<(), LedgerError> {
        let mut tx = self.pool.begin().await.map_err(DatabaseError::from)?;
        for r in reminders {
            sqlx::query(
                "INSERT INTO reminders (reminder_id, member_id, obligation_id, message, \
                        channel, status, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(*r.id.as_uuid())
            .bind(*r.member_id.as_uuid())
            .bind(*r.obligation_id.as_uuid())
            .bind(r.message.clone())
            .bind(r.channel.as_str())
            .bind(r.status.as_str())
            .bind(r.created_at)
            .execute(&mut *tx)
            .await
            .map_err(DatabaseError::from)?;
        }
        tx.commit().await.map_err(DatabaseError::from)?;
        Ok(())
    }

    async fn ping(&self) -> Result<(), LedgerError> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(DatabaseError::from)?;
        Ok(())
    }
}

fn map_member(row: &PgRow) -> Result<Member, DatabaseError> {
    Ok(Member {
        id: MemberId::from(row.try_get::<Uuid, _>("member_id")?),
        name: row.try_get("name")?,
        email: row.try_get("email")?,
        active: row.try_get("active")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
    })
}

fn map_obligation(row: &PgRow) -> Result<Obligation, DatabaseError> {
    let period = Period::new(
        row.try_get::<i32, _>("period_year")?,
        row.try_get::<i32, _>("period_month")? as u32,
    )
    .map_err(DatabaseError::row_mapping)?;

    Ok(Obligation {
        id: ObligationId::from(row.try_get::<Uuid, _>("obligation_id")?),
        member_id: MemberId::from(row.try_get::<Uuid, _>("member_id")?),
        due_type: parse_column(row, "due_type")?,
        period,
        amount_expected: money_column(row, "amount_expected")?,
        amount_paid: money_column(row, "amount_paid")?,
        amount_remaining: money_column(row, "amount_remaining")?,
        status: parse_column(row, "status")?,
        due_date: row.try_get::<NaiveDate, _>("due_date")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn map_initial_debt(row: &PgRow) -> Result<InitialDebt, DatabaseError> {
    Ok(InitialDebt {
        id: InitialDebtId::from(row.try_get::<Uuid, _>("debt_id")?),
        member_id: MemberId::from(row.try_get::<Uuid, _>("member_id")?),
        year: row.try_get("year")?,
        amount: money_column(row, "amount")?,
        amount_paid: money_column(row, "amount_paid")?,
        amount_remaining: money_column(row, "amount_remaining")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

fn map_credit(row: &PgRow) -> Result<Credit, DatabaseError> {
    Ok(Credit {
        id: CreditId::from(row.try_get::<Uuid, _>("credit_id")?),
        member_id: MemberId::from(row.try_get::<Uuid, _>("member_id")?),
        amount: money_column(row, "amount")?,
        amount_used: money_column(row, "amount_used")?,
        amount_remaining: money_column(row, "amount_remaining")?,
        status: parse_column(row, "status")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
    })
}

/// Reads a NUMERIC column into exact minor units
fn money_column(row: &PgRow, column: &str) -> Result<Money, DatabaseError> {
    let decimal: Decimal = row.try_get(column)?;
    Money::try_from_decimal(decimal).map_err(DatabaseError::row_mapping)
}

/// Reads a TEXT column through the domain type's `FromStr`
fn parse_column<T>(row: &PgRow, column: &str) -> Result<T, DatabaseError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    let raw: String = row.try_get(column)?;
    raw.parse().map_err(DatabaseError::row_mapping)
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_kernel::PaymentId;

    #[test]
    fn enum_storage_forms_round_trip() {
        for (text, status) in [
            ("pending", ObligationStatus::Pending),
            ("partially_paid", ObligationStatus::PartiallyPaid),
            ("paid", ObligationStatus::Paid),
            ("overdue", ObligationStatus::Overdue),
        ] {
            assert_eq!(text.parse::<ObligationStatus>().unwrap(), status);
            assert_eq!(status.as_str(), text);
        }

        assert_eq!("available".parse::<CreditStatus>().unwrap(), CreditStatus::Available);
        assert_eq!("email".parse::<ReminderChannel>().unwrap(), ReminderChannel::Email);
        assert_eq!("queued".parse::<ReminderStatus>().unwrap(), ReminderStatus::Queued);
        assert_eq!(
            "bank_transfer".parse::<PaymentMethod>().unwrap(),
            PaymentMethod::BankTransfer
        );
    }

    #[test]
    fn payment_id_uuid_round_trip() {
        let id = PaymentId::new_v7();
        let uuid: Uuid = id.into();
        assert_eq!(PaymentId::from(uuid), id);
    }
}
