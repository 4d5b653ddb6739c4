//! End-to-end tests for the dues ledger, driven through the service
//! against the in-memory store

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use core_kernel::{Money, Period};

use domain_dues::{
    DueType, DuesConfig, DuesService, LedgerError, LedgerStore, LogNotifier, Member,
    MemoryStore, NotificationSender, NotifyError, ObligationStatus, PaymentMethod,
    PeriodCharges, RecordPayment,
};

fn service(store: Arc<MemoryStore>) -> DuesService {
    DuesService::new(store, Arc::new(LogNotifier), DuesConfig::default())
}

fn money(s: &str) -> Money {
    s.parse().unwrap()
}

/// Registers a member and generates one period of obligations
/// (flat fee 20.00, assistance fee 10.00)
async fn member_with_period(svc: &DuesService, period: Period) -> Member {
    let member = svc.register_member(Member::new("Marie Curie")).await.unwrap();
    svc.generate_monthly_obligations(
        PeriodCharges::new(period, money("20.00"), money("10.00")).unwrap(),
    )
    .await
    .unwrap();
    member
}

fn payment(member: &Member, amount: &str) -> RecordPayment {
    RecordPayment {
        member_id: member.id,
        due_type: DueType::FlatFee,
        amount: money(amount),
        method: PaymentMethod::BankTransfer,
        paid_on: Utc::now().date_naive(),
        reference: None,
    }
}

mod settlement {
    use super::*;

    #[tokio::test]
    async fn simple_settle_pays_in_full_without_credit() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;

        let receipt = svc.record_manual_payment(payment(&member, "20.00")).await.unwrap();

        assert_eq!(receipt.outcome.obligation.status, ObligationStatus::Paid);
        assert!(receipt.outcome.obligation.amount_remaining.is_zero());
        assert!(receipt.outcome.credit_created.is_none());
        assert_eq!(store.payments().len(), 1);
        assert_eq!(store.payments()[0].amount, money("20.00"));
    }

    #[tokio::test]
    async fn overpay_creates_exactly_one_credit_for_the_surplus() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;

        let receipt = svc.record_manual_payment(payment(&member, "35.00")).await.unwrap();

        assert_eq!(receipt.outcome.obligation.status, ObligationStatus::Paid);
        let credit = receipt.outcome.credit_created.unwrap();
        assert_eq!(credit.amount_remaining, money("15.00"));
        assert!(credit.is_available());

        let book = store.load_book(member.id).await.unwrap();
        assert_eq!(book.credits.len(), 1);
        book.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn existing_credit_is_swept_before_the_payment() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = svc.register_member(Member::new("Louis Pasteur")).await.unwrap();

        // a January overpayment leaves a 10.00 credit
        svc.generate_monthly_obligations(
            PeriodCharges::new(Period::new(2025, 1).unwrap(), money("30.00"), money("10.00"))
                .unwrap(),
        )
        .await
        .unwrap();
        svc.record_manual_payment(payment(&member, "40.00")).await.unwrap();
        let book = store.load_book(member.id).await.unwrap();
        assert_eq!(book.available_credit(), money("10.00"));

        // next period: 30.00 flat fee, the credit is applied on generation
        svc.generate_monthly_obligations(
            PeriodCharges::new(Period::new(2025, 2).unwrap(), money("30.00"), money("10.00"))
                .unwrap(),
        )
        .await
        .unwrap();
        let book = store.load_book(member.id).await.unwrap();
        assert!(book.available_credit().is_zero());

        // a 15.00 payment lands on the reduced remainder of 20.00
        let receipt = svc.record_manual_payment(payment(&member, "15.00")).await.unwrap();
        assert_eq!(receipt.outcome.obligation.amount_remaining, money("5.00"));
        assert_eq!(
            receipt.outcome.obligation.status,
            ObligationStatus::PartiallyPaid
        );
    }

    #[tokio::test]
    async fn overpayment_cascades_into_initial_debt() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;
        svc.add_initial_debt(member.id, 2022, money("40.00")).await.unwrap();

        // 20.00 settles the flat fee, the 25.00 surplus sweeps into the debt
        let receipt = svc.record_manual_payment(payment(&member, "45.00")).await.unwrap();

        assert_eq!(receipt.outcome.applied_to_initial_debt, money("25.00"));
        let credit = receipt.outcome.credit_created.unwrap();
        assert!(credit.amount_remaining.is_zero());

        let book = store.load_book(member.id).await.unwrap();
        assert_eq!(book.initial_debts[0].amount_remaining, money("15.00"));
        book.check_invariants().unwrap();
    }

    #[tokio::test]
    async fn second_full_payment_has_no_obligation_left_to_target() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = svc.register_member(Member::new("Single Due")).await.unwrap();
        // only one open flat-fee obligation, so the second payment has no target left
        svc.generate_monthly_obligations(
            PeriodCharges::new(Period::new(2025, 3).unwrap(), money("20.00"), money("10.00"))
                .unwrap(),
        )
        .await
        .unwrap();

        svc.record_manual_payment(payment(&member, "20.00")).await.unwrap();
        let err = svc.record_manual_payment(payment(&member, "20.00")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NoMatchingObligation { .. }));
    }
}

mod validation {
    use super::*;

    #[tokio::test]
    async fn non_positive_amount_is_rejected_before_any_write() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;

        let err = svc.record_manual_payment(payment(&member, "0.00")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.payments().is_empty());

        let err = svc.record_manual_payment(payment(&member, "-5.00")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
        assert!(store.payments().is_empty());
    }

    #[tokio::test]
    async fn future_payment_date_is_rejected() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;

        let mut cmd = payment(&member, "20.00");
        cmd.paid_on = Utc::now().date_naive() + chrono::Duration::days(2);
        let err = svc.record_manual_payment(cmd).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }

    #[tokio::test]
    async fn unknown_member_is_not_found() {
        let svc = service(Arc::new(MemoryStore::new()));
        let ghost = Member::new("Ghost");
        let err = svc.record_manual_payment(payment(&ghost, "20.00")).await.unwrap_err();
        assert!(matches!(err, LedgerError::NotFound { .. }));
    }

    #[tokio::test]
    async fn duplicate_initial_debt_year_is_rejected() {
        let svc = service(Arc::new(MemoryStore::new()));
        let member = svc.register_member(Member::new("Indebted")).await.unwrap();

        svc.add_initial_debt(member.id, 2022, money("40.00")).await.unwrap();
        let err = svc.add_initial_debt(member.id, 2022, money("10.00")).await.unwrap_err();
        assert!(matches!(err, LedgerError::Validation(_)));
    }
}

mod generation {
    use super::*;

    #[tokio::test]
    async fn rerunning_a_period_creates_nothing_new() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        svc.register_member(Member::new("A")).await.unwrap();
        svc.register_member(Member::new("B")).await.unwrap();

        let charges =
            PeriodCharges::new(Period::new(2025, 3).unwrap(), money("20.00"), money("10.00"))
                .unwrap();

        let first = svc.generate_monthly_obligations(charges).await.unwrap();
        assert_eq!(first.created, 4);
        assert_eq!(first.members_processed, 2);

        let second = svc.generate_monthly_obligations(charges).await.unwrap();
        assert_eq!(second.created, 0);
    }

    #[tokio::test]
    async fn inactive_members_are_skipped() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        svc.register_member(Member::new("Active")).await.unwrap();
        let inactive = svc
            .register_member(Member::new("Inactive").deactivated())
            .await
            .unwrap();

        let report = svc
            .generate_monthly_obligations(
                PeriodCharges::new(Period::new(2025, 3).unwrap(), money("20.00"), money("10.00"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        let book = store.load_book(inactive.id).await.unwrap();
        assert!(book.obligations.is_empty());
    }
}

mod arrears_and_reminders {
    use super::*;

    #[tokio::test]
    async fn summary_reflects_debt_credit_and_threshold() {
        let svc = service(Arc::new(MemoryStore::new()));
        let member = svc.register_member(Member::new("Behind")).await.unwrap();
        // three months of unpaid dues at the default 30.00 average
        for month in 1..=3 {
            svc.generate_monthly_obligations(
                PeriodCharges::new(
                    Period::new(2025, month).unwrap(),
                    money("20.00"),
                    money("10.00"),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        }

        let summary = svc.member_debt_summary(member.id).await.unwrap();
        assert_eq!(summary.gross_debt, money("90.00"));
        assert_eq!(summary.net_debt, money("90.00"));
        assert_eq!(summary.months_in_arrears, 3);
        assert!(summary.in_arrears);
    }

    #[tokio::test]
    async fn reminders_target_overdue_obligations_of_in_arrears_members() {
        let store = Arc::new(MemoryStore::new());
        let svc = service(store.clone());
        svc.register_member(Member::new("Behind")).await.unwrap();
        let fine = svc.register_member(Member::new("Fine")).await.unwrap();

        for month in 1..=3 {
            svc.generate_monthly_obligations(
                PeriodCharges::new(
                    Period::new(2025, month).unwrap(),
                    money("20.00"),
                    money("10.00"),
                )
                .unwrap(),
            )
            .await
            .unwrap();
        }
        // the second member pays everything off
        for _ in 0..3 {
            svc.record_manual_payment(payment(&fine, "20.00")).await.unwrap();
            let mut cmd = payment(&fine, "10.00");
            cmd.due_type = DueType::AssistanceFee;
            svc.record_manual_payment(cmd).await.unwrap();
        }

        let report = svc.generate_reminders().await.unwrap();
        assert_eq!(report.members_in_arrears, 1);
        // six overdue obligations for the member in arrears
        assert_eq!(report.created, 6);

        let reminders = store.reminders();
        assert_eq!(reminders.len(), 6);
        assert!(reminders[0].message.contains("Behind"));
        assert!(reminders[0].message.contains("month(s)"));
    }
}

mod consistency {
    use super::*;

    struct FailingNotifier;

    #[async_trait]
    impl NotificationSender for FailingNotifier {
        async fn send(&self, _: &Member, _: &str, _: &str) -> Result<(), NotifyError> {
            Err(NotifyError::Dispatch("smtp down".into()))
        }
    }

    #[tokio::test]
    async fn notification_failure_does_not_roll_back_the_ledger() {
        let store = Arc::new(MemoryStore::new());
        let svc = DuesService::new(
            store.clone(),
            Arc::new(FailingNotifier),
            DuesConfig::default(),
        );
        let member = member_with_period(&svc, Period::new(2025, 3).unwrap()).await;

        let receipt = svc.record_manual_payment(payment(&member, "20.00")).await.unwrap();
        assert_eq!(receipt.outcome.obligation.status, ObligationStatus::Paid);

        // the mutation survived the failed dispatch
        assert_eq!(store.payments().len(), 1);
        let book = store.load_book(member.id).await.unwrap();
        assert!(book.oldest_open_obligation(DueType::FlatFee).is_none());
    }

    #[tokio::test]
    async fn concurrent_payments_for_one_member_never_double_spend() {
        let store = Arc::new(MemoryStore::new());
        let svc = Arc::new(service(store.clone()));
        let member = svc.register_member(Member::new("Contended")).await.unwrap();
        svc.generate_monthly_obligations(
            PeriodCharges::new(Period::new(2025, 3).unwrap(), money("200.00"), money("10.00"))
                .unwrap(),
        )
        .await
        .unwrap();

        // seed one 30.00 credit; whichever payment wins the lock sweeps it
        let mut book = store.load_book(member.id).await.unwrap();
        book.credits
            .push(domain_dues::Credit::new(member.id, money("30.00")));
        store.commit_book(&book, None).await.unwrap();

        let mut handles = Vec::new();
        for _ in 0..4 {
            let svc = svc.clone();
            let member = member.clone();
            handles.push(tokio::spawn(async move {
                svc.record_manual_payment(payment(&member, "40.00")).await
            }));
        }
        for handle in handles {
            handle.await.unwrap().unwrap();
        }

        let book = store.load_book(member.id).await.unwrap();
        book.check_invariants().unwrap();

        // 4 x 40.00 of payments plus the 30.00 credit all landed on the
        // flat fee exactly once; a double-spent credit would overshoot
        let obligation_paid: Money = book.obligations.iter().map(|o| o.amount_paid).sum();
        assert_eq!(obligation_paid, money("190.00"));
        assert!(book.available_credit().is_zero());
        assert_eq!(book.credits.len(), 1);
        assert_eq!(store.payments().len(), 4);
    }
}
