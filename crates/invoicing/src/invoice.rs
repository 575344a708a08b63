use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use finpay_core::{CustomerId, DomainError, DomainResult, InvoiceId, Money, MoneyError};

/// Invoice lifecycle state.
///
/// Accepts the legacy single-letter codes on input: `"B"` open, `"A"`
/// overdue, `"P"` paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    #[serde(alias = "B")]
    Open,
    #[serde(alias = "A")]
    Overdue,
    #[serde(alias = "P")]
    Paid,
}

impl InvoiceStatus {
    /// Single-letter storage code.
    pub fn code(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "B",
            InvoiceStatus::Overdue => "A",
            InvoiceStatus::Paid => "P",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "B" => Some(InvoiceStatus::Open),
            "A" => Some(InvoiceStatus::Overdue),
            "P" => Some(InvoiceStatus::Paid),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Open => "open",
            InvoiceStatus::Overdue => "overdue",
            InvoiceStatus::Paid => "paid",
        }
    }
}

/// Invoice owed by a customer.
///
/// Invariant: `status == Paid` exactly when `payment_date` is set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invoice {
    id: InvoiceId,
    customer_id: CustomerId,
    due_date: NaiveDate,
    payment_date: Option<NaiveDate>,
    amount: Money,
    status: InvoiceStatus,
}

impl Invoice {
    /// Issue a new open invoice. The amount must be positive.
    pub fn issue(
        id: InvoiceId,
        customer_id: CustomerId,
        due_date: NaiveDate,
        amount: Decimal,
    ) -> DomainResult<Self> {
        let amount = match Money::from_decimal(amount) {
            Ok(m) if m.is_positive() => m,
            Ok(_) => return Err(DomainError::validation("amount", "amount must be positive")),
            Err(e) => return Err(DomainError::validation("amount", amount_message(e))),
        };

        Ok(Self {
            id,
            customer_id,
            due_date,
            payment_date: None,
            amount,
            status: InvoiceStatus::Open,
        })
    }

    /// Rebuild an invoice from persisted fields.
    ///
    /// Status is reconciled with the payment date: a stored date means paid,
    /// and a `Paid` code without a date reads back as open.
    pub fn restore(
        id: InvoiceId,
        customer_id: CustomerId,
        due_date: NaiveDate,
        payment_date: Option<NaiveDate>,
        amount: Money,
        status: InvoiceStatus,
    ) -> Self {
        let status = match (payment_date, status) {
            (Some(_), _) => InvoiceStatus::Paid,
            (None, InvoiceStatus::Paid) => InvoiceStatus::Open,
            (None, s) => s,
        };
        Self {
            id,
            customer_id,
            due_date,
            payment_date,
            amount,
            status,
        }
    }

    pub fn id_typed(&self) -> InvoiceId {
        self.id
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn payment_date(&self) -> Option<NaiveDate> {
        self.payment_date
    }

    pub fn amount(&self) -> Money {
        self.amount
    }

    pub fn status(&self) -> InvoiceStatus {
        self.status
    }

    pub fn is_paid(&self) -> bool {
        self.status == InvoiceStatus::Paid
    }

    /// Record a payment.
    ///
    /// Fails with `Conflict` when the invoice is already paid; the stored
    /// payment date is never overwritten.
    pub fn pay(&mut self, payment_date: NaiveDate) -> DomainResult<()> {
        if self.is_paid() {
            return Err(DomainError::conflict("already paid"));
        }
        self.payment_date = Some(payment_date);
        self.status = InvoiceStatus::Paid;
        Ok(())
    }

    /// Flip an open invoice past its due date to overdue.
    ///
    /// Returns whether the status changed.
    pub fn mark_overdue(&mut self, today: NaiveDate) -> bool {
        if self.status == InvoiceStatus::Open && self.due_date < today {
            self.status = InvoiceStatus::Overdue;
            return true;
        }
        false
    }
}

/// A payment date may be today or earlier, never in the future.
pub fn check_payment_date(payment_date: NaiveDate, today: NaiveDate) -> DomainResult<()> {
    if payment_date > today {
        return Err(DomainError::validation(
            "payment_date",
            "payment date must not be in the future",
        ));
    }
    Ok(())
}

fn amount_message(err: MoneyError) -> String {
    format!("amount {err}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn open_invoice(due: NaiveDate) -> Invoice {
        Invoice::issue(InvoiceId::new(), CustomerId::new(), due, Decimal::new(15050, 2)).unwrap()
    }

    #[test]
    fn issue_starts_open_and_unpaid() {
        let inv = open_invoice(d(2025, 7, 1));
        assert_eq!(inv.status(), InvoiceStatus::Open);
        assert_eq!(inv.payment_date(), None);
        assert_eq!(inv.amount().to_string(), "150.50");
    }

    #[test]
    fn issue_rejects_non_positive_amount() {
        for raw in [Decimal::ZERO, Decimal::new(-1, 0), Decimal::new(1001, 3)] {
            let err = Invoice::issue(InvoiceId::new(), CustomerId::new(), d(2025, 7, 1), raw)
                .unwrap_err();
            match err {
                DomainError::Validation(e) => assert!(e.has_field("amount")),
                other => panic!("expected validation error, got {other:?}"),
            }
        }
    }

    #[test]
    fn pay_sets_date_and_status() {
        let mut inv = open_invoice(d(2025, 7, 1));
        inv.pay(d(2025, 7, 5)).unwrap();
        assert!(inv.is_paid());
        assert_eq!(inv.payment_date(), Some(d(2025, 7, 5)));
    }

    #[test]
    fn paying_twice_conflicts_and_keeps_first_date() {
        let mut inv = open_invoice(d(2025, 7, 1));
        inv.pay(d(2025, 7, 5)).unwrap();

        let err = inv.pay(d(2025, 7, 6)).unwrap_err();
        assert_eq!(err, DomainError::conflict("already paid"));
        assert_eq!(inv.payment_date(), Some(d(2025, 7, 5)));
    }

    #[test]
    fn overdue_invoice_can_be_paid() {
        let mut inv = open_invoice(d(2025, 7, 1));
        assert!(inv.mark_overdue(d(2025, 7, 10)));
        inv.pay(d(2025, 7, 10)).unwrap();
        assert_eq!(inv.status(), InvoiceStatus::Paid);
    }

    #[test]
    fn mark_overdue_only_touches_open_invoices_past_due() {
        let today = d(2025, 7, 10);

        let mut due_today = open_invoice(today);
        assert!(!due_today.mark_overdue(today));
        assert_eq!(due_today.status(), InvoiceStatus::Open);

        let mut late = open_invoice(d(2025, 7, 9));
        assert!(late.mark_overdue(today));
        assert!(!late.mark_overdue(today));

        let mut paid = open_invoice(d(2025, 7, 1));
        paid.pay(d(2025, 7, 2)).unwrap();
        assert!(!paid.mark_overdue(today));
        assert!(paid.is_paid());
    }

    #[test]
    fn payment_date_may_not_be_in_the_future() {
        let today = d(2025, 7, 10);
        assert!(check_payment_date(today, today).is_ok());
        assert!(check_payment_date(d(2025, 7, 9), today).is_ok());
        match check_payment_date(d(2025, 7, 11), today).unwrap_err() {
            DomainError::Validation(e) => assert!(e.has_field("payment_date")),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn restore_keeps_paid_in_step_with_payment_date() {
        let amount = Money::from_decimal(Decimal::new(100, 0)).unwrap();
        let paid = Invoice::restore(
            InvoiceId::new(),
            CustomerId::new(),
            d(2025, 7, 1),
            Some(d(2025, 7, 2)),
            amount,
            InvoiceStatus::Overdue,
        );
        assert_eq!(paid.status(), InvoiceStatus::Paid);

        let unpaid = Invoice::restore(
            InvoiceId::new(),
            CustomerId::new(),
            d(2025, 7, 1),
            None,
            amount,
            InvoiceStatus::Paid,
        );
        assert_eq!(unpaid.status(), InvoiceStatus::Open);
    }

    #[test]
    fn status_accepts_legacy_codes() {
        let s: InvoiceStatus = serde_json::from_str("\"A\"").unwrap();
        assert_eq!(s, InvoiceStatus::Overdue);
        let s: InvoiceStatus = serde_json::from_str("\"B\"").unwrap();
        assert_eq!(s, InvoiceStatus::Open);
        assert_eq!(serde_json::to_string(&InvoiceStatus::Paid).unwrap(), "\"paid\"");
        for s in [InvoiceStatus::Open, InvoiceStatus::Overdue, InvoiceStatus::Paid] {
            assert_eq!(InvoiceStatus::from_code(s.code()), Some(s));
        }
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        #[derive(Debug, Clone)]
        enum Op {
            MarkOverdue(u32),
            Pay(u32),
        }

        fn op() -> impl Strategy<Value = Op> {
            prop_oneof![
                (0u32..60).prop_map(Op::MarkOverdue),
                (0u32..60).prop_map(Op::Pay),
            ]
        }

        proptest! {
            /// Property: whatever happens to an invoice, it is paid exactly
            /// when it carries a payment date, and the first payment sticks.
            #[test]
            fn paid_iff_payment_date(ops in proptest::collection::vec(op(), 0..12)) {
                let base = d(2025, 1, 1);
                let mut inv = open_invoice(base + chrono::Days::new(10));
                let mut first_payment = None;

                for op in ops {
                    match op {
                        Op::MarkOverdue(day) => {
                            inv.mark_overdue(base + chrono::Days::new(u64::from(day)));
                        }
                        Op::Pay(day) => {
                            let date = base + chrono::Days::new(u64::from(day));
                            match inv.pay(date) {
                                Ok(()) => first_payment = Some(date),
                                Err(e) => prop_assert_eq!(e, DomainError::conflict("already paid")),
                            }
                        }
                    }
                    prop_assert_eq!(inv.is_paid(), inv.payment_date().is_some());
                    prop_assert_eq!(inv.payment_date(), first_payment);
                }
            }
        }
    }
}
