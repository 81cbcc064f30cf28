//! Loan lifecycle and repayment ledger.
//!
//! The ledger is pure: every operation takes the current loan value and
//! returns the transitioned loan plus any appended record. The caller owns
//! persistence and must serialize concurrent repayment commits per loan id;
//! nothing here performs I/O.
//!
//! Lifecycle: `Pending -> Approved -> Active -> Completed`, with
//! `Pending -> Rejected` as the alternate terminal path. A loan is never
//! deleted, only transitioned. The first repayment against an `Approved`
//! loan activates it.

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::amortization::amortize;
use crate::error::ChamaWalletError;
use crate::terms::LoanTerms;
use crate::types::{Currency, Money};
use crate::ChamaWalletResult;

/// Loan lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Pending,
    Approved,
    Active,
    Completed,
    Rejected,
}

impl LoanStatus {
    /// Terminal states admit no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(self, LoanStatus::Completed | LoanStatus::Rejected)
    }

    /// Whether `record_repayment` is permitted in this state.
    pub fn accepts_repayment(&self) -> bool {
        matches!(self, LoanStatus::Approved | LoanStatus::Active)
    }
}

impl fmt::Display for LoanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoanStatus::Pending => write!(f, "pending"),
            LoanStatus::Approved => write!(f, "approved"),
            LoanStatus::Active => write!(f, "active"),
            LoanStatus::Completed => write!(f, "completed"),
            LoanStatus::Rejected => write!(f, "rejected"),
        }
    }
}

/// Channel through which a repayment arrived.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RepaymentMethod {
    Cash,
    MobileMoney,
    BankTransfer,
    WalletBalance,
}

impl fmt::Display for RepaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepaymentMethod::Cash => write!(f, "cash"),
            RepaymentMethod::MobileMoney => write!(f, "mobile_money"),
            RepaymentMethod::BankTransfer => write!(f, "bank_transfer"),
            RepaymentMethod::WalletBalance => write!(f, "wallet_balance"),
        }
    }
}

impl FromStr for RepaymentMethod {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(RepaymentMethod::Cash),
            "mobile_money" => Ok(RepaymentMethod::MobileMoney),
            "bank_transfer" => Ok(RepaymentMethod::BankTransfer),
            "wallet_balance" => Ok(RepaymentMethod::WalletBalance),
            other => Err(format!("Unknown repayment method: {other}")),
        }
    }
}

/// A persisted loan. The ledger transitions it; the caller stores it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loan {
    pub id: String,
    pub borrower_id: String,
    pub group_id: String,
    pub currency: Currency,
    pub terms: LoanTerms,
    pub status: LoanStatus,
    /// Cumulative amount repaid. Monotonically non-decreasing.
    pub repaid_amount: Money,
    pub created_at: NaiveDate,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approved_at: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejection_reason: Option<String>,
}

impl Loan {
    /// Create a loan request in `Pending` with nothing repaid.
    pub fn new(
        id: impl Into<String>,
        borrower_id: impl Into<String>,
        group_id: impl Into<String>,
        currency: Currency,
        terms: LoanTerms,
        created_at: NaiveDate,
    ) -> ChamaWalletResult<Self> {
        let due_date = add_term_months(created_at, terms.term_months)?;
        Ok(Loan {
            id: id.into(),
            borrower_id: borrower_id.into(),
            group_id: group_id.into(),
            currency,
            terms,
            status: LoanStatus::Pending,
            repaid_amount: Decimal::ZERO,
            created_at,
            approved_at: None,
            due_date: Some(due_date),
            rejection_reason: None,
        })
    }
}

/// An immutable, append-only repayment record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentRecord {
    pub loan_id: String,
    pub amount: Money,
    pub method: RepaymentMethod,
    pub recorded_at: NaiveDate,
}

/// Result of committing one repayment: the transitioned loan, the record to
/// append, and derived balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepaymentOutcome {
    pub loan: Loan,
    pub record: RepaymentRecord,
    pub total_repayment: Money,
    /// Amount still owed after this repayment, floored at zero.
    pub outstanding: Money,
    pub completed: bool,
}

/// Approve a pending loan. Re-anchors the due date to approval plus term.
pub fn approve(loan: &Loan, on: NaiveDate) -> ChamaWalletResult<Loan> {
    if loan.status != LoanStatus::Pending {
        return Err(invalid_state(loan, "approve"));
    }
    let mut approved = loan.clone();
    approved.status = LoanStatus::Approved;
    approved.approved_at = Some(on);
    approved.due_date = Some(add_term_months(on, loan.terms.term_months)?);
    Ok(approved)
}

/// Reject a pending loan. Terminal.
pub fn reject(loan: &Loan, reason: &str) -> ChamaWalletResult<Loan> {
    if loan.status != LoanStatus::Pending {
        return Err(invalid_state(loan, "reject"));
    }
    let mut rejected = loan.clone();
    rejected.status = LoanStatus::Rejected;
    rejected.rejection_reason = Some(reason.to_string());
    Ok(rejected)
}

/// Record a repayment against an approved or active loan.
///
/// The first repayment activates an `Approved` loan. Once cumulative
/// repayments reach the loan's total repayment (principal plus scheduled
/// interest), the loan completes. Overpayments are recorded as-is; callers
/// wanting a strict cap must clamp the amount before calling.
pub fn record_repayment(
    loan: &Loan,
    amount: Money,
    method: RepaymentMethod,
    on: NaiveDate,
) -> ChamaWalletResult<RepaymentOutcome> {
    if amount <= Decimal::ZERO {
        return Err(ChamaWalletError::InvalidAmount {
            field: "amount".into(),
            reason: "Repayment amount must be positive".into(),
        });
    }
    if !loan.status.accepts_repayment() {
        return Err(invalid_state(loan, "record_repayment"));
    }

    let total_repayment = total_repayment(loan)?;

    let mut updated = loan.clone();
    updated.repaid_amount += amount;
    updated.status = if updated.repaid_amount >= total_repayment {
        LoanStatus::Completed
    } else {
        LoanStatus::Active
    };

    let record = RepaymentRecord {
        loan_id: loan.id.clone(),
        amount,
        method,
        recorded_at: on,
    };

    let outstanding = (total_repayment - updated.repaid_amount).max(Decimal::ZERO);
    let completed = updated.status == LoanStatus::Completed;

    Ok(RepaymentOutcome {
        loan: updated,
        record,
        total_repayment,
        outstanding,
        completed,
    })
}

/// Amount still owed on a loan under its amortized total.
pub fn outstanding_balance(loan: &Loan) -> ChamaWalletResult<Money> {
    Ok((total_repayment(loan)? - loan.repaid_amount).max(Decimal::ZERO))
}

/// Repayment progress as a percentage of the amortized total, capped at 100.
pub fn repayment_progress_pct(loan: &Loan) -> ChamaWalletResult<Money> {
    let total = total_repayment(loan)?;
    let pct = loan.repaid_amount / total * Decimal::ONE_HUNDRED;
    Ok(pct.min(Decimal::ONE_HUNDRED).round_dp(1))
}

fn total_repayment(loan: &Loan) -> ChamaWalletResult<Money> {
    Ok(amortize(&loan.terms)?.result.total_repayment)
}

fn invalid_state(loan: &Loan, operation: &str) -> ChamaWalletError {
    ChamaWalletError::InvalidLoanState {
        loan_id: loan.id.clone(),
        status: loan.status.to_string(),
        operation: operation.to_string(),
    }
}

fn add_term_months(date: NaiveDate, months: u32) -> ChamaWalletResult<NaiveDate> {
    date.checked_add_months(Months::new(months))
        .ok_or_else(|| ChamaWalletError::InvalidTerm(format!("Term of {months} months overflows the due date")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rust_decimal_macros::dec;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn zero_rate_loan() -> Loan {
        // 10,000 over 5 months at 0%: total repayment is exactly 10,000.
        let terms = LoanTerms {
            principal: dec!(10_000),
            annual_interest_rate_pct: dec!(0),
            term_months: 5,
            fee_rate_pct: dec!(2),
        };
        Loan::new("loan-1", "member-7", "chama-3", Currency::KES, terms, date(2025, 1, 15)).unwrap()
    }

    fn active_loan() -> Loan {
        let loan = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        record_repayment(&loan, dec!(2_000), RepaymentMethod::MobileMoney, date(2025, 2, 20))
            .unwrap()
            .loan
    }

    // -----------------------------------------------------------------------
    // 1. Creation defaults
    // -----------------------------------------------------------------------
    #[test]
    fn test_new_loan_is_pending() {
        let loan = zero_rate_loan();
        assert_eq!(loan.status, LoanStatus::Pending);
        assert_eq!(loan.repaid_amount, Decimal::ZERO);
        assert_eq!(loan.due_date, Some(date(2025, 6, 15)));
        assert!(loan.approved_at.is_none());
    }

    // -----------------------------------------------------------------------
    // 2. Approval sets the timestamp and re-anchors the due date
    // -----------------------------------------------------------------------
    #[test]
    fn test_approve_pending_loan() {
        let loan = approve(&zero_rate_loan(), date(2025, 1, 31)).unwrap();
        assert_eq!(loan.status, LoanStatus::Approved);
        assert_eq!(loan.approved_at, Some(date(2025, 1, 31)));
        // Jan 31 + 5 months clamps to Jun 30.
        assert_eq!(loan.due_date, Some(date(2025, 6, 30)));
    }

    #[test]
    fn test_approve_non_pending_fails() {
        let loan = active_loan();
        let err = approve(&loan, date(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ChamaWalletError::InvalidLoanState { .. }));
    }

    // -----------------------------------------------------------------------
    // 3. Rejection is terminal
    // -----------------------------------------------------------------------
    #[test]
    fn test_reject_pending_loan() {
        let loan = reject(&zero_rate_loan(), "insufficient contribution history").unwrap();
        assert_eq!(loan.status, LoanStatus::Rejected);
        assert_eq!(
            loan.rejection_reason.as_deref(),
            Some("insufficient contribution history")
        );
        assert!(loan.status.is_terminal());
    }

    #[test]
    fn test_rejected_loan_refuses_repayment() {
        let loan = reject(&zero_rate_loan(), "no").unwrap();
        let err =
            record_repayment(&loan, dec!(100), RepaymentMethod::Cash, date(2025, 2, 1)).unwrap_err();
        match err {
            ChamaWalletError::InvalidLoanState { status, .. } => assert_eq!(status, "rejected"),
            other => panic!("Expected InvalidLoanState, got {:?}", other),
        }
    }

    // -----------------------------------------------------------------------
    // 4. Repayment on Pending fails and leaves the loan untouched
    // -----------------------------------------------------------------------
    #[test]
    fn test_pending_loan_refuses_repayment() {
        let loan = zero_rate_loan();
        let err =
            record_repayment(&loan, dec!(100), RepaymentMethod::Cash, date(2025, 2, 1)).unwrap_err();
        assert!(matches!(err, ChamaWalletError::InvalidLoanState { .. }));
        assert_eq!(loan.repaid_amount, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 5. First repayment activates an approved loan
    // -----------------------------------------------------------------------
    #[test]
    fn test_first_repayment_activates() {
        let approved = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        let outcome = record_repayment(
            &approved,
            dec!(2_000),
            RepaymentMethod::MobileMoney,
            date(2025, 2, 20),
        )
        .unwrap();

        assert_eq!(outcome.loan.status, LoanStatus::Active);
        assert_eq!(outcome.loan.repaid_amount, dec!(2_000));
        assert_eq!(outcome.record.loan_id, "loan-1");
        assert_eq!(outcome.record.amount, dec!(2_000));
        assert_eq!(outcome.outstanding, dec!(8_000));
        assert!(!outcome.completed);
    }

    // -----------------------------------------------------------------------
    // 6. Completion triggers exactly when the total is reached, not before
    // -----------------------------------------------------------------------
    #[test]
    fn test_completion_on_exact_total() {
        let mut loan = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        for month in 2..=6u32 {
            let outcome = record_repayment(
                &loan,
                dec!(2_000),
                RepaymentMethod::MobileMoney,
                date(2025, month, 20),
            )
            .unwrap();
            loan = outcome.loan;
            if month < 6 {
                assert_eq!(loan.status, LoanStatus::Active, "month {month} should not complete");
            } else {
                assert_eq!(loan.status, LoanStatus::Completed);
                assert!(outcome.completed);
                assert_eq!(outcome.outstanding, Decimal::ZERO);
            }
        }
        assert_eq!(loan.repaid_amount, dec!(10_000));
    }

    // -----------------------------------------------------------------------
    // 7. Completed loans refuse further repayments
    // -----------------------------------------------------------------------
    #[test]
    fn test_completed_loan_refuses_repayment() {
        let approved = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        let done = record_repayment(
            &approved,
            dec!(10_000),
            RepaymentMethod::BankTransfer,
            date(2025, 2, 20),
        )
        .unwrap()
        .loan;
        assert_eq!(done.status, LoanStatus::Completed);

        let err =
            record_repayment(&done, dec!(1), RepaymentMethod::Cash, date(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ChamaWalletError::InvalidLoanState { .. }));
    }

    // -----------------------------------------------------------------------
    // 8. Overpayment is recorded as-is, never clamped
    // -----------------------------------------------------------------------
    #[test]
    fn test_overpayment_recorded_as_is() {
        let approved = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        let outcome = record_repayment(
            &approved,
            dec!(12_500),
            RepaymentMethod::BankTransfer,
            date(2025, 2, 20),
        )
        .unwrap();

        assert_eq!(outcome.loan.status, LoanStatus::Completed);
        assert_eq!(outcome.loan.repaid_amount, dec!(12_500));
        assert_eq!(outcome.outstanding, Decimal::ZERO);
    }

    // -----------------------------------------------------------------------
    // 9. Non-positive amounts rejected
    // -----------------------------------------------------------------------
    #[test]
    fn test_zero_amount_rejected() {
        let loan = active_loan();
        let err =
            record_repayment(&loan, dec!(0), RepaymentMethod::Cash, date(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ChamaWalletError::InvalidAmount { .. }));
    }

    #[test]
    fn test_negative_amount_rejected() {
        let loan = active_loan();
        let err =
            record_repayment(&loan, dec!(-50), RepaymentMethod::Cash, date(2025, 3, 1)).unwrap_err();
        assert!(matches!(err, ChamaWalletError::InvalidAmount { .. }));
    }

    // -----------------------------------------------------------------------
    // 10. Interest-bearing loan completes against the amortized total
    // -----------------------------------------------------------------------
    #[test]
    fn test_interest_bearing_completion() {
        let terms = LoanTerms {
            principal: dec!(50_000),
            annual_interest_rate_pct: dec!(12.5),
            term_months: 12,
            fee_rate_pct: dec!(2),
        };
        let loan = Loan::new("loan-2", "member-1", "chama-3", Currency::KES, terms.clone(), date(2025, 1, 1))
            .unwrap();
        let mut loan = approve(&loan, date(2025, 1, 5)).unwrap();

        let total = crate::amortization::amortize(&terms)
            .unwrap()
            .result
            .total_repayment;
        let monthly = crate::amortization::amortize(&terms).unwrap().result.monthly_payment;

        // Pay the scheduled amount for 11 months: still active.
        for month in 0..11u32 {
            let on = date(2025, 2 + month % 12, 5);
            loan = record_repayment(&loan, monthly, RepaymentMethod::MobileMoney, on)
                .unwrap()
                .loan;
            assert_eq!(loan.status, LoanStatus::Active);
        }

        // Final payment settles whatever remains.
        let last = total - loan.repaid_amount;
        let outcome =
            record_repayment(&loan, last, RepaymentMethod::MobileMoney, date(2026, 1, 5)).unwrap();
        assert_eq!(outcome.loan.status, LoanStatus::Completed);
        assert_eq!(outcome.loan.repaid_amount, total);
    }

    // -----------------------------------------------------------------------
    // 11. Derived balances
    // -----------------------------------------------------------------------
    #[test]
    fn test_outstanding_balance_and_progress() {
        let loan = active_loan();
        assert_eq!(outstanding_balance(&loan).unwrap(), dec!(8_000));
        assert_eq!(repayment_progress_pct(&loan).unwrap(), dec!(20.0));
    }

    #[test]
    fn test_progress_capped_at_hundred() {
        let approved = approve(&zero_rate_loan(), date(2025, 1, 20)).unwrap();
        let over = record_repayment(
            &approved,
            dec!(11_000),
            RepaymentMethod::Cash,
            date(2025, 2, 20),
        )
        .unwrap()
        .loan;
        assert_eq!(repayment_progress_pct(&over).unwrap(), dec!(100.0));
    }

    // -----------------------------------------------------------------------
    // 12. Status predicates and display
    // -----------------------------------------------------------------------
    #[test]
    fn test_status_predicates() {
        assert!(LoanStatus::Completed.is_terminal());
        assert!(LoanStatus::Rejected.is_terminal());
        assert!(!LoanStatus::Active.is_terminal());
        assert!(LoanStatus::Approved.accepts_repayment());
        assert!(LoanStatus::Active.accepts_repayment());
        assert!(!LoanStatus::Pending.accepts_repayment());
        assert_eq!(LoanStatus::Active.to_string(), "active");
    }

    #[test]
    fn test_repayment_method_round_trip() {
        let m: RepaymentMethod = "mobile_money".parse().unwrap();
        assert_eq!(m, RepaymentMethod::MobileMoney);
        assert_eq!(m.to_string(), "mobile_money");
        assert!("cheque".parse::<RepaymentMethod>().is_err());
    }
}
