//! Borrower credit profile aggregation.
//!
//! Rolls a borrower's loan and repayment history into summary statistics and
//! a bounded credit score. Scoring weights, the grace window, and the score
//! bounds are policy supplied at call time, never hard-coded. The computation
//! is deterministic and order-independent: inputs are sorted internally
//! before classification.

use chrono::{Duration, Months, NaiveDate};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ChamaWalletError;
use crate::ledger::{Loan, LoanStatus, RepaymentRecord};
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ChamaWalletResult;

/// Longest history that still improves the history factor.
const HISTORY_SATURATION: u32 = 10;

/// Scoring policy: component weights, grace window, and score bounds.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScorePolicy {
    /// Weight of repayment completeness (repaid / borrowed).
    pub repayment_weight: Decimal,
    /// Weight of the on-time ratio.
    pub punctuality_weight: Decimal,
    /// Weight of history depth (loan count, saturating at 10).
    pub history_weight: Decimal,
    /// Days past the due date a repayment still counts as on-time.
    pub grace_days: i64,
    pub score_floor: Decimal,
    pub score_ceiling: Decimal,
}

impl Default for ScorePolicy {
    fn default() -> Self {
        ScorePolicy {
            repayment_weight: dec!(0.4),
            punctuality_weight: dec!(0.4),
            history_weight: dec!(0.2),
            grace_days: 0,
            score_floor: dec!(300),
            score_ceiling: dec!(850),
        }
    }
}

/// Per-borrower, per-group credit summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditProfile {
    pub total_borrowed: Money,
    pub total_repaid: Money,
    pub on_time_count: u32,
    pub late_count: u32,
    pub missed_count: u32,
    pub active_loans: u32,
    pub completed_loans: u32,
    /// Bounded integer score within the policy's [floor, ceiling].
    pub credit_score: u32,
}

/// Recompute a borrower's credit profile from their full history.
///
/// Only `Active` and `Completed` loans count toward borrowing totals and
/// installment classification; pending and rejected requests contribute
/// nothing. Installment *k* is due *k* months after approval (falling back
/// to creation when a loan was never explicitly approved), and the *k*-th
/// chronological repayment on a loan is matched to it. Installments whose
/// grace-adjusted due date has not yet passed `as_of` are left unclassified.
pub fn compute_credit_profile(
    loans: &[Loan],
    repayments: &[RepaymentRecord],
    as_of: NaiveDate,
    policy: &ScorePolicy,
) -> ChamaWalletResult<ComputationOutput<CreditProfile>> {
    let start = Instant::now();
    let warnings: Vec<String> = Vec::new();

    validate_policy(policy)?;

    let mut counted: Vec<&Loan> = loans
        .iter()
        .filter(|l| matches!(l.status, LoanStatus::Active | LoanStatus::Completed))
        .collect();
    counted.sort_by(|a, b| a.id.cmp(&b.id));

    let total_borrowed: Money = counted.iter().map(|l| l.terms.principal).sum();
    let total_repaid: Money = repayments.iter().map(|r| r.amount).sum();

    let mut on_time_count = 0u32;
    let mut late_count = 0u32;
    let mut missed_count = 0u32;

    for loan in &counted {
        let schedule_len = loan.terms.term_months;
        let anchor = loan.approved_at.unwrap_or(loan.created_at);

        let mut records: Vec<&RepaymentRecord> = repayments
            .iter()
            .filter(|r| r.loan_id == loan.id)
            .collect();
        records.sort_by_key(|r| r.recorded_at);

        for k in 0..schedule_len {
            let due = anchor.checked_add_months(Months::new(k + 1)).ok_or_else(|| {
                ChamaWalletError::InvalidTerm(format!(
                    "Installment {} of loan {} overflows the calendar",
                    k + 1,
                    loan.id
                ))
            })?;
            let due_with_grace = due + Duration::days(policy.grace_days);

            match records.get(k as usize) {
                Some(r) if r.recorded_at <= due_with_grace => on_time_count += 1,
                Some(_) => late_count += 1,
                None if due_with_grace < as_of => missed_count += 1,
                None => {} // not yet due
            }
        }
    }

    let active_loans = counted
        .iter()
        .filter(|l| l.status == LoanStatus::Active)
        .count() as u32;
    let completed_loans = counted.len() as u32 - active_loans;

    let credit_score = score(
        policy,
        total_borrowed,
        total_repaid,
        on_time_count,
        late_count,
        missed_count,
        counted.len() as u32,
    );

    let profile = CreditProfile {
        total_borrowed,
        total_repaid,
        on_time_count,
        late_count,
        missed_count,
        active_loans,
        completed_loans,
        credit_score,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Weighted credit profile: repayment completeness, punctuality, history depth",
        &serde_json::json!({
            "repayment_weight": policy.repayment_weight.to_string(),
            "punctuality_weight": policy.punctuality_weight.to_string(),
            "history_weight": policy.history_weight.to_string(),
            "grace_days": policy.grace_days,
            "score_floor": policy.score_floor.to_string(),
            "score_ceiling": policy.score_ceiling.to_string(),
            "as_of": as_of.to_string(),
        }),
        warnings,
        elapsed,
        profile,
    ))
}

fn score(
    policy: &ScorePolicy,
    total_borrowed: Money,
    total_repaid: Money,
    on_time: u32,
    late: u32,
    missed: u32,
    loan_count: u32,
) -> u32 {
    let completeness = if total_borrowed > Decimal::ZERO {
        (total_repaid / total_borrowed).min(Decimal::ONE)
    } else {
        Decimal::ZERO
    };

    let classified = on_time + late + missed;
    let punctuality = if classified > 0 {
        Decimal::from(on_time) / Decimal::from(classified)
    } else {
        Decimal::ZERO
    };

    let history = Decimal::from(loan_count.min(HISTORY_SATURATION))
        / Decimal::from(HISTORY_SATURATION);

    let weight_sum = policy.repayment_weight + policy.punctuality_weight + policy.history_weight;
    let blend = (policy.repayment_weight * completeness
        + policy.punctuality_weight * punctuality
        + policy.history_weight * history)
        / weight_sum;

    let span = policy.score_ceiling - policy.score_floor;
    let raw = policy.score_floor + span * blend;
    raw.round()
        .max(policy.score_floor)
        .min(policy.score_ceiling)
        .to_u32()
        .unwrap_or(0)
}

fn validate_policy(policy: &ScorePolicy) -> ChamaWalletResult<()> {
    for (field, weight) in [
        ("repayment_weight", policy.repayment_weight),
        ("punctuality_weight", policy.punctuality_weight),
        ("history_weight", policy.history_weight),
    ] {
        if weight < Decimal::ZERO {
            return Err(ChamaWalletError::InvalidRate {
                field: field.into(),
                reason: "Score weights cannot be negative".into(),
            });
        }
    }
    if (policy.repayment_weight + policy.punctuality_weight + policy.history_weight).is_zero() {
        return Err(ChamaWalletError::InvalidRate {
            field: "score weights".into(),
            reason: "At least one score weight must be positive".into(),
        });
    }
    if policy.grace_days < 0 {
        return Err(ChamaWalletError::InvalidTerm(
            "Grace days cannot be negative".into(),
        ));
    }
    if policy.score_floor < Decimal::ZERO || policy.score_floor >= policy.score_ceiling {
        return Err(ChamaWalletError::InvalidAmount {
            field: "score_floor".into(),
            reason: "Score floor must be non-negative and below the ceiling".into(),
        });
    }
    Ok(())
}
