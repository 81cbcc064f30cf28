//! Fixed-payment loan amortization.
//!
//! Produces the constant monthly payment (annuity method), the full
//! per-period principal/interest split, and repayment totals. All math uses
//! `rust_decimal::Decimal`. The running balance is carried between periods
//! rather than re-derived from rounded display values, and the final period
//! absorbs any rounding residue so the balance lands exactly on zero.

use rust_decimal::Decimal;
use rust_decimal::MathematicalOps;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use std::time::Instant;

use crate::error::ChamaWalletError;
use crate::terms::LoanTerms;
use crate::types::{with_metadata, ComputationOutput, Money};
use crate::ChamaWalletResult;

/// Monetary outputs are rounded to this many decimal places.
const OUTPUT_DP: u32 = 2;
/// Monthly rate above which the input is probably a data-entry mistake.
const HIGH_MONTHLY_RATE: Decimal = dec!(0.05);

/// A single row in the amortization schedule.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodEntry {
    /// 1-based period index.
    pub period: u32,
    /// Amount due this period. Equals the monthly payment except possibly
    /// in the final period, which settles the exact remaining balance.
    pub payment: Money,
    pub principal_portion: Money,
    pub interest_portion: Money,
    /// Balance outstanding after this period's payment.
    pub remaining_balance: Money,
}

/// Full amortization of a loan under its terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmortizationResult {
    pub monthly_payment: Money,
    pub total_interest: Money,
    pub total_repayment: Money,
    pub schedule: Vec<PeriodEntry>,
}

/// Amortize a loan: constant payment, per-period split, totals.
///
/// Zero-rate terms fall back to straight-line principal division, avoiding
/// the division by zero in the annuity formula.
pub fn amortize(terms: &LoanTerms) -> ChamaWalletResult<ComputationOutput<AmortizationResult>> {
    let start = Instant::now();
    let mut warnings: Vec<String> = Vec::new();

    validate_terms(terms)?;

    let monthly_rate = terms.monthly_rate();
    if monthly_rate > HIGH_MONTHLY_RATE {
        warnings.push(format!(
            "Monthly rate {} exceeds 5%; confirm the annual rate is expressed as a percentage",
            monthly_rate
        ));
    }

    let n = Decimal::from(terms.term_months);
    let raw_payment = if monthly_rate.is_zero() {
        terms.principal / n
    } else {
        let growth = (Decimal::ONE + monthly_rate).powd(n);
        terms.principal * monthly_rate * growth / (growth - Decimal::ONE)
    };
    let monthly_payment = raw_payment.round_dp(OUTPUT_DP);

    let mut schedule: Vec<PeriodEntry> = Vec::with_capacity(terms.term_months as usize);
    let mut balance = terms.principal;
    let mut total_interest = Decimal::ZERO;

    for period in 1..=terms.term_months {
        let interest_portion = (balance * monthly_rate).round_dp(OUTPUT_DP);

        let (payment, principal_portion) = if period == terms.term_months {
            // Final period settles the exact balance, absorbing rounding residue.
            let principal_portion = balance;
            (principal_portion + interest_portion, principal_portion)
        } else {
            (monthly_payment, monthly_payment - interest_portion)
        };

        balance -= principal_portion;
        total_interest += interest_portion;

        schedule.push(PeriodEntry {
            period,
            payment,
            principal_portion,
            interest_portion,
            remaining_balance: balance,
        });
    }

    let result = AmortizationResult {
        monthly_payment,
        total_interest,
        total_repayment: terms.principal + total_interest,
        schedule,
    };

    let elapsed = start.elapsed().as_micros() as u64;
    Ok(with_metadata(
        "Fixed-payment amortization (annuity method)",
        &serde_json::json!({
            "principal": terms.principal.to_string(),
            "annual_interest_rate_pct": terms.annual_interest_rate_pct.to_string(),
            "term_months": terms.term_months,
            "monthly_rate": monthly_rate.to_string(),
            "fee_rate_pct": terms.fee_rate_pct.to_string(),
        }),
        warnings,
        elapsed,
        result,
    ))
}

fn validate_terms(terms: &LoanTerms) -> ChamaWalletResult<()> {
    if terms.principal <= Decimal::ZERO {
        return Err(ChamaWalletError::InvalidAmount {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }
    if terms.term_months == 0 {
        return Err(ChamaWalletError::InvalidTerm(
            "Term must be at least 1 month".into(),
        ));
    }
    if terms.annual_interest_rate_pct < Decimal::ZERO {
        return Err(ChamaWalletError::InvalidRate {
            field: "annual_interest_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }
    Ok(())
}
