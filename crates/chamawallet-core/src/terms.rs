//! Loan input validation and normalization.
//!
//! Raw loan requests arrive as loosely-typed values (form fields, JSON
//! payloads). `normalize` turns them into validated, immutable `LoanTerms`
//! or rejects them loudly. Nothing downstream accepts unvalidated input.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::ChamaWalletError;
use crate::types::{Money, Rate};
use crate::ChamaWalletResult;

/// Processing fee applied when the request does not specify one.
pub const DEFAULT_FEE_RATE_PCT: Decimal = dec!(2.0);

const MONTHS_PER_YEAR: Decimal = dec!(12);
const PERCENT: Decimal = dec!(100);

/// A loan request as received from the caller, prior to validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RawLoanInput {
    /// Requested principal.
    pub principal: Decimal,
    /// Annual interest rate as a percentage (12.5 = 12.5%/year).
    pub annual_interest_rate_pct: Decimal,
    /// Term in months. Accepted as a decimal so fractional input can be
    /// rejected explicitly rather than truncated.
    pub term_months: Decimal,
    /// Processing fee as a percentage of principal. Defaults to 2.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fee_rate_pct: Option<Decimal>,
    /// Group policy cap on the principal, when the group defines one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_loan_amount: Option<Decimal>,
}

/// Validated loan terms. Immutable once a loan is created.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanTerms {
    pub principal: Money,
    pub annual_interest_rate_pct: Rate,
    pub term_months: u32,
    pub fee_rate_pct: Rate,
}

impl LoanTerms {
    /// Periodic rate used by the amortization schedule (decimal, not percent).
    pub fn monthly_rate(&self) -> Rate {
        self.annual_interest_rate_pct / PERCENT / MONTHS_PER_YEAR
    }
}

/// Validate a raw loan request and produce normalized terms.
///
/// Fails with `InvalidAmount`, `InvalidTerm`, `InvalidRate`, or
/// `ExceedsPolicyLimit`. Never clamps silently.
pub fn normalize(input: &RawLoanInput) -> ChamaWalletResult<LoanTerms> {
    if input.principal <= Decimal::ZERO {
        return Err(ChamaWalletError::InvalidAmount {
            field: "principal".into(),
            reason: "Principal must be positive".into(),
        });
    }

    if input.term_months < Decimal::ONE {
        return Err(ChamaWalletError::InvalidTerm(
            "Term must be at least 1 month".into(),
        ));
    }
    if !input.term_months.fract().is_zero() {
        return Err(ChamaWalletError::InvalidTerm(format!(
            "Term must be a whole number of months, got {}",
            input.term_months
        )));
    }
    let term_months = input.term_months.to_u32().ok_or_else(|| {
        ChamaWalletError::InvalidTerm(format!("Term {} is out of range", input.term_months))
    })?;

    if input.annual_interest_rate_pct < Decimal::ZERO {
        return Err(ChamaWalletError::InvalidRate {
            field: "annual_interest_rate_pct".into(),
            reason: "Interest rate cannot be negative".into(),
        });
    }

    let fee_rate_pct = input.fee_rate_pct.unwrap_or(DEFAULT_FEE_RATE_PCT);
    if fee_rate_pct < Decimal::ZERO {
        return Err(ChamaWalletError::InvalidRate {
            field: "fee_rate_pct".into(),
            reason: "Fee rate cannot be negative".into(),
        });
    }

    if let Some(limit) = input.max_loan_amount {
        if input.principal > limit {
            return Err(ChamaWalletError::ExceedsPolicyLimit {
                requested: input.principal,
                limit,
            });
        }
    }

    Ok(LoanTerms {
        principal: input.principal,
        annual_interest_rate_pct: input.annual_interest_rate_pct,
        term_months,
        fee_rate_pct,
    })
}
