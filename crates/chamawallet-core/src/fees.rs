//! Origination / processing fee arithmetic.
//!
//! The fee is an upfront percentage of principal deducted at disbursement.
//! Pure arithmetic with no error conditions: a zero fee rate is valid.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::terms::LoanTerms;
use crate::types::{Money, Rate};

const PERCENT: Decimal = dec!(100);
const OUTPUT_DP: u32 = 2;

/// Fee charged on a loan and the amount actually paid out.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeeBreakdown {
    pub fee_amount: Money,
    pub net_disbursed: Money,
}

/// Processing fee and net disbursement for a loan.
///
/// `net_disbursed + fee_amount == principal` holds exactly: the net amount
/// is derived by subtraction from the rounded fee.
pub fn compute_fee(terms: &LoanTerms) -> FeeBreakdown {
    compute_fee_for(terms.principal, terms.fee_rate_pct)
}

/// Fee breakdown from a bare principal and fee rate, for callers that have
/// not yet assembled full loan terms.
pub fn compute_fee_for(principal: Money, fee_rate_pct: Rate) -> FeeBreakdown {
    let fee_amount = (principal * fee_rate_pct / PERCENT).round_dp(OUTPUT_DP);
    FeeBreakdown {
        fee_amount,
        net_disbursed: principal - fee_amount,
    }
}
