use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use chamawallet_core::amortization;
use chamawallet_core::fees;
use chamawallet_core::terms::{self, RawLoanInput, DEFAULT_FEE_RATE_PCT};

use crate::input;

/// Arguments for amortization schedule calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct AmortizeArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Annual interest rate as a percentage (12.5 = 12.5%/year)
    #[arg(long, alias = "rate")]
    pub annual_rate: Option<Decimal>,

    /// Loan term in months
    #[arg(long)]
    pub term_months: Option<Decimal>,

    /// Processing fee as a percentage of principal (default 2.0)
    #[arg(long)]
    pub fee_rate: Option<Decimal>,

    /// Group policy cap on the principal
    #[arg(long)]
    pub max_loan_amount: Option<Decimal>,
}

/// Arguments for processing fee calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct FeeArgs {
    /// Path to a JSON or YAML input file (overrides individual flags)
    #[arg(long)]
    pub input: Option<String>,

    /// Loan principal
    #[arg(long)]
    pub principal: Option<Decimal>,

    /// Processing fee as a percentage of principal (default 2.0)
    #[arg(long)]
    pub fee_rate: Option<Decimal>,
}

pub fn run_amortize(args: AmortizeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let raw: RawLoanInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        RawLoanInput {
            principal: args
                .principal
                .ok_or("--principal is required (or provide --input)")?,
            annual_interest_rate_pct: args
                .annual_rate
                .ok_or("--annual-rate is required (or provide --input)")?,
            term_months: args
                .term_months
                .ok_or("--term-months is required (or provide --input)")?,
            fee_rate_pct: args.fee_rate,
            max_loan_amount: args.max_loan_amount,
        }
    };

    let loan_terms = terms::normalize(&raw)?;
    let result = amortization::amortize(&loan_terms)?;
    Ok(serde_json::to_value(result)?)
}

pub fn run_fee(args: FeeArgs) -> Result<Value, Box<dyn std::error::Error>> {
    if let Some(ref path) = args.input {
        let raw: RawLoanInput = input::file::read_input(path)?;
        let loan_terms = terms::normalize(&raw)?;
        return Ok(serde_json::to_value(fees::compute_fee(&loan_terms))?);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        let raw: RawLoanInput = serde_json::from_value(data)?;
        let loan_terms = terms::normalize(&raw)?;
        return Ok(serde_json::to_value(fees::compute_fee(&loan_terms))?);
    }

    let principal = args
        .principal
        .ok_or("--principal is required (or provide --input)")?;
    let fee_rate = args.fee_rate.unwrap_or(DEFAULT_FEE_RATE_PCT);
    // Route the bare amounts through the normalizer so negative values are
    // rejected the same way as full loan requests.
    let loan_terms = terms::normalize(&RawLoanInput {
        principal,
        annual_interest_rate_pct: Decimal::ZERO,
        term_months: Decimal::ONE,
        fee_rate_pct: Some(fee_rate),
        max_loan_amount: None,
    })?;
    Ok(serde_json::to_value(fees::compute_fee(&loan_terms))?)
}
