use chrono::NaiveDate;
use clap::Args;
use rust_decimal::Decimal;
use serde_json::Value;

use chamawallet_core::ledger::{self, Loan, RepaymentMethod};

use crate::input;

/// Arguments for approving a pending loan
#[derive(Args)]
pub struct ApproveArgs {
    /// Path to the loan JSON file (or pipe the loan on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Approval date (YYYY-MM-DD)
    #[arg(long)]
    pub on: NaiveDate,
}

/// Arguments for rejecting a pending loan
#[derive(Args)]
pub struct RejectArgs {
    /// Path to the loan JSON file (or pipe the loan on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Reason recorded against the rejection
    #[arg(long)]
    pub reason: String,
}

/// Arguments for recording a repayment
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct RepayArgs {
    /// Path to the loan JSON file (or pipe the loan on stdin)
    #[arg(long)]
    pub input: Option<String>,

    /// Repayment amount
    #[arg(long)]
    pub amount: Decimal,

    /// Payment channel: cash, mobile_money, bank_transfer, wallet_balance
    #[arg(long, default_value = "mobile_money")]
    pub method: RepaymentMethod,

    /// Date the repayment was received (YYYY-MM-DD)
    #[arg(long)]
    pub on: NaiveDate,
}

pub fn run_approve(args: ApproveArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = load_loan(&args.input)?;
    let approved = ledger::approve(&loan, args.on)?;
    Ok(serde_json::to_value(approved)?)
}

pub fn run_reject(args: RejectArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = load_loan(&args.input)?;
    let rejected = ledger::reject(&loan, &args.reason)?;
    Ok(serde_json::to_value(rejected)?)
}

pub fn run_repay(args: RepayArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let loan = load_loan(&args.input)?;
    let outcome = ledger::record_repayment(&loan, args.amount, args.method, args.on)?;
    Ok(serde_json::to_value(outcome)?)
}

fn load_loan(source: &Option<String>) -> Result<Loan, Box<dyn std::error::Error>> {
    if let Some(path) = source {
        return input::file::read_input(path);
    }
    if let Some(data) = input::stdin::read_stdin()? {
        return Ok(serde_json::from_value(data)?);
    }
    Err("a loan is required: pass --input <file> or pipe the loan JSON on stdin".into())
}
