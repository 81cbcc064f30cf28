use chrono::{NaiveDate, Utc};
use clap::Args;
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::Value;

use chamawallet_core::credit::{self, ScorePolicy};
use chamawallet_core::ledger::{Loan, RepaymentRecord};

use crate::input;

/// Borrower history as supplied by the caller.
#[derive(Deserialize)]
struct HistoryInput {
    loans: Vec<Loan>,
    #[serde(default)]
    repayments: Vec<RepaymentRecord>,
}

/// Arguments for credit profile calculation
#[derive(Args)]
#[command(allow_hyphen_values = true)]
pub struct ProfileArgs {
    /// Path to a JSON file of the form {"loans": [...], "repayments": [...]}
    #[arg(long)]
    pub input: Option<String>,

    /// Classification cut-off date (defaults to today)
    #[arg(long)]
    pub as_of: Option<NaiveDate>,

    /// Weight of repayment completeness
    #[arg(long)]
    pub repayment_weight: Option<Decimal>,

    /// Weight of the on-time ratio
    #[arg(long)]
    pub punctuality_weight: Option<Decimal>,

    /// Weight of history depth
    #[arg(long)]
    pub history_weight: Option<Decimal>,

    /// Days past due a repayment still counts as on-time
    #[arg(long)]
    pub grace_days: Option<i64>,

    /// Lower score bound
    #[arg(long)]
    pub score_floor: Option<Decimal>,

    /// Upper score bound
    #[arg(long)]
    pub score_ceiling: Option<Decimal>,
}

pub fn run_profile(args: ProfileArgs) -> Result<Value, Box<dyn std::error::Error>> {
    let history: HistoryInput = if let Some(ref path) = args.input {
        input::file::read_input(path)?
    } else if let Some(data) = input::stdin::read_stdin()? {
        serde_json::from_value(data)?
    } else {
        return Err(
            "borrower history is required: pass --input <file> or pipe JSON on stdin".into(),
        );
    };

    let defaults = ScorePolicy::default();
    let policy = ScorePolicy {
        repayment_weight: args.repayment_weight.unwrap_or(defaults.repayment_weight),
        punctuality_weight: args
            .punctuality_weight
            .unwrap_or(defaults.punctuality_weight),
        history_weight: args.history_weight.unwrap_or(defaults.history_weight),
        grace_days: args.grace_days.unwrap_or(defaults.grace_days),
        score_floor: args.score_floor.unwrap_or(defaults.score_floor),
        score_ceiling: args.score_ceiling.unwrap_or(defaults.score_ceiling),
    };

    let as_of = args.as_of.unwrap_or_else(|| Utc::now().date_naive());
    let result =
        credit::compute_credit_profile(&history.loans, &history.repayments, as_of, &policy)?;
    Ok(serde_json::to_value(result)?)
}
