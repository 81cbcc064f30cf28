mod commands;
mod input;
mod output;

use clap::{Parser, Subcommand, ValueEnum};
use colored::Colorize;
use std::process;

use commands::credit::ProfileArgs;
use commands::ledger::{ApproveArgs, RejectArgs, RepayArgs};
use commands::loan::{AmortizeArgs, FeeArgs};

/// Loan accounting for chama savings groups
#[derive(Parser)]
#[command(
    name = "chama",
    version,
    about = "Loan accounting for chama savings groups",
    long_about = "A CLI for the ChamaWallet loan accounting engine with decimal \
                  precision. Supports loan amortization schedules, processing fees, \
                  the repayment lifecycle, and borrower credit profiles."
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output format
    #[arg(long, default_value = "json", global = true)]
    output: OutputFormat,
}

#[derive(Subcommand)]
enum Commands {
    /// Compute the amortization schedule for a loan
    Amortize(AmortizeArgs),
    /// Compute the processing fee and net disbursement
    Fee(FeeArgs),
    /// Approve a pending loan
    Approve(ApproveArgs),
    /// Reject a pending loan
    Reject(RejectArgs),
    /// Record a repayment against a loan
    Repay(RepayArgs),
    /// Compute a borrower's credit profile from loan history
    CreditProfile(ProfileArgs),
    /// Print version information
    Version,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Csv,
    Minimal,
}

fn main() {
    let cli = Cli::parse();

    let result: Result<serde_json::Value, Box<dyn std::error::Error>> = match cli.command {
        Commands::Amortize(args) => commands::loan::run_amortize(args),
        Commands::Fee(args) => commands::loan::run_fee(args),
        Commands::Approve(args) => commands::ledger::run_approve(args),
        Commands::Reject(args) => commands::ledger::run_reject(args),
        Commands::Repay(args) => commands::ledger::run_repay(args),
        Commands::CreditProfile(args) => commands::credit::run_profile(args),
        Commands::Version => {
            println!("chama {}", env!("CARGO_PKG_VERSION"));
            return;
        }
    };

    match result {
        Ok(value) => {
            output::format_output(&cli.output, &value);
            process::exit(0);
        }
        Err(e) => {
            eprintln!("{}: {}", "error".red().bold(), e);
            process::exit(1);
        }
    }
}
