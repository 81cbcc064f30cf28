pub mod credit;
pub mod ledger;
pub mod loan;
