pub mod amortization;
pub mod credit;
pub mod error;
pub mod fees;
pub mod ledger;
pub mod terms;
pub mod types;

pub use error::ChamaWalletError;
pub use types::*;

/// Standard result type for all loan engine operations
pub type ChamaWalletResult<T> = Result<T, ChamaWalletError>;
