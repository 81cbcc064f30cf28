use rust_decimal::Decimal;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ChamaWalletError {
    #[error("Invalid amount: {field} — {reason}")]
    InvalidAmount { field: String, reason: String },

    #[error("Invalid term: {0}")]
    InvalidTerm(String),

    #[error("Invalid rate: {field} — {reason}")]
    InvalidRate { field: String, reason: String },

    #[error("Requested principal {requested} exceeds the group loan limit of {limit}")]
    ExceedsPolicyLimit { requested: Decimal, limit: Decimal },

    #[error("Loan {loan_id} is {status}; {operation} is not permitted")]
    InvalidLoanState {
        loan_id: String,
        status: String,
        operation: String,
    },

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<serde_json::Error> for ChamaWalletError {
    fn from(e: serde_json::Error) -> Self {
        ChamaWalletError::SerializationError(e.to_string())
    }
}
