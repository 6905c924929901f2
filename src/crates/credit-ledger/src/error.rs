//! Error types for credit ledger operations

use rust_decimal::Decimal;
use thiserror::Error;

use crate::model::DeductionBreakdown;

/// Result type for credit ledger operations
pub type Result<T> = std::result::Result<T, LedgerError>;

/// Errors that can occur during credit ledger operations
#[derive(Error, Debug)]
pub enum LedgerError {
    /// Deduction would take the account's usable balance below zero and
    /// `allow_negative` was not set.
    #[error("insufficient credits: required {required}, available {available}")]
    InsufficientCredits {
        required: Decimal,
        available: Decimal,
        breakdown: DeductionBreakdown,
    },

    /// `add`/`deduct` called with a non-positive amount.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// No credit account exists for the given id.
    #[error("credit account not found: {0}")]
    AccountNotFound(String),

    /// Underlying storage error.
    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    /// Serialization error (ledger entry metadata).
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
