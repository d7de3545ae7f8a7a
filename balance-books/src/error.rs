//! Error types for the books (storage + categorization) layer

use thiserror::Error;

#[derive(Error, Debug)]
pub enum BooksError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("invalid account id: {0:?}")]
    InvalidAccountId(String),

    #[error("account {0} not found")]
    AccountNotFound(String),

    #[error("account {0} already exists")]
    AccountExists(String),

    #[error("journal {0} not found")]
    JournalNotFound(String),

    #[error("journal entry {0} not found")]
    JournalEntryNotFound(String),

    #[error(transparent)]
    Journal(#[from] balance_core::JournalError),

    #[error("transaction {0} not found")]
    TransactionNotFound(String),

    #[error("category '{name}' not found in account categories (valid: {})", valid.join(", "))]
    UnknownCategory { name: String, valid: Vec<String> },

    #[error("duplicate category name: {0}")]
    DuplicateCategory(String),

    #[error("categorization failed: {0}")]
    Categorizer(String),
}

pub type Result<T> = std::result::Result<T, BooksError>;
