//! Error types for statement ingestion

use balance_core::Bank;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

/// Pipeline stage a failure belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Registry,
    AccountInfo,
    Balances,
    Period,
    Rows,
    Reconciliation,
    Validation,
}

/// Coarse classification of ingest failures
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Account number, balance line or period missing: format unrecognized
    StructuralParse,
    /// Format recognized but no transaction rows survived extraction
    NoTransactionsParsed,
    /// Arithmetic integrity check failed
    BalanceMismatch,
    /// A row's date cannot be placed inside the statement period
    DateInference,
    /// No parser registered for the requested bank
    Unsupported,
    /// A running balance or total left `Decimal` range
    Overflow,
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IngestError {
    #[error("no parser registered for {0}")]
    UnsupportedBank(Bank),

    #[error("could not find an account number in the statement")]
    NoAccountNumberFound,

    #[error("could not find the {which} balance in the statement")]
    NoBalanceFound { which: &'static str },

    #[error("could not find the statement period")]
    PeriodNotFound,

    #[error("no transactions could be parsed from the statement")]
    NoTransactionsParsed,

    #[error(
        "balance mismatch: starting ({starting}) + transactions ({total}) = {computed}, but ending balance is {declared}"
    )]
    BalanceMismatch {
        starting: Decimal,
        total: Decimal,
        computed: Decimal,
        declared: Decimal,
    },

    #[error("balance arithmetic overflowed at {at}")]
    Overflow { stage: Stage, at: String },

    #[error("could not place {month:02}/{day:02} within statement period {start} to {end}")]
    DateInference {
        month: u32,
        day: u32,
        start: NaiveDate,
        end: NaiveDate,
    },
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::UnsupportedBank(_) => ErrorKind::Unsupported,
            IngestError::NoAccountNumberFound
            | IngestError::NoBalanceFound { .. }
            | IngestError::PeriodNotFound => ErrorKind::StructuralParse,
            IngestError::NoTransactionsParsed => ErrorKind::NoTransactionsParsed,
            IngestError::BalanceMismatch { .. } => ErrorKind::BalanceMismatch,
            IngestError::DateInference { .. } => ErrorKind::DateInference,
            IngestError::Overflow { .. } => ErrorKind::Overflow,
        }
    }

    pub fn stage(&self) -> Stage {
        match self {
            IngestError::UnsupportedBank(_) => Stage::Registry,
            IngestError::NoAccountNumberFound => Stage::AccountInfo,
            IngestError::NoBalanceFound { .. } => Stage::Balances,
            IngestError::PeriodNotFound => Stage::Period,
            IngestError::NoTransactionsParsed | IngestError::DateInference { .. } => Stage::Rows,
            IngestError::BalanceMismatch { .. } => Stage::Validation,
            IngestError::Overflow { stage, .. } => *stage,
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
