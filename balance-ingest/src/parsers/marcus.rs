//! Marcus online savings statement parser
//!
//! Expected extracted text:
//!   Statement Period: December 20 - January 23, 2026
//!   Online Savings Account ending in 4821
//!   Beginning Balance $10,000.00
//!   Ending Balance $10,036.12
//!   12/31 Interest Paid 36.12 10,036.12
//!
//! Marcus statements occasionally carry pending activity with dates outside
//! the period; those rows are dropped. Balance mismatches are reported
//! rather than fatal.

use balance_core::{AccountType, Bank};
use regex::Regex;
use std::sync::OnceLock;

use super::{AccountInfo, BalancePolicy, Balances, ParsePolicy, StatementParser, balance_after, first_capture};
use crate::error::{IngestError, Result};
use crate::extract::UndatedRowPolicy;

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)Account\s*(?:Number|No\.?|#|ending\s+in)[:\s]*(\d+)").expect("invalid account number regex")
    })
}

fn beginning_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Beginning|Opening|Previous)\s*Balance[:\s]*(\(?-?\$?[\d,]+(?:\.\d+)?\)?)")
            .expect("invalid beginning balance regex")
    })
}

fn ending_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Ending|Closing|Current)\s*Balance[:\s]*(\(?-?\$?[\d,]+(?:\.\d+)?\)?)")
            .expect("invalid ending balance regex")
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MarcusParser;

impl StatementParser for MarcusParser {
    fn bank(&self) -> Bank {
        Bank::Marcus
    }

    fn policy(&self) -> ParsePolicy {
        ParsePolicy {
            balance: BalancePolicy::Advisory,
            undated_rows: UndatedRowPolicy::Skip,
        }
    }

    fn account_info(&self, text: &str) -> Result<AccountInfo> {
        let account_number = first_capture(account_number_re(), text).ok_or(IngestError::NoAccountNumberFound)?;
        // Marcus only offers savings and CDs; anything not flagged otherwise is savings.
        let account_type = match AccountType::classify(text) {
            AccountType::Debit => AccountType::Saving,
            other => other,
        };
        Ok(AccountInfo {
            account_number: account_number.to_string(),
            account_type,
        })
    }

    fn balances(&self, text: &str) -> Result<Balances> {
        Ok(Balances {
            starting: balance_after(beginning_balance_re(), text, "beginning")?,
            ending: balance_after(ending_balance_re(), text, "ending")?,
        })
    }
}
