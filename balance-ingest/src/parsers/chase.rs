//! Chase checking/savings statement parser
//!
//! Expected extracted text:
//!   November 25, 2025 through December 19, 2025
//!   Account Number: 000000123456789
//!   CHECKING SUMMARY
//!   Beginning Balance                              $1,000.00
//!   Ending Balance                                 $1,150.00
//!   TRANSACTION DETAIL
//!          DATE        DESCRIPTION                                     AMOUNT     BALANCE
//!          12/01       Card Purchase 11/30 Coffee Shop                 -50.00      950.00
//!
//! Balances must reconcile exactly; a row dated outside the statement period
//! fails the whole statement.

use balance_core::{AccountType, Bank};
use regex::Regex;
use std::sync::OnceLock;

use super::{AccountInfo, BalancePolicy, Balances, ParsePolicy, StatementParser, balance_after, first_capture};
use crate::error::{IngestError, Result};
use crate::extract::UndatedRowPolicy;

fn account_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)Account\s*Number[:\s]*(\d+)").expect("invalid account number regex"))
}

fn beginning_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Beginning|Opening|Starting)\s*Balance[:\s]*(\(?-?\$?[\d,]+(?:\.\d+)?\)?)")
            .expect("invalid beginning balance regex")
    })
}

fn ending_balance_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)(?:Ending|Closing|Final)\s*Balance[:\s]*(\(?-?\$?[\d,]+(?:\.\d+)?\)?)")
            .expect("invalid ending balance regex")
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ChaseParser;

impl StatementParser for ChaseParser {
    fn bank(&self) -> Bank {
        Bank::Chase
    }

    fn policy(&self) -> ParsePolicy {
        ParsePolicy {
            balance: BalancePolicy::Strict,
            undated_rows: UndatedRowPolicy::Abort,
        }
    }

    fn account_info(&self, text: &str) -> Result<AccountInfo> {
        let account_number = first_capture(account_number_re(), text).ok_or(IngestError::NoAccountNumberFound)?;
        Ok(AccountInfo {
            account_number: account_number.to_string(),
            account_type: AccountType::classify(text),
        })
    }

    fn balances(&self, text: &str) -> Result<Balances> {
        Ok(Balances {
            starting: balance_after(beginning_balance_re(), text, "beginning")?,
            ending: balance_after(ending_balance_re(), text, "ending")?,
        })
    }
}
