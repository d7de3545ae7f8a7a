//! Bookkeeping journals: debit/credit entries kept against a bank account
//! over a date range.

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;
use uuid::Uuid;

/// Bookkeeping account an entry is posted to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JournalAccount {
    Cash,
    AccountsPayable,
    AccountsReceivable,
    General,
    Sales,
    Equipment,
    Wage,
    Land,
}

impl JournalAccount {
    pub const ALL: [JournalAccount; 8] = [
        JournalAccount::Cash,
        JournalAccount::AccountsPayable,
        JournalAccount::AccountsReceivable,
        JournalAccount::General,
        JournalAccount::Sales,
        JournalAccount::Equipment,
        JournalAccount::Wage,
        JournalAccount::Land,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            JournalAccount::Cash => "cash",
            JournalAccount::AccountsPayable => "accounts_payable",
            JournalAccount::AccountsReceivable => "accounts_receivable",
            JournalAccount::General => "general",
            JournalAccount::Sales => "sales",
            JournalAccount::Equipment => "equipment",
            JournalAccount::Wage => "wage",
            JournalAccount::Land => "land",
        }
    }
}

impl fmt::Display for JournalAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for JournalAccount {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase().replace('-', "_");
        JournalAccount::ALL
            .into_iter()
            .find(|a| a.as_str() == wanted)
            .ok_or_else(|| format!("unknown journal account: {s}"))
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum JournalError {
    #[error("journal period starts {start} after it ends {end}")]
    InvalidPeriod { start: NaiveDate, end: NaiveDate },

    #[error("entry {entry}: debit and credit must not be negative")]
    NegativeAmount { entry: String },

    #[error("entry {entry}: debit or credit must be non-zero")]
    EmptyEntry { entry: String },

    #[error("ledger balance overflowed for {0}")]
    Overflow(JournalAccount),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    /// Generated when absent, so hand-written entry files may omit it
    #[serde(default = "new_id")]
    pub id: String,
    pub date: NaiveDate,
    pub account: JournalAccount,
    pub description: String,
    pub debit: Decimal,
    pub credit: Decimal,
}

impl JournalEntry {
    pub fn new(
        date: NaiveDate,
        account: JournalAccount,
        description: impl Into<String>,
        debit: Decimal,
        credit: Decimal,
    ) -> Self {
        Self {
            id: new_id(),
            date,
            account,
            description: description.into(),
            debit,
            credit,
        }
    }

    fn check(&self) -> Result<(), JournalError> {
        if self.debit.is_sign_negative() && !self.debit.is_zero()
            || self.credit.is_sign_negative() && !self.credit.is_zero()
        {
            return Err(JournalError::NegativeAmount { entry: self.id.clone() });
        }
        if self.debit.is_zero() && self.credit.is_zero() {
            return Err(JournalError::EmptyEntry { entry: self.id.clone() });
        }
        Ok(())
    }
}

/// One ledger line: an entry's movement and the account's running balance after it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AccountLedger {
    pub account: JournalAccount,
    pub date: NaiveDate,
    pub debit: Decimal,
    pub credit: Decimal,
    /// Cumulative `debit - credit` for `account`
    pub balance: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Journal {
    pub id: String,
    pub account_id: String,
    pub description: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    #[serde(default)]
    pub entries: Vec<JournalEntry>,
}

impl Journal {
    pub fn new(
        account_id: impl Into<String>,
        description: impl Into<String>,
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Self, JournalError> {
        check_period(start_date, end_date)?;
        Ok(Self {
            id: new_id(),
            account_id: account_id.into(),
            description: description.into(),
            start_date,
            end_date,
            entries: Vec::new(),
        })
    }

    /// `today` through the last day of its month.
    pub fn default_period(today: NaiveDate) -> (NaiveDate, NaiveDate) {
        let (year, month) = if today.month() == 12 {
            (today.year() + 1, 1)
        } else {
            (today.year(), today.month() + 1)
        };
        let end = NaiveDate::from_ymd_opt(year, month, 1)
            .and_then(|first| first.pred_opt())
            .unwrap_or(today);
        (today, end)
    }

    pub fn set_period(&mut self, start_date: NaiveDate, end_date: NaiveDate) -> Result<(), JournalError> {
        check_period(start_date, end_date)?;
        self.start_date = start_date;
        self.end_date = end_date;
        Ok(())
    }

    pub fn add_entry(&mut self, entry: JournalEntry) -> Result<(), JournalError> {
        entry.check()?;
        self.entries.push(entry);
        Ok(())
    }

    /// Replace every entry; nothing changes if any entry is invalid.
    pub fn replace_entries(&mut self, entries: Vec<JournalEntry>) -> Result<(), JournalError> {
        entries.iter().try_for_each(JournalEntry::check)?;
        self.entries = entries;
        Ok(())
    }

    pub fn remove_entry(&mut self, entry_id: &str) -> Option<JournalEntry> {
        let pos = self.entries.iter().position(|e| e.id == entry_id)?;
        Some(self.entries.remove(pos))
    }

    /// Per-account running balances, grouped by account then ordered by date.
    pub fn ledger(&self) -> Result<Vec<AccountLedger>, JournalError> {
        let mut entries: Vec<&JournalEntry> = self.entries.iter().collect();
        entries.sort_by_key(|e| (e.account, e.date));

        let mut lines = Vec::with_capacity(entries.len());
        let mut current: Option<(JournalAccount, Decimal)> = None;
        for e in entries {
            let carried = match current {
                Some((account, balance)) if account == e.account => balance,
                _ => Decimal::ZERO,
            };
            let balance = carried
                .checked_add(e.debit)
                .and_then(|b| b.checked_sub(e.credit))
                .ok_or(JournalError::Overflow(e.account))?;
            current = Some((e.account, balance));
            lines.push(AccountLedger {
                account: e.account,
                date: e.date,
                debit: e.debit,
                credit: e.credit,
                balance,
            });
        }
        Ok(lines)
    }
}

fn new_id() -> String {
    Uuid::new_v4().to_string()
}

fn check_period(start: NaiveDate, end: NaiveDate) -> Result<(), JournalError> {
    if start > end {
        return Err(JournalError::InvalidPeriod { start, end });
    }
    Ok(())
}
