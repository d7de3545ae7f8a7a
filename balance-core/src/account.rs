//! Account types: institutions, account kinds and the account descriptor itself.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::category::Category;
use crate::ids::short_hash;

/// Institutions whose statements we know about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Bank {
    Chase,
    Marcus,
    Coinbase,
    Webull,
}

impl Bank {
    pub const ALL: [Bank; 4] = [Bank::Chase, Bank::Marcus, Bank::Coinbase, Bank::Webull];

    pub fn as_str(&self) -> &'static str {
        match self {
            Bank::Chase => "chase",
            Bank::Marcus => "marcus",
            Bank::Coinbase => "coinbase",
            Bank::Webull => "webull",
        }
    }

    /// Human-readable institution name
    pub fn display_name(&self) -> &'static str {
        match self {
            Bank::Chase => "Chase Bank",
            Bank::Marcus => "Marcus by Goldman Sachs",
            Bank::Coinbase => "Coinbase",
            Bank::Webull => "Webull",
        }
    }
}

impl fmt::Display for Bank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Bank {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "chase" => Ok(Bank::Chase),
            "marcus" | "goldman" | "goldmansachs" => Ok(Bank::Marcus),
            "coinbase" => Ok(Bank::Coinbase),
            "webull" => Ok(Bank::Webull),
            other => Err(format!("unknown bank: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccountType {
    Debit,
    Credit,
    Saving,
    Investment,
}

impl AccountType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountType::Debit => "debit",
            AccountType::Credit => "credit",
            AccountType::Saving => "saving",
            AccountType::Investment => "investment",
        }
    }

    /// Classify an account from statement wording.
    ///
    /// "credit card" wins over "saving", which wins over brokerage wording;
    /// everything else is a debit (checking) account.
    pub fn classify(text: &str) -> Self {
        let lower = text.to_lowercase();
        if lower.contains("credit card") {
            AccountType::Credit
        } else if lower.contains("saving") {
            AccountType::Saving
        } else if lower.contains("brokerage") || lower.contains("investment account") {
            AccountType::Investment
        } else {
            AccountType::Debit
        }
    }
}

impl fmt::Display for AccountType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AccountType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "debit" | "checking" => Ok(AccountType::Debit),
            "credit" | "credit_card" => Ok(AccountType::Credit),
            "saving" | "savings" => Ok(AccountType::Saving),
            "investment" => Ok(AccountType::Investment),
            other => Err(format!("unknown account type: {other}")),
        }
    }
}

/// A bank account as disclosed by its statements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    /// Pseudonymized identifier derived from the disclosed account number
    pub id: String,
    pub bank: Bank,
    pub account_type: AccountType,
    /// Latest known balance, if any
    #[serde(default)]
    pub balance: Option<Decimal>,
    /// Ordered category list used when categorizing this account's transactions
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Account {
    pub fn new(id: impl Into<String>, bank: Bank, account_type: AccountType) -> Self {
        Self {
            id: id.into(),
            bank,
            account_type,
            balance: None,
            categories: Vec::new(),
        }
    }

    /// Build an account whose id is the pseudonym of `account_number` at `bank`.
    pub fn from_account_number(account_number: &str, bank: Bank, account_type: AccountType) -> Self {
        Self::new(account_id_for(bank, account_number), bank, account_type)
    }

    /// Names of the configured categories, in order
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        self.categories.iter().map(|c| c.name.as_str())
    }

    pub fn has_category(&self, name: &str) -> bool {
        self.categories.iter().any(|c| c.name == name)
    }
}

/// Stable pseudonym for an account number disclosed by `bank`.
///
/// Scoped by bank: Marcus prints only the last four digits, which can equal
/// another institution's number. Whitespace is ignored so "0001 2345" and
/// "00012345" collide.
pub fn account_id_for(bank: Bank, account_number: &str) -> String {
    let normalized: String = account_number.chars().filter(|c| !c.is_whitespace()).collect();
    short_hash(&format!("{bank}:{normalized}"))
}
