//! Transaction records produced by statement ingestion

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::ids::short_hash;

/// A single posted transaction with its running balances.
///
/// `new_balance == previous_balance + amount` always holds for records built
/// by the ingest pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Content hash of (account, date, description, amount); see [`Transaction::generate_id`]
    pub id: String,
    pub account_id: String,
    /// Date the transaction hit the balance
    pub posting_date: NaiveDate,
    /// Authorization date when the statement prints one
    #[serde(default)]
    pub transaction_date: Option<NaiveDate>,
    pub description: String,
    /// Negative = debit/outflow, positive = credit/inflow
    pub amount: Decimal,
    pub previous_balance: Decimal,
    pub new_balance: Decimal,
    #[serde(default)]
    pub category: Option<String>,
}

impl Transaction {
    /// Build a transaction, deriving its id and `new_balance`.
    ///
    /// `None` when `previous_balance + amount` overflows `Decimal`.
    pub fn new(
        account_id: impl Into<String>,
        posting_date: NaiveDate,
        description: impl Into<String>,
        amount: Decimal,
        previous_balance: Decimal,
    ) -> Option<Self> {
        let new_balance = previous_balance.checked_add(amount)?;
        let account_id = account_id.into();
        let description = description.into();
        Some(Self {
            id: Self::generate_id(&account_id, posting_date, &description, amount),
            account_id,
            posting_date,
            transaction_date: None,
            description,
            amount,
            previous_balance,
            new_balance,
            category: None,
        })
    }

    /// Deterministic id: re-importing the same statement yields the same ids.
    pub fn generate_id(account_id: &str, date: NaiveDate, description: &str, amount: Decimal) -> String {
        short_hash(&format!("{account_id}|{date}|{description}|{amount}"))
    }

    pub fn with_transaction_date(mut self, date: NaiveDate) -> Self {
        self.transaction_date = Some(date);
        self
    }

    pub fn is_debit(&self) -> bool {
        self.amount.is_sign_negative() && !self.amount.is_zero()
    }

    pub fn is_credit(&self) -> bool {
        self.amount.is_sign_positive() && !self.amount.is_zero()
    }

    /// True when `new_balance == previous_balance + amount`
    pub fn is_balanced(&self) -> bool {
        self.previous_balance.checked_add(self.amount) == Some(self.new_balance)
    }
}

/// Check that a date-ordered run of transactions chains its balances.
///
/// Returns the index of the first transaction that breaks the chain.
pub fn find_chain_break(transactions: &[Transaction]) -> Option<usize> {
    if let Some(i) = transactions.iter().position(|t| !t.is_balanced()) {
        return Some(i);
    }
    transactions
        .windows(2)
        .position(|w| w[1].previous_balance != w[0].new_balance)
        .map(|i| i + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn test_generate_id_is_pure() {
        let a = Transaction::generate_id("acct", d(2025, 12, 5), "AMAZON.COM", dec!(-42.17));
        let b = Transaction::generate_id("acct", d(2025, 12, 5), "AMAZON.COM", dec!(-42.17));
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);

        let other_amount = Transaction::generate_id("acct", d(2025, 12, 5), "AMAZON.COM", dec!(-42.18));
        let other_account = Transaction::generate_id("acct2", d(2025, 12, 5), "AMAZON.COM", dec!(-42.17));
        assert_ne!(a, other_amount);
        assert_ne!(a, other_account);
    }

    #[test]
    fn test_new_derives_balance() {
        let t = Transaction::new("acct", d(2025, 12, 1), "ATM", dec!(-50.00), dec!(1000.00)).unwrap();
        assert_eq!(t.new_balance, dec!(950.00));
        assert!(t.is_balanced());
        assert!(t.is_debit());
        assert!(!t.is_credit());
    }

    #[test]
    fn test_new_rejects_overflowing_balance() {
        assert!(Transaction::new("acct", d(2025, 12, 1), "NOISE", Decimal::MAX, dec!(1.00)).is_none());
        assert!(Transaction::new("acct", d(2025, 12, 1), "NOISE", Decimal::MIN, dec!(-1.00)).is_none());
    }

    #[test]
    fn test_find_chain_break() {
        let first = Transaction::new("acct", d(2025, 12, 1), "ATM", dec!(-50.00), dec!(1000.00)).unwrap();
        let second = Transaction::new("acct", d(2025, 12, 2), "PAYROLL", dec!(200.00), dec!(950.00)).unwrap();
        assert_eq!(find_chain_break(&[first.clone(), second.clone()]), None);

        let gap = Transaction::new("acct", d(2025, 12, 2), "PAYROLL", dec!(200.00), dec!(900.00)).unwrap();
        assert_eq!(find_chain_break(&[first, gap]), Some(1));
    }

    #[test]
    fn test_serializes_amounts_as_strings() {
        let t = Transaction::new("acct", d(2025, 12, 1), "ATM", dec!(-50.00), dec!(1000.00)).unwrap();
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["amount"], "-50.00");
        assert_eq!(json["posting_date"], "2025-12-01");
        let back: Transaction = serde_json::from_value(json).unwrap();
        assert_eq!(back, t);
    }
}
