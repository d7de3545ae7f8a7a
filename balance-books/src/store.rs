//! Local JSON store for accounts and their transactions.
//!
//! Layout under the data directory:
//!   accounts.json                   { "<account id>": Account, ... }
//!   transactions/<account id>.json  [Transaction, ...] sorted by posting date
//!   journals.json                   [Journal, ...] in creation order
//!
//! Writes go through a temp file in the same directory and are renamed into
//! place, so a crash never leaves a half-written file behind.

use balance_core::category::find_duplicate_name;
use balance_core::{Account, Category, Transaction};
use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{BooksError, Result};

const ACCOUNTS_FILE: &str = "accounts.json";
const TRANSACTIONS_DIR: &str = "transactions";

#[derive(Debug, Clone)]
pub struct JsonStore {
    dir: PathBuf,
}

impl JsonStore {
    /// Open (creating if needed) a store rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(dir.join(TRANSACTIONS_DIR))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn accounts_path(&self) -> PathBuf {
        self.dir.join(ACCOUNTS_FILE)
    }

    fn transactions_path(&self, account_id: &str) -> Result<PathBuf> {
        let valid = !account_id.is_empty()
            && account_id
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(BooksError::InvalidAccountId(account_id.to_string()));
        }
        Ok(self.dir.join(TRANSACTIONS_DIR).join(format!("{account_id}.json")))
    }

    pub fn load_accounts(&self) -> Result<BTreeMap<String, Account>> {
        Ok(read_json(&self.accounts_path())?.unwrap_or_default())
    }

    pub fn load_account(&self, account_id: &str) -> Result<Option<Account>> {
        Ok(self.load_accounts()?.remove(account_id))
    }

    /// Insert or replace an account.
    ///
    /// Categories already stored for the account survive an update that
    /// carries none (a freshly parsed statement never has categories).
    pub fn save_account(&self, account: &Account) -> Result<()> {
        let mut accounts = self.load_accounts()?;
        let mut account = account.clone();
        if account.categories.is_empty() {
            if let Some(existing) = accounts.get(&account.id) {
                account.categories = existing.categories.clone();
            }
        }
        accounts.insert(account.id.clone(), account);
        write_json(&self.accounts_path(), &accounts)
    }

    /// Register a manually created account. Fails if the id is taken.
    pub fn create_account(&self, account: &Account) -> Result<()> {
        if let Some(name) = find_duplicate_name(&account.categories) {
            return Err(BooksError::DuplicateCategory(name.to_string()));
        }
        let mut accounts = self.load_accounts()?;
        if accounts.contains_key(&account.id) {
            return Err(BooksError::AccountExists(account.id.clone()));
        }
        accounts.insert(account.id.clone(), account.clone());
        write_json(&self.accounts_path(), &accounts)?;
        debug!(account_id = %account.id, "created account");
        Ok(())
    }

    /// Replace an account's category list. Names must be unique.
    pub fn set_categories(&self, account_id: &str, categories: Vec<Category>) -> Result<Account> {
        if let Some(name) = find_duplicate_name(&categories) {
            return Err(BooksError::DuplicateCategory(name.to_string()));
        }
        let mut accounts = self.load_accounts()?;
        let account = accounts
            .get_mut(account_id)
            .ok_or_else(|| BooksError::AccountNotFound(account_id.to_string()))?;
        account.categories = categories;
        let updated = account.clone();
        write_json(&self.accounts_path(), &accounts)?;
        Ok(updated)
    }

    pub fn load_transactions(&self, account_id: &str) -> Result<Vec<Transaction>> {
        Ok(read_json(&self.transactions_path(account_id)?)?.unwrap_or_default())
    }

    /// Transactions of every known account, each account's list in date order
    pub fn load_all_transactions(&self) -> Result<Vec<Transaction>> {
        let mut all = Vec::new();
        for account_id in self.load_accounts()?.keys() {
            all.extend(self.load_transactions(account_id)?);
        }
        Ok(all)
    }

    /// Merge `transactions` into the account's stored list.
    ///
    /// Returns the merged list and how many transactions were new.
    pub fn save_transactions_for_account(
        &self,
        account_id: &str,
        transactions: &[Transaction],
    ) -> Result<(Vec<Transaction>, usize)> {
        let existing = self.load_transactions(account_id)?;
        let (merged, added) = merge_transactions(existing, transactions);
        write_json(&self.transactions_path(account_id)?, &merged)?;
        debug!(account_id, added, total = merged.len(), "saved transactions");
        Ok((merged, added))
    }

    pub fn find_transaction(&self, account_id: &str, transaction_id: &str) -> Result<Option<Transaction>> {
        Ok(self
            .load_transactions(account_id)?
            .into_iter()
            .find(|t| t.id == transaction_id))
    }

    /// Filter by account (all accounts when `None`) and inclusive date bounds.
    pub fn transactions_between(
        &self,
        account_id: Option<&str>,
        from: Option<NaiveDate>,
        to: Option<NaiveDate>,
    ) -> Result<Vec<Transaction>> {
        let transactions = match account_id {
            Some(id) => self.load_transactions(id)?,
            None => self.load_all_transactions()?,
        };
        Ok(transactions
            .into_iter()
            .filter(|t| from.is_none_or(|f| t.posting_date >= f))
            .filter(|t| to.is_none_or(|end| t.posting_date <= end))
            .collect())
    }

    /// Set a transaction's category. `false` when the transaction is unknown.
    pub fn update_transaction_category(&self, account_id: &str, transaction_id: &str, category: &str) -> Result<bool> {
        let mut transactions = self.load_transactions(account_id)?;
        let Some(txn) = transactions.iter_mut().find(|t| t.id == transaction_id) else {
            return Ok(false);
        };
        txn.category = Some(category.to_string());
        write_json(&self.transactions_path(account_id)?, &transactions)?;
        Ok(true)
    }
}

/// Union by id, keeping existing records, sorted by posting date.
///
/// Ties keep their relative order (existing first, then incoming as given).
pub fn merge_transactions(existing: Vec<Transaction>, incoming: &[Transaction]) -> (Vec<Transaction>, usize) {
    let mut seen: HashSet<String> = existing.iter().map(|t| t.id.clone()).collect();
    let mut merged = existing;
    let mut added = 0;
    for txn in incoming {
        if seen.insert(txn.id.clone()) {
            merged.push(txn.clone());
            added += 1;
        }
    }
    merged.sort_by_key(|t| t.posting_date);
    (merged, added)
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if !path.exists() {
        return Ok(None);
    }
    let s = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&s)?))
}

pub(crate) fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = tempfile::NamedTempFile::new_in(dir)?;
    serde_json::to_writer_pretty(&mut tmp, value)?;
    tmp.write_all(b"\n")?;
    tmp.persist(path).map_err(|e| BooksError::Io(e.error))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use balance_core::{AccountType, Bank};
    use rust_decimal_macros::dec;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn txn(day: u32, description: &str) -> Transaction {
        Transaction::new("acct1", d(2025, 12, day), description, dec!(-10.00), dec!(100.00)).unwrap()
    }

    fn store() -> (tempfile::TempDir, JsonStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        (dir, store)
    }

    #[test]
    fn test_merge_drops_duplicates_and_sorts() {
        let existing = vec![txn(5, "B"), txn(1, "A")];
        let incoming = vec![txn(3, "C"), txn(5, "B"), txn(3, "C")];
        let (merged, added) = merge_transactions(existing, &incoming);
        assert_eq!(added, 1);
        let descs: Vec<_> = merged.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descs, vec!["A", "C", "B"]);
    }

    #[test]
    fn test_save_transactions_is_idempotent() {
        let (_dir, store) = store();
        let batch = vec![txn(1, "A"), txn(2, "B")];

        let (merged, added) = store.save_transactions_for_account("acct1", &batch).unwrap();
        assert_eq!((merged.len(), added), (2, 2));

        let (merged, added) = store.save_transactions_for_account("acct1", &batch).unwrap();
        assert_eq!((merged.len(), added), (2, 0));
        assert_eq!(store.load_transactions("acct1").unwrap().len(), 2);
    }

    #[test]
    fn test_save_account_keeps_categories() {
        let (_dir, store) = store();
        let mut account = Account::new("acct1", Bank::Chase, AccountType::Debit);
        store.save_account(&account).unwrap();
        store
            .set_categories("acct1", vec![Category::new("dining", "Food out")])
            .unwrap();

        account.balance = Some(dec!(42.00));
        store.save_account(&account).unwrap();

        let loaded = store.load_account("acct1").unwrap().unwrap();
        assert_eq!(loaded.balance, Some(dec!(42.00)));
        assert_eq!(loaded.categories.len(), 1);
    }

    #[test]
    fn test_set_categories_rejects_duplicates_and_unknown_accounts() {
        let (_dir, store) = store();
        store.save_account(&Account::new("acct1", Bank::Chase, AccountType::Debit)).unwrap();

        let dupes = vec![Category::new("a", ""), Category::new("a", "")];
        assert!(matches!(
            store.set_categories("acct1", dupes),
            Err(BooksError::DuplicateCategory(name)) if name == "a"
        ));
        assert!(matches!(
            store.set_categories("nope", vec![]),
            Err(BooksError::AccountNotFound(_))
        ));
    }

    #[test]
    fn test_update_category_and_date_filters() {
        let (_dir, store) = store();
        store.save_account(&Account::new("acct1", Bank::Chase, AccountType::Debit)).unwrap();
        let batch = vec![txn(1, "A"), txn(10, "B"), txn(20, "C")];
        store.save_transactions_for_account("acct1", &batch).unwrap();

        assert!(store.update_transaction_category("acct1", &batch[1].id, "dining").unwrap());
        assert!(!store.update_transaction_category("acct1", "missing", "dining").unwrap());
        let b = store.find_transaction("acct1", &batch[1].id).unwrap().unwrap();
        assert_eq!(b.category.as_deref(), Some("dining"));

        let mid = store
            .transactions_between(None, Some(d(2025, 12, 5)), Some(d(2025, 12, 20)))
            .unwrap();
        let descs: Vec<_> = mid.iter().map(|t| t.description.as_str()).collect();
        assert_eq!(descs, vec!["B", "C"]);
    }

    #[test]
    fn test_create_account_refuses_existing_id() {
        let (_dir, store) = store();
        let mut account = Account::new("acct1", Bank::Marcus, AccountType::Saving);
        account.balance = Some(dec!(250.00));
        store.create_account(&account).unwrap();

        assert!(matches!(
            store.create_account(&Account::new("acct1", Bank::Marcus, AccountType::Saving)),
            Err(BooksError::AccountExists(id)) if id == "acct1"
        ));
        assert_eq!(store.load_account("acct1").unwrap().unwrap().balance, Some(dec!(250.00)));
    }

    #[test]
    fn test_rejects_path_like_account_ids() {
        let (_dir, store) = store();
        assert!(matches!(
            store.load_transactions("../etc"),
            Err(BooksError::InvalidAccountId(_))
        ));
    }
}
