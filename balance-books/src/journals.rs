//! Journal storage on top of [`JsonStore`].
//!
//! Every journal lives in `journals.json`; each change rewrites the file
//! through the store's atomic write.

use balance_core::{Journal, JournalEntry};
use chrono::NaiveDate;
use std::path::PathBuf;
use tracing::debug;

use crate::error::{BooksError, Result};
use crate::store::{JsonStore, read_json, write_json};

const JOURNALS_FILE: &str = "journals.json";

/// Fields to change on an existing journal; `None` leaves a field as is.
#[derive(Debug, Clone, Default)]
pub struct JournalUpdate {
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Replaces the whole entry list
    pub entries: Option<Vec<JournalEntry>>,
}

impl JsonStore {
    fn journals_path(&self) -> PathBuf {
        self.dir().join(JOURNALS_FILE)
    }

    pub fn load_journals(&self) -> Result<Vec<Journal>> {
        Ok(read_json(&self.journals_path())?.unwrap_or_default())
    }

    pub fn find_journal(&self, journal_id: &str) -> Result<Option<Journal>> {
        Ok(self.load_journals()?.into_iter().find(|j| j.id == journal_id))
    }

    /// Journals of one account, or all of them when `account_id` is `None`.
    pub fn list_journals(&self, account_id: Option<&str>) -> Result<Vec<Journal>> {
        Ok(self
            .load_journals()?
            .into_iter()
            .filter(|j| account_id.is_none_or(|id| j.account_id == id))
            .collect())
    }

    /// Store a new journal. Its account must already be known.
    pub fn create_journal(&self, journal: &Journal) -> Result<()> {
        if self.load_account(&journal.account_id)?.is_none() {
            return Err(BooksError::AccountNotFound(journal.account_id.clone()));
        }
        let mut journals = self.load_journals()?;
        journals.push(journal.clone());
        write_json(&self.journals_path(), &journals)?;
        debug!(journal_id = %journal.id, account_id = %journal.account_id, "created journal");
        Ok(())
    }

    /// Apply `update` and return the stored journal. Nothing is written when
    /// any part of the update is rejected.
    pub fn update_journal(&self, journal_id: &str, update: JournalUpdate) -> Result<Journal> {
        self.modify_journal(journal_id, |journal| {
            if let Some(description) = update.description {
                journal.description = description;
            }
            let start = update.start_date.unwrap_or(journal.start_date);
            let end = update.end_date.unwrap_or(journal.end_date);
            journal.set_period(start, end)?;
            if let Some(entries) = update.entries {
                journal.replace_entries(entries)?;
            }
            Ok(journal.clone())
        })
    }

    pub fn add_journal_entry(&self, journal_id: &str, entry: JournalEntry) -> Result<Journal> {
        self.modify_journal(journal_id, |journal| {
            journal.add_entry(entry)?;
            Ok(journal.clone())
        })
    }

    pub fn remove_journal_entry(&self, journal_id: &str, entry_id: &str) -> Result<JournalEntry> {
        self.modify_journal(journal_id, |journal| {
            journal
                .remove_entry(entry_id)
                .ok_or_else(|| BooksError::JournalEntryNotFound(entry_id.to_string()))
        })
    }

    fn modify_journal<T>(&self, journal_id: &str, f: impl FnOnce(&mut Journal) -> Result<T>) -> Result<T> {
        let mut journals = self.load_journals()?;
        let journal = journals
            .iter_mut()
            .find(|j| j.id == journal_id)
            .ok_or_else(|| BooksError::JournalNotFound(journal_id.to_string()))?;
        let out = f(journal)?;
        write_json(&self.journals_path(), &journals)?;
        debug!(journal_id, "updated journal");
        Ok(out)
    }
}
