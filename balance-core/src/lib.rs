//! balance-core: account, category, transaction and journal value types

pub mod account;
pub mod category;
pub mod ids;
pub mod journal;
pub mod transaction;

pub use account::{Account, AccountType, Bank, account_id_for};
pub use journal::{AccountLedger, Journal, JournalAccount, JournalEntry, JournalError};
pub use category::{Category, DEFAULT_CATEGORIES, default_categories};
pub use transaction::{Transaction, find_chain_break};
