//! balance-books: local account/transaction/journal store, categorization, and CSV export

pub mod categorize;
pub mod error;
pub mod export;
pub mod journals;
pub mod store;

pub use categorize::{
    Categorizer, KeywordCategorizer, assign_category, build_categorization_prompt, parse_category_reply,
};
pub use error::{BooksError, Result};
pub use export::write_transactions_csv;
pub use journals::JournalUpdate;
pub use store::{JsonStore, merge_transactions};
