//! balance-ingest: bank statement ingestion from extracted PDF text/tables.

pub mod dates;
pub mod document;
pub mod error;
pub mod extract;
pub mod parsers;
pub mod period;
pub mod reconcile;

pub use dates::infer_date;
pub use document::{Page, StatementDocument, Table, TableRow};
pub use error::{ErrorKind, IngestError, Result, Stage};
pub use extract::{RawRow, RowSource, UndatedRowPolicy, parse_amount};
pub use parsers::{
    BalanceCheck, BalancePolicy, ParseOptions, ParsePolicy, ParsedStatement, ParserRegistry, StatementParser,
};
pub use period::StatementPeriod;
