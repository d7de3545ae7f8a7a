//! CSV export of stored transactions.

use balance_core::Transaction;
use std::io::Write;

use crate::error::Result;

const HEADER: [&str; 9] = [
    "id",
    "account_id",
    "posting_date",
    "transaction_date",
    "description",
    "amount",
    "previous_balance",
    "new_balance",
    "category",
];

/// Write `transactions` as CSV with a header row. Missing optional fields are empty cells.
pub fn write_transactions_csv<W: Write>(writer: W, transactions: &[Transaction]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;
    for t in transactions {
        let transaction_date = t.transaction_date.map(|d| d.to_string()).unwrap_or_default();
        wtr.write_record([
            t.id.as_str(),
            t.account_id.as_str(),
            t.posting_date.to_string().as_str(),
            transaction_date.as_str(),
            t.description.as_str(),
            t.amount.to_string().as_str(),
            t.previous_balance.to_string().as_str(),
            t.new_balance.to_string().as_str(),
            t.category.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}
