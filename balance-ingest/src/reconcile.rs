//! Running-balance reconciliation.

use balance_core::Transaction;
use rust_decimal::Decimal;
use tracing::{debug, warn};

use crate::error::{IngestError, Result, Stage};
use crate::extract::DatedRow;

/// Turn date-ordered rows into transactions with chained balances.
///
/// Each transaction's `previous_balance` is the running balance before it
/// and its `new_balance` the running balance after it. Fails with
/// [`IngestError::Overflow`] when the running balance leaves `Decimal` range.
pub fn reconcile(account_id: &str, starting_balance: Decimal, rows: &[DatedRow]) -> Result<Vec<Transaction>> {
    let mut running = starting_balance;
    let mut transactions = Vec::with_capacity(rows.len());
    for row in rows {
        let mut txn = Transaction::new(account_id, row.date, row.description.as_str(), row.amount, running)
            .ok_or_else(|| IngestError::Overflow {
                stage: Stage::Reconciliation,
                at: format!("{} {}", row.date, row.description),
            })?;
        if let Some(date) = row.transaction_date {
            txn = txn.with_transaction_date(date);
        }
        running = txn.new_balance;
        if let Some(printed) = row.printed_balance {
            if printed != txn.new_balance {
                warn!(
                    date = %row.date,
                    description = %row.description,
                    %printed,
                    computed = %txn.new_balance,
                    "printed running balance differs from reconciled balance"
                );
            }
        }
        transactions.push(txn);
    }
    Ok(transactions)
}

/// Check `starting + sum(amounts) == declared_ending`.
pub fn validate(starting_balance: Decimal, transactions: &[Transaction], declared_ending: Decimal) -> Result<()> {
    let overflow = || IngestError::Overflow {
        stage: Stage::Validation,
        at: "statement total".to_string(),
    };
    let total = transactions
        .iter()
        .try_fold(Decimal::ZERO, |acc, t| acc.checked_add(t.amount))
        .ok_or_else(overflow)?;
    let computed = starting_balance.checked_add(total).ok_or_else(overflow)?;
    debug!(%starting_balance, %total, %computed, %declared_ending, "validating balances");

    if computed != declared_ending {
        return Err(IngestError::BalanceMismatch {
            starting: starting_balance,
            total,
            computed,
            declared: declared_ending,
        });
    }
    Ok(())
}
