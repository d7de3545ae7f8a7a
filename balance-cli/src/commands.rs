//! Command implementations behind the `balance` subcommands.

use anyhow::{Context, Result, bail};
use balance_books::{JournalUpdate, JsonStore, KeywordCategorizer, assign_category, write_transactions_csv};
use balance_core::{
    Account, AccountType, Bank, Category, Journal, JournalAccount, JournalEntry, Transaction, account_id_for,
    default_categories,
};
use balance_ingest::{BalanceCheck, ParseOptions, ParserRegistry, StatementDocument, Table};
use chrono::{Local, NaiveDate};
use rust_decimal::Decimal;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::config::{self, Config};
use crate::llm::{LlmCategorizer, LlmClient};

/// Where an import reads its statement from.
#[derive(Debug)]
pub enum ImportSource {
    Document(PathBuf),
    Text { text: PathBuf, tables: Option<PathBuf> },
}

impl ImportSource {
    pub fn new(document: Option<PathBuf>, text: Option<PathBuf>, tables: Option<PathBuf>) -> Result<Self> {
        match (document, text) {
            (Some(doc), None) => Ok(Self::Document(doc)),
            (None, Some(text)) => Ok(Self::Text { text, tables }),
            (Some(_), Some(_)) => bail!("pass either a document or --text, not both"),
            (None, None) => bail!("nothing to import: pass a document path or --text <file>"),
        }
    }

    fn load(&self) -> Result<StatementDocument> {
        match self {
            Self::Document(path) => {
                let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
                serde_json::from_str(&s).with_context(|| format!("parse statement document {}", path.display()))
            }
            Self::Text { text, tables } => {
                let body = fs::read_to_string(text).with_context(|| format!("read {}", text.display()))?;
                let doc = StatementDocument::from_text(body);
                match tables {
                    Some(path) => {
                        let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
                        let tables: Vec<Table> =
                            serde_json::from_str(&s).with_context(|| format!("parse tables {}", path.display()))?;
                        Ok(doc.with_tables(tables))
                    }
                    None => Ok(doc),
                }
            }
        }
    }
}

fn open_store(cfg: &Config) -> Result<JsonStore> {
    let dir = cfg.data_dir()?;
    JsonStore::open(&dir).with_context(|| format!("open store at {}", dir.display()))
}

pub fn cmd_import(source: ImportSource, bank: Bank, lenient_period: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let store = open_store(&cfg)?;
    let doc = source.load()?;

    let registry = ParserRegistry::default();
    let parser = registry.get(bank)?;
    let options = ParseOptions {
        lenient_period: lenient_period || cfg.ingest.lenient_period,
        today: None,
    };
    let parsed = parser
        .parse_with(&doc, options)
        .with_context(|| format!("parse {} statement", bank.display_name()))?;

    if let BalanceCheck::Advisory { difference } = parsed.balance_check {
        warn!(%difference, "statement does not reconcile; imported anyway");
    }
    if parsed.undated_rows > 0 {
        warn!(rows = parsed.undated_rows, "rows skipped: date outside the statement period");
    }

    let period = parsed.period;
    let (mut account, transactions) = parsed.into_parts();
    let (merged, added) = store.save_transactions_for_account(&account.id, &transactions)?;
    if let Some(latest) = merged.last() {
        account.balance = Some(latest.new_balance);
    }
    store.save_account(&account)?;
    info!(account = %account.id, added, total = merged.len(), "import complete");

    println!("{} {} account {}", bank.display_name(), account.account_type, account.id);
    println!("Period: {period}");
    println!(
        "Parsed {} transactions, {} new, {} stored",
        transactions.len(),
        added,
        merged.len()
    );
    if let Some(balance) = account.balance {
        println!("Balance: {balance}");
    }
    Ok(())
}

pub fn cmd_accounts() -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let accounts = store.load_accounts()?;
    if accounts.is_empty() {
        println!("No accounts yet. Import a statement: balance import <document.json> --bank chase");
        return Ok(());
    }
    for account in accounts.values() {
        println!(
            "{}  {:<8} {:<10} categories={}",
            account.id,
            account.bank.as_str(),
            account.account_type.as_str(),
            account.categories.len()
        );
    }
    Ok(())
}

/// A hand-made account. Without a number the id is derived from bank and
/// type, which allows one such account per pair.
fn manual_account(
    bank: Bank,
    account_type: AccountType,
    number: Option<&str>,
    balance: Option<Decimal>,
    with_defaults: bool,
) -> Account {
    let id = account_id_for(bank, number.unwrap_or(account_type.as_str()));
    let mut account = Account::new(id, bank, account_type);
    account.balance = balance;
    if with_defaults {
        account.categories = default_categories();
    }
    account
}

pub fn cmd_accounts_create(
    bank: Bank,
    account_type: AccountType,
    number: Option<&str>,
    balance: Option<Decimal>,
    with_defaults: bool,
) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let account = manual_account(bank, account_type, number, balance, with_defaults);
    store.create_account(&account)?;
    info!(account = %account.id, "account created");
    println!("{}  {:<8} {}", account.id, bank.as_str(), account_type.as_str());
    Ok(())
}

pub fn cmd_balance(account_id: Option<&str>) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let accounts = store.load_accounts()?;
    let selected: Vec<_> = match account_id {
        Some(id) => vec![accounts.get(id).with_context(|| format!("account {id} not found"))?],
        None => accounts.values().collect(),
    };
    for account in selected {
        let balance = account
            .balance
            .map(|b| b.to_string())
            .unwrap_or_else(|| "-".to_string());
        println!("{}  {:<8} {}", account.id, account.bank.as_str(), balance);
    }
    Ok(())
}

pub fn cmd_transactions(account_id: Option<&str>, from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let txns = store.transactions_between(account_id, from, to)?;
    for t in &txns {
        print_transaction(t);
    }
    let (out, inflow) = flow_totals(&txns).context("transaction totals overflowed")?;
    println!("\n{} transactions, {out} out, {inflow} in", txns.len());
    Ok(())
}

/// Money out (as a positive number) and money in.
fn flow_totals(txns: &[Transaction]) -> Option<(Decimal, Decimal)> {
    txns.iter().try_fold((Decimal::ZERO, Decimal::ZERO), |(out, inflow), t| {
        if t.is_debit() {
            Some((out.checked_sub(t.amount)?, inflow))
        } else if t.is_credit() {
            Some((out, inflow.checked_add(t.amount)?))
        } else {
            Some((out, inflow))
        }
    })
}

fn print_transaction(t: &Transaction) {
    println!(
        "{}  {}  {:>12}  {:>12}  {:<14} {}",
        t.id,
        t.posting_date,
        t.amount,
        t.new_balance,
        t.category.as_deref().unwrap_or("-"),
        t.description
    );
}

pub fn cmd_categories_list(account_id: &str) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let account = store
        .load_account(account_id)?
        .with_context(|| format!("account {account_id} not found"))?;
    if account.categories.is_empty() {
        println!("No categories set; the defaults apply:");
        print_categories(&default_categories());
    } else {
        print_categories(&account.categories);
    }
    Ok(())
}

fn print_categories(categories: &[Category]) {
    for c in categories {
        println!("{:<16} {}", c.name, c.description);
    }
}

pub fn cmd_categories_set(account_id: &str, file: Option<&Path>, defaults: bool) -> Result<()> {
    let categories = match (file, defaults) {
        (_, true) => default_categories(),
        (Some(path), false) => {
            let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
            serde_json::from_str::<Vec<Category>>(&s).with_context(|| format!("parse categories {}", path.display()))?
        }
        (None, false) => bail!("pass --file <categories.json> or --defaults"),
    };
    let store = open_store(&config::load_config()?)?;
    let account = store.set_categories(account_id, categories)?;
    println!("{} categories set on {}", account.categories.len(), account.id);
    Ok(())
}

pub fn cmd_categorize(account_id: &str, transaction_id: &str, category: Option<&str>, ai: bool) -> Result<()> {
    let cfg = config::load_config()?;
    let store = open_store(&cfg)?;
    let chosen = if ai {
        let categorizer = LlmCategorizer::new(LlmClient::from_config(&cfg.llm)?);
        assign_category(&store, account_id, transaction_id, category, &categorizer)?
    } else {
        assign_category(&store, account_id, transaction_id, category, &KeywordCategorizer)?
    };
    println!("{transaction_id} -> {chosen}");
    Ok(())
}

pub fn cmd_export(
    account_id: Option<&str>,
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
    output: Option<&Path>,
) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let txns = store.transactions_between(account_id, from, to)?;
    match output {
        Some(path) => {
            let file = fs::File::create(path).with_context(|| format!("create {}", path.display()))?;
            write_transactions_csv(file, &txns)?;
            info!(path = %path.display(), rows = txns.len(), "exported");
        }
        None => write_transactions_csv(io::stdout().lock(), &txns)?,
    }
    Ok(())
}

pub fn cmd_journal_create(
    account_id: &str,
    description: &str,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let (default_start, default_end) = Journal::default_period(Local::now().date_naive());
    let journal = Journal::new(
        account_id,
        description,
        start.unwrap_or(default_start),
        end.unwrap_or(default_end),
    )?;
    store.create_journal(&journal)?;
    info!(journal = %journal.id, account = account_id, "journal created");
    print_journal(&journal);
    Ok(())
}

pub fn cmd_journal_update(
    journal_id: &str,
    description: Option<String>,
    start: Option<NaiveDate>,
    end: Option<NaiveDate>,
    entries: Option<&Path>,
) -> Result<()> {
    let entries = entries.map(read_entries).transpose()?;
    let store = open_store(&config::load_config()?)?;
    let journal = store.update_journal(
        journal_id,
        JournalUpdate {
            description,
            start_date: start,
            end_date: end,
            entries,
        },
    )?;
    print_journal(&journal);
    Ok(())
}

fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    let s = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    serde_json::from_str(&s).with_context(|| format!("parse journal entries {}", path.display()))
}

pub fn cmd_journal_list(account_id: Option<&str>) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let journals = store.list_journals(account_id)?;
    if journals.is_empty() {
        println!("No journals. Start one: balance journal create --account <id> --description <text>");
        return Ok(());
    }
    for journal in &journals {
        print_journal(journal);
    }
    Ok(())
}

pub fn cmd_journal_add_entry(
    journal_id: &str,
    date: Option<NaiveDate>,
    account: JournalAccount,
    description: &str,
    debit: Decimal,
    credit: Decimal,
) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let date = date.unwrap_or_else(|| Local::now().date_naive());
    let entry = JournalEntry::new(date, account, description, debit, credit);
    let entry_id = entry.id.clone();
    let journal = store.add_journal_entry(journal_id, entry)?;
    if date < journal.start_date || date > journal.end_date {
        warn!(%date, journal = journal_id, "entry dated outside the journal period");
    }
    println!("{entry_id} added to {journal_id} ({} entries)", journal.entries.len());
    Ok(())
}

pub fn cmd_journal_remove_entry(journal_id: &str, entry_id: &str) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let removed = store.remove_journal_entry(journal_id, entry_id)?;
    println!("removed {} {}", removed.id, removed.description);
    Ok(())
}

pub fn cmd_journal_ledger(journal_id: &str) -> Result<()> {
    let store = open_store(&config::load_config()?)?;
    let journal = store
        .find_journal(journal_id)?
        .with_context(|| format!("journal {journal_id} not found"))?;
    for line in journal.ledger()? {
        println!(
            "{:<20} {}  {:>12}  {:>12}  {:>12}",
            line.account, line.date, line.debit, line.credit, line.balance
        );
    }
    Ok(())
}

fn print_journal(journal: &Journal) {
    println!(
        "{}  {}  {}..{}  entries={}  {}",
        journal.id,
        journal.account_id,
        journal.start_date,
        journal.end_date,
        journal.entries.len(),
        journal.description
    );
    for e in &journal.entries {
        println!(
            "    {}  {}  {:<20} {:>12} {:>12}  {}",
            e.id, e.date, e.account, e.debit, e.credit, e.description
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_import_source_requires_exactly_one_input() {
        assert!(ImportSource::new(None, None, None).is_err());
        assert!(ImportSource::new(Some("a.json".into()), Some("a.txt".into()), None).is_err());
        assert!(matches!(
            ImportSource::new(Some("a.json".into()), None, None),
            Ok(ImportSource::Document(_))
        ));
    }

    #[test]
    fn test_import_source_loads_text_with_tables() {
        let dir = tempfile::tempdir().unwrap();
        let text = dir.path().join("statement.txt");
        let tables = dir.path().join("tables.json");
        fs::write(&text, "Account Number: 42\n").unwrap();
        fs::write(&tables, r#"[[["12/05", "AMAZON.COM", null, "(42.17)"]]]"#).unwrap();

        let doc = ImportSource::new(None, Some(text), Some(tables)).unwrap().load().unwrap();
        assert_eq!(doc.full_text(), "Account Number: 42\n");
        let rows: Vec<_> = doc.table_rows().collect();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0][2], None);
    }

    #[test]
    fn test_manual_account_ids() {
        let by_type = manual_account(Bank::Marcus, AccountType::Saving, None, None, false);
        assert_eq!(by_type.id, account_id_for(Bank::Marcus, "saving"));
        assert!(by_type.categories.is_empty());

        let by_number = manual_account(Bank::Marcus, AccountType::Saving, Some("4821"), Some(Decimal::ONE_HUNDRED), true);
        assert_eq!(by_number.id, account_id_for(Bank::Marcus, "4821"));
        assert_eq!(by_number.balance, Some(Decimal::ONE_HUNDRED));
        assert_eq!(by_number.categories, default_categories());
    }

    #[test]
    fn test_flow_totals_split_debits_and_credits() {
        let d = NaiveDate::from_ymd_opt(2025, 12, 3).unwrap();
        let txns = vec![
            Transaction::new("a", d, "COFFEE", Decimal::new(-450, 2), Decimal::new(10000, 2)).unwrap(),
            Transaction::new("a", d, "PAYROLL", Decimal::new(200000, 2), Decimal::new(9550, 2)).unwrap(),
            Transaction::new("a", d, "ADJUSTMENT", Decimal::ZERO, Decimal::new(209550, 2)).unwrap(),
        ];
        assert_eq!(
            flow_totals(&txns),
            Some((Decimal::new(450, 2), Decimal::new(200000, 2)))
        );
        assert_eq!(flow_totals(&[]), Some((Decimal::ZERO, Decimal::ZERO)));
    }

    #[test]
    fn test_read_entries_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("entries.json");
        fs::write(
            &path,
            r#"[{"date": "2026-01-02", "account": "sales", "description": "Invoice 7", "debit": "0", "credit": "75.00"}]"#,
        )
        .unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].account, JournalAccount::Sales);
        assert!(read_entries(&dir.path().join("missing.json")).is_err());
    }

    #[test]
    fn test_import_source_loads_json_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("doc.json");
        fs::write(&path, r#"{"pages": [{"text": "p1"}, {"text": "p2", "tables": []}]}"#).unwrap();

        let doc = ImportSource::Document(path).load().unwrap();
        assert_eq!(doc.full_text(), "p1\np2");
    }
}
