use balance_books::{BooksError, JsonStore, KeywordCategorizer, assign_category, write_transactions_csv};
use balance_core::{Bank, Journal, JournalAccount, JournalEntry};
use balance_ingest::{ParserRegistry, StatementDocument};
use chrono::NaiveDate;

fn statement() -> StatementDocument {
    StatementDocument::from_text(
        "CHASE TOTAL CHECKING\n\
         December 20 - January 23, 2026\n\
         Account Number: 000000987654321\n\
         Beginning Balance $1,000.00\n\
         Ending Balance $1,145.00\n\
         12/28 STARBUCKS STORE 1234 -5.00 995.00\n\
         12/30 ATM WITHDRAWAL -50.00 945.00\n\
         01/05 PAYROLL ACME INC 200.00 1,145.00\n",
    )
}

#[test]
fn test_reimport_adds_nothing() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    let registry = ParserRegistry::default();
    let parser = registry.get(Bank::Chase).unwrap();

    for expected_added in [3, 0] {
        let (account, txns) = parser.parse(&statement()).unwrap().into_parts();
        store.save_account(&account).unwrap();
        let (merged, added) = store.save_transactions_for_account(&account.id, &txns).unwrap();
        assert_eq!(added, expected_added);
        assert_eq!(merged.len(), 3);
    }

    let accounts = store.load_accounts().unwrap();
    assert_eq!(accounts.len(), 1);
    let account = accounts.values().next().unwrap();
    assert_eq!(account.balance.map(|b| b.to_string()), Some("1145.00".to_string()));
}

#[test]
fn test_categorize_then_export() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    let (account, txns) = ParserRegistry::default()
        .get(Bank::Chase)
        .unwrap()
        .parse(&statement())
        .unwrap()
        .into_parts();
    store.save_account(&account).unwrap();
    store.save_transactions_for_account(&account.id, &txns).unwrap();

    // No categories configured: the defaults apply.
    for t in &txns {
        assign_category(&store, &account.id, &t.id, None, &KeywordCategorizer).unwrap();
    }
    let stored = store
        .transactions_between(Some(&account.id), NaiveDate::from_ymd_opt(2026, 1, 1), None)
        .unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].category.as_deref(), Some("income"));

    let all = store.load_transactions(&account.id).unwrap();
    let categories: Vec<_> = all.iter().map(|t| t.category.as_deref().unwrap_or("")).collect();
    assert_eq!(categories, vec!["dining", "other", "income"]);

    let mut out = Vec::new();
    write_transactions_csv(&mut out, &all).unwrap();
    assert_eq!(String::from_utf8(out).unwrap().lines().count(), 4);
}

#[test]
fn test_journal_on_imported_account() {
    let dir = tempfile::tempdir().unwrap();
    let store = JsonStore::open(dir.path()).unwrap();
    let (account, txns) = ParserRegistry::default()
        .get(Bank::Chase)
        .unwrap()
        .parse(&statement())
        .unwrap()
        .into_parts();
    store.save_account(&account).unwrap();
    store.save_transactions_for_account(&account.id, &txns).unwrap();

    // Imported accounts are already known, so creating one by hand clashes.
    assert!(matches!(store.create_account(&account), Err(BooksError::AccountExists(_))));

    let day = |m, d| NaiveDate::from_ymd_opt(2026, m, d).unwrap();
    let journal = Journal::new(&account.id, "January payroll", day(1, 1), day(1, 31)).unwrap();
    store.create_journal(&journal).unwrap();

    let payroll = txns.iter().find(|t| t.is_credit()).unwrap();
    store
        .add_journal_entry(
            &journal.id,
            JournalEntry::new(payroll.posting_date, JournalAccount::Cash, &payroll.description, payroll.amount, 0.into()),
        )
        .unwrap();
    let journal = store
        .add_journal_entry(
            &journal.id,
            JournalEntry::new(payroll.posting_date, JournalAccount::Sales, &payroll.description, 0.into(), payroll.amount),
        )
        .unwrap();

    let ledger = journal.ledger().unwrap();
    assert_eq!(ledger.len(), 2);
    assert_eq!(ledger[0].account, JournalAccount::Cash);
    assert_eq!(ledger[0].balance.to_string(), "200.00");
    assert_eq!(ledger[1].balance.to_string(), "-200.00");
    assert_eq!(store.list_journals(Some(&account.id)).unwrap().len(), 1);
}
