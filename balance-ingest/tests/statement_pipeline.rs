use balance_core::{Bank, find_chain_break};
use balance_ingest::{
    BalanceCheck, ErrorKind, IngestError, ParseOptions, ParserRegistry, RowSource, Stage, StatementDocument,
    StatementParser,
};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn chase_statement(ending: &str, rows: &[(&str, &str, &str)]) -> StatementDocument {
    let header = format!(
        "CHASE TOTAL CHECKING\n\
         December 20 - January 23, 2026\n\
         Account Number: 000000987654321\n\
         Beginning Balance $1,000.00\n\
         Ending Balance ${ending}\n"
    );
    let table = rows
        .iter()
        .map(|(date, desc, amount)| vec![Some(date.to_string()), Some(desc.to_string()), Some(amount.to_string())])
        .collect();
    StatementDocument::from_text(header).with_tables(vec![table])
}

fn chase() -> ParserRegistry {
    ParserRegistry::default()
}

#[test]
fn test_end_to_end_reconciles() {
    let registry = chase();
    let parser = registry.get(Bank::Chase).unwrap();
    let doc = chase_statement("1,150.00", &[("01/05", "PAYROLL", "200.00"), ("12/28", "ATM WITHDRAWAL", "(50.00)")]);

    let (account, txns) = parser.parse(&doc).unwrap().into_parts();

    assert_eq!(account.balance, Some(dec!(1150.00)));
    assert_eq!(txns.len(), 2);
    assert_eq!(txns[0].posting_date, NaiveDate::from_ymd_opt(2025, 12, 28).unwrap());
    assert_eq!((txns[0].previous_balance, txns[0].new_balance), (dec!(1000.00), dec!(950.00)));
    assert_eq!(txns[1].posting_date, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
    assert_eq!((txns[1].previous_balance, txns[1].new_balance), (dec!(950.00), dec!(1150.00)));
}

#[test]
fn test_end_to_end_mismatch() {
    let registry = chase();
    let parser = registry.get(Bank::Chase).unwrap();
    let doc = chase_statement("1,200.00", &[("12/28", "ATM WITHDRAWAL", "(50.00)"), ("01/05", "PAYROLL", "200.00")]);

    let err = parser.parse(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::BalanceMismatch);
    assert_eq!(err.stage(), Stage::Validation);
}

#[test]
fn test_balances_chain_and_sum_to_declared_difference() {
    let rows = [
        ("12/21", "GROCERY", "(82.45)"),
        ("12/22", "REFUND", "12.00"),
        ("12/22", "RENT", "(1,200.00)"),
        ("12/31", "INTEREST", "0.37"),
        ("01/02", "PAYROLL", "2,500.00"),
        ("01/20", "UTILITY", "(120.10)"),
    ];
    let total: Decimal = dec!(-82.45) + dec!(12.00) - dec!(1200.00) + dec!(0.37) + dec!(2500.00) - dec!(120.10);
    let ending = dec!(1000.00) + total;
    let doc = chase_statement(&ending.to_string(), &rows);

    let parsed = chase().get(Bank::Chase).unwrap().parse(&doc).unwrap();
    let txns = &parsed.transactions;

    assert_eq!(find_chain_break(txns), None);
    assert_eq!(txns[0].previous_balance, parsed.starting_balance);
    for pair in txns.windows(2) {
        assert_eq!(pair[1].previous_balance, pair[0].new_balance);
        assert!(pair[0].posting_date <= pair[1].posting_date);
    }
    for t in txns {
        assert_eq!(t.new_balance, t.previous_balance + t.amount);
    }
    let sum: Decimal = txns.iter().map(|t| t.amount).sum();
    assert_eq!(sum, parsed.ending_balance - parsed.starting_balance);
}

#[test]
fn test_reparse_yields_identical_ids() {
    let doc = chase_statement("1,150.00", &[("12/28", "ATM WITHDRAWAL", "(50.00)"), ("01/05", "PAYROLL", "200.00")]);
    let registry = chase();
    let parser = registry.get(Bank::Chase).unwrap();

    let first = parser.parse(&doc).unwrap();
    let second = parser.parse(&doc).unwrap();
    let ids = |p: &balance_ingest::ParsedStatement| p.transactions.iter().map(|t| t.id.clone()).collect::<Vec<_>>();

    assert_eq!(ids(&first), ids(&second));
    assert_eq!(first.account.id, second.account.id);
}

#[test]
fn test_no_rows_is_an_error() {
    let doc = chase_statement("1,000.00", &[("Total", "Deposits", "0.00")]);
    let err = chase().get(Bank::Chase).unwrap().parse(&doc).unwrap_err();
    assert_eq!(err, IngestError::NoTransactionsParsed);
    assert_eq!(err.kind(), ErrorKind::NoTransactionsParsed);
}

#[test]
fn test_lenient_period_fallback() {
    let doc = StatementDocument::from_text(
        "Account Number: 42\nBeginning Balance $10.00\nEnding Balance $5.00\n01/03 COFFEE -5.00 5.00\n",
    );
    let registry = chase();
    let parser = registry.get(Bank::Chase).unwrap();

    let strict = parser.parse(&doc).unwrap_err();
    assert_eq!(strict.kind(), ErrorKind::StructuralParse);
    assert_eq!(strict.stage(), Stage::Period);

    let options = ParseOptions {
        lenient_period: true,
        today: NaiveDate::from_ymd_opt(2026, 2, 10),
    };
    let parsed = parser.parse_with(&doc, options).unwrap();
    assert_eq!(parsed.transactions[0].posting_date, NaiveDate::from_ymd_opt(2025, 1, 3).unwrap());
}

#[test]
fn test_same_number_at_two_banks_does_not_collide() {
    let chase_doc = StatementDocument::from_text(
        "December 20 - January 23, 2026\nAccount Number: 4821\nBeginning Balance $100.00\nEnding Balance $95.00\n\
         12/28 COFFEE -5.00 95.00\n",
    );
    let marcus_doc = StatementDocument::from_text(
        "December 20 - January 23, 2026\nAccount ending in 4821\nBeginning Balance $100.00\nEnding Balance $95.00\n\
         12/28 COFFEE -5.00 95.00\n",
    );
    let registry = ParserRegistry::default();
    let chase = registry.get(Bank::Chase).unwrap().parse(&chase_doc).unwrap();
    let marcus = registry.get(Bank::Marcus).unwrap().parse(&marcus_doc).unwrap();

    assert_ne!(chase.account.id, marcus.account.id);
    assert_ne!(chase.transactions[0].id, marcus.transactions[0].id);
}

#[test]
fn test_oversized_amounts_fail_without_panicking() {
    let huge = "79,228,162,514,264,337,593,543,950,335";
    let doc = chase_statement("1,000.00", &[("12/28", "NOISE", huge), ("12/29", "NOISE", huge)]);

    let err = chase().get(Bank::Chase).unwrap().parse(&doc).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert_eq!(err.stage(), Stage::Reconciliation);
}

#[test]
fn test_wrong_printed_running_balance_still_parses() {
    let doc = StatementDocument::from_text(
        "December 20 - January 23, 2026\n\
         Account Number: 42\n\
         Beginning Balance $1,000.00\n\
         Ending Balance $1,150.00\n\
         12/28 ATM WITHDRAWAL -50.00 940.00\n\
         01/05 PAYROLL 200.00 1,150.00\n",
    );
    let parsed = chase().get(Bank::Chase).unwrap().parse(&doc).unwrap();

    assert_eq!(parsed.source, RowSource::Text);
    assert_eq!(parsed.transactions[0].new_balance, dec!(950.00));
    assert_eq!(parsed.transactions[1].new_balance, dec!(1150.00));
    assert_eq!(parsed.balance_check, BalanceCheck::Verified);
}

#[test]
fn test_card_purchase_keeps_authorization_date() {
    let doc = chase_statement("995.00", &[("12/28", "Card Purchase 12/26 STARBUCKS STORE 1234", "(5.00)")]);
    let parsed = chase().get(Bank::Chase).unwrap().parse(&doc).unwrap();

    let txn = &parsed.transactions[0];
    assert_eq!(txn.posting_date, NaiveDate::from_ymd_opt(2025, 12, 28).unwrap());
    assert_eq!(txn.transaction_date, NaiveDate::from_ymd_opt(2025, 12, 26));
}
