//! Bank statement parsers.
//!
//! Each bank supplies account-info and balance extraction plus its policy
//! flags; the pipeline itself (period, rows, year inference, ordering,
//! reconciliation, validation) is shared by every variant through
//! [`StatementParser::parse_with`].

pub mod chase;
pub mod marcus;

use balance_core::{Account, AccountType, Bank, Transaction};
use chrono::{Local, NaiveDate};
use regex::Regex;
use rust_decimal::Decimal;
use std::collections::HashMap;
use tracing::{info, warn};

use crate::document::StatementDocument;
use crate::error::{IngestError, Result, Stage};
use crate::extract::{RowSource, UndatedRowPolicy, extract, parse_amount};
use crate::period::{self, StatementPeriod};
use crate::reconcile::{reconcile, validate};

pub use chase::ChaseParser;
pub use marcus::MarcusParser;

/// Account details disclosed by a statement
#[derive(Debug, Clone, PartialEq)]
pub struct AccountInfo {
    pub account_number: String,
    pub account_type: AccountType,
}

/// Opening and closing balances printed on a statement
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Balances {
    pub starting: Decimal,
    pub ending: Decimal,
}

/// How a failed `starting + sum(amounts) == ending` check is treated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BalancePolicy {
    /// Mismatch fails the parse
    Strict,
    /// Mismatch is logged and reported in the outcome
    Advisory,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsePolicy {
    pub balance: BalancePolicy,
    pub undated_rows: UndatedRowPolicy,
}

/// Caller-side knobs for one parse
#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    /// Fall back to a synthesized period instead of failing when none is printed
    pub lenient_period: bool,
    /// Reference date for the lenient period; defaults to the local date
    pub today: Option<NaiveDate>,
}

/// Result of the ending-balance cross-check
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BalanceCheck {
    Verified,
    /// `declared - computed`, only produced under [`BalancePolicy::Advisory`]
    Advisory { difference: Decimal },
}

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedStatement {
    pub account: Account,
    /// Date ordered, balances chained from `starting_balance`
    pub transactions: Vec<Transaction>,
    pub period: StatementPeriod,
    pub starting_balance: Decimal,
    pub ending_balance: Decimal,
    pub balance_check: BalanceCheck,
    pub source: RowSource,
    /// Rows dropped because their date fell outside the period
    pub undated_rows: usize,
}

impl ParsedStatement {
    pub fn into_parts(self) -> (Account, Vec<Transaction>) {
        (self.account, self.transactions)
    }
}

pub trait StatementParser: Send + Sync {
    fn bank(&self) -> Bank;

    fn policy(&self) -> ParsePolicy;

    fn account_info(&self, text: &str) -> Result<AccountInfo>;

    fn balances(&self, text: &str) -> Result<Balances>;

    fn parse(&self, document: &StatementDocument) -> Result<ParsedStatement> {
        self.parse_with(document, ParseOptions::default())
    }

    /// account info → balances → period → rows (with year inference) →
    /// date sort → reconciliation → validation
    fn parse_with(&self, document: &StatementDocument, options: ParseOptions) -> Result<ParsedStatement> {
        let text = document.full_text();
        let policy = self.policy();

        let info = self.account_info(&text)?;
        let mut account = Account::from_account_number(&info.account_number, self.bank(), info.account_type);

        let balances = self.balances(&text)?;

        let period = if options.lenient_period {
            let today = options.today.unwrap_or_else(|| Local::now().date_naive());
            period::resolve_lenient(&text, today)
        } else {
            period::resolve(&text)?
        };

        let mut extraction = extract(document.table_rows(), &text, &period, policy.undated_rows)?;
        if extraction.rows.is_empty() {
            return Err(IngestError::NoTransactionsParsed);
        }
        extraction.rows.sort_by_key(|r| r.date);

        let transactions = reconcile(&account.id, balances.starting, &extraction.rows)?;

        let balance_check = match validate(balances.starting, &transactions, balances.ending) {
            Ok(()) => BalanceCheck::Verified,
            Err(IngestError::BalanceMismatch { computed, declared, .. })
                if policy.balance == BalancePolicy::Advisory =>
            {
                let difference = declared.checked_sub(computed).ok_or_else(|| IngestError::Overflow {
                    stage: Stage::Validation,
                    at: "balance difference".to_string(),
                })?;
                warn!(bank = %self.bank(), %difference, "statement balances do not reconcile");
                BalanceCheck::Advisory { difference }
            }
            Err(err) => return Err(err),
        };

        account.balance = Some(transactions.last().map_or(balances.starting, |t| t.new_balance));

        info!(
            bank = %self.bank(),
            account_type = %account.account_type,
            %period,
            transactions = transactions.len(),
            "parsed statement"
        );

        Ok(ParsedStatement {
            account,
            transactions,
            period,
            starting_balance: balances.starting,
            ending_balance: balances.ending,
            balance_check,
            source: extraction.source,
            undated_rows: extraction.undated,
        })
    }
}

/// Bank → parser lookup
pub struct ParserRegistry {
    parsers: HashMap<Bank, Box<dyn StatementParser>>,
}

impl ParserRegistry {
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
        }
    }

    pub fn register(&mut self, parser: Box<dyn StatementParser>) {
        self.parsers.insert(parser.bank(), parser);
    }

    pub fn get(&self, bank: Bank) -> Result<&dyn StatementParser> {
        self.parsers
            .get(&bank)
            .map(|p| p.as_ref())
            .ok_or(IngestError::UnsupportedBank(bank))
    }

    /// Registered banks in declaration order
    pub fn banks(&self) -> Vec<Bank> {
        Bank::ALL.into_iter().filter(|b| self.parsers.contains_key(b)).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(Box::new(ChaseParser));
        registry.register(Box::new(MarcusParser));
        registry
    }
}

/// First capture of `re` in `text`, trimmed
pub(crate) fn first_capture<'t>(re: &Regex, text: &'t str) -> Option<&'t str> {
    re.captures(text).and_then(|c| c.get(1)).map(|m| m.as_str().trim())
}

/// Amount captured by `re`, or [`IngestError::NoBalanceFound`]
pub(crate) fn balance_after(re: &Regex, text: &str, which: &'static str) -> Result<Decimal> {
    first_capture(re, text)
        .and_then(parse_amount)
        .ok_or(IngestError::NoBalanceFound { which })
}
