use anyhow::Result;
use balance_core::{AccountType, Bank, JournalAccount};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

mod auth;
mod commands;
mod config;
mod llm;
mod state;

#[derive(Parser, Debug)]
#[command(name = "balance", version, about = "Bank statement ingestion and local ledger")]
struct Cli {
    /// Debug logging (RUST_LOG overrides)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Parse a statement and merge its transactions into the local store
    Import {
        /// Extracted statement document (JSON: {"pages": [{"text", "tables"}]})
        document: Option<PathBuf>,

        /// Issuing bank (chase, marcus)
        #[arg(long)]
        bank: Bank,

        /// Plain text extraction instead of a JSON document
        #[arg(long, conflicts_with = "document")]
        text: Option<PathBuf>,

        /// Tables (JSON array of tables) to go with --text
        #[arg(long, requires = "text")]
        tables: Option<PathBuf>,

        /// Use a window around today when the statement prints no period
        #[arg(long)]
        lenient_period: bool,
    },

    /// List or create accounts
    Accounts {
        #[command(subcommand)]
        command: Option<AccountsCommand>,
    },

    /// Show current balances
    Balance {
        #[arg(long)]
        account: Option<String>,
    },

    /// List stored transactions
    Transactions {
        #[arg(long)]
        account: Option<String>,

        /// Inclusive start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Inclusive end date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<NaiveDate>,
    },

    /// Manage an account's categories
    Categories {
        #[command(subcommand)]
        command: CategoriesCommand,
    },

    /// Assign a category to a transaction
    Categorize {
        transaction_id: String,

        #[arg(long)]
        account: String,

        /// Category name (must be one of the account's categories)
        #[arg(long, conflicts_with = "ai")]
        category: Option<String>,

        /// Ask the configured LLM instead of the keyword rules
        #[arg(long)]
        ai: bool,
    },

    /// Write stored transactions as CSV
    Export {
        #[arg(long)]
        account: Option<String>,

        #[arg(long)]
        from: Option<NaiveDate>,

        #[arg(long)]
        to: Option<NaiveDate>,

        /// Output file (default: stdout)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Bookkeeping journals kept against an account
    Journal {
        #[command(subcommand)]
        command: JournalCommand,
    },

    /// Manage ~/.balance/config.toml
    Config {
        #[command(subcommand)]
        command: ConfigCommand,
    },
}

#[derive(Subcommand, Debug)]
enum AccountsCommand {
    /// List known accounts (the default)
    List,

    /// Register an account by hand, without importing a statement
    Create {
        #[arg(long)]
        bank: Bank,

        /// debit, credit, saving or investment
        #[arg(long = "type")]
        account_type: AccountType,

        /// Account number; without one the id comes from bank and type
        #[arg(long)]
        number: Option<String>,

        /// Opening balance
        #[arg(long, allow_negative_numbers = true)]
        balance: Option<Decimal>,

        /// Start with the built-in category list
        #[arg(long)]
        default_categories: bool,
    },
}

#[derive(Subcommand, Debug)]
enum JournalCommand {
    /// Start a journal (period defaults to today through month end)
    Create {
        #[arg(long)]
        account: String,

        #[arg(long)]
        description: String,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,
    },

    /// Change a journal's description, period or entries
    Update {
        journal_id: String,

        #[arg(long)]
        description: Option<String>,

        #[arg(long)]
        start: Option<NaiveDate>,

        #[arg(long)]
        end: Option<NaiveDate>,

        /// JSON array of entries replacing the current ones
        #[arg(long)]
        entries: Option<PathBuf>,
    },

    /// List journals
    List {
        #[arg(long)]
        account: Option<String>,
    },

    /// Add a debit/credit entry
    AddEntry {
        journal_id: String,

        /// Entry date (default: today)
        #[arg(long)]
        date: Option<NaiveDate>,

        /// cash, accounts_payable, accounts_receivable, general, sales, equipment, wage, land
        #[arg(long)]
        account: JournalAccount,

        #[arg(long)]
        description: String,

        #[arg(long, default_value = "0")]
        debit: Decimal,

        #[arg(long, default_value = "0")]
        credit: Decimal,
    },

    /// Delete an entry
    RemoveEntry { journal_id: String, entry_id: String },

    /// Running balance per bookkeeping account
    Ledger { journal_id: String },
}

#[derive(Subcommand, Debug)]
enum CategoriesCommand {
    /// Show an account's categories
    List {
        #[arg(long)]
        account: String,
    },

    /// Replace an account's categories
    Set {
        #[arg(long)]
        account: String,

        /// JSON array of {"name", "description"}
        #[arg(long, conflicts_with = "defaults", required_unless_present = "defaults")]
        file: Option<PathBuf>,

        /// Use the built-in category list
        #[arg(long)]
        defaults: bool,
    },
}

#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Write a default config.toml
    Init,
    /// Print the effective config
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG > --verbose > info
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::from_default_env()
    } else if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_target(false).compact().with_writer(std::io::stderr))
        .init();

    match cli.command {
        Command::Import {
            document,
            bank,
            text,
            tables,
            lenient_period,
        } => {
            let source = commands::ImportSource::new(document, text, tables)?;
            commands::cmd_import(source, bank, lenient_period)
        }
        Command::Accounts { command } => match command.unwrap_or(AccountsCommand::List) {
            AccountsCommand::List => commands::cmd_accounts(),
            AccountsCommand::Create {
                bank,
                account_type,
                number,
                balance,
                default_categories,
            } => commands::cmd_accounts_create(bank, account_type, number.as_deref(), balance, default_categories),
        },
        Command::Balance { account } => commands::cmd_balance(account.as_deref()),
        Command::Transactions { account, from, to } => commands::cmd_transactions(account.as_deref(), from, to),
        Command::Categories { command } => match command {
            CategoriesCommand::List { account } => commands::cmd_categories_list(&account),
            CategoriesCommand::Set {
                account,
                file,
                defaults,
            } => commands::cmd_categories_set(&account, file.as_deref(), defaults),
        },
        Command::Categorize {
            transaction_id,
            account,
            category,
            ai,
        } => commands::cmd_categorize(&account, &transaction_id, category.as_deref(), ai),
        Command::Export {
            account,
            from,
            to,
            output,
        } => commands::cmd_export(account.as_deref(), from, to, output.as_deref()),
        Command::Journal { command } => match command {
            JournalCommand::Create {
                account,
                description,
                start,
                end,
            } => commands::cmd_journal_create(&account, &description, start, end),
            JournalCommand::Update {
                journal_id,
                description,
                start,
                end,
                entries,
            } => commands::cmd_journal_update(&journal_id, description, start, end, entries.as_deref()),
            JournalCommand::List { account } => commands::cmd_journal_list(account.as_deref()),
            JournalCommand::AddEntry {
                journal_id,
                date,
                account,
                description,
                debit,
                credit,
            } => commands::cmd_journal_add_entry(&journal_id, date, account, &description, debit, credit),
            JournalCommand::RemoveEntry { journal_id, entry_id } => {
                commands::cmd_journal_remove_entry(&journal_id, &entry_id)
            }
            JournalCommand::Ledger { journal_id } => commands::cmd_journal_ledger(&journal_id),
        },
        Command::Config { command } => match command {
            ConfigCommand::Init => config::init_config(),
            ConfigCommand::Show => config::show_config(),
        },
    }
}
