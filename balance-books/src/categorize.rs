//! Transaction categorization: deterministic keyword rules, LLM prompt
//! plumbing, and assignment of a category to a stored transaction.

use balance_core::{Category, default_categories};
use serde::Deserialize;
use tracing::{debug, info};

use crate::error::{BooksError, Result};
use crate::store::JsonStore;

/// Anything that can pick one category name for a transaction description.
pub trait Categorizer {
    fn categorize(&self, description: &str, categories: &[Category]) -> Result<String>;
}

/// Description-keyword rules, checked top to bottom.
///
/// Order matters: "UBER EATS" must hit dining before "UBER" hits transportation.
const KEYWORD_RULES: &[(&str, &[&str])] = &[
    ("fees", &["SERVICE FEE", "SERVICE CHARGE", "OVERDRAFT", "ATM FEE", "LATE FEE", "FOREIGN TRANSACTION FEE"]),
    ("income", &["PAYROLL", "DIRECT DEP", "SALARY", "INTEREST PAID", "DIVIDEND", "STIPEND"]),
    ("rent", &["RENT", "LEASE", "APARTMENT", "PROPERTY MGMT", "LANDLORD", "MORTGAGE"]),
    ("transfer", &["TRANSFER", "ZELLE", "VENMO", "REMITLY", "WISE.COM", "PAYMENT THANK YOU", "AUTOPAY"]),
    ("groceries", &["GROCERY", "TRADER JOE", "WHOLE FOODS", "SAFEWAY", "KROGER", "H-E-B", "COSTCO", "ALDI"]),
    ("dining", &["RESTAURANT", "CAFE", "COFFEE", "STARBUCKS", "DOORDASH", "UBER EATS", "GRUBHUB", "PIZZA"]),
    ("utilities", &["ELECTRIC", "PG&E", "WATER", "COMCAST", "XFINITY", "VERIZON", "AT&T", "T-MOBILE", "INTERNET"]),
    ("transportation", &["UBER", "LYFT", "SHELL", "CHEVRON", "EXXON", "PARKING", "CLIPPER", "TRANSIT", "METRO"]),
    ("subscriptions", &["SPOTIFY", "NETFLIX", "HULU", "OPENAI", "ANTHROPIC", "GITHUB", "ICLOUD", "APPLE.COM/BILL", "YOUTUBE"]),
    ("entertainment", &["CINEMA", "THEATRE", "THEATER", "TICKETMASTER", "STEAM", "CONCERT"]),
    ("health", &["PHARMACY", "CVS", "WALGREENS", "DENTAL", "CLINIC", "HOSPITAL", "GYM", "FITNESS"]),
    ("travel", &["AIRLINE", "AIRLINES", "DELTA", "HOTEL", "AIRBNB", "MARRIOTT", "HILTON", "EXPEDIA"]),
    ("shopping", &["AMAZON", "AMZN", "TARGET", "WALMART", "BEST BUY", "IKEA", "EBAY"]),
];

const FALLBACK_CATEGORY: &str = "other";

/// Deterministic categorizer; no network involved.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordCategorizer;

impl Categorizer for KeywordCategorizer {
    fn categorize(&self, description: &str, categories: &[Category]) -> Result<String> {
        let desc = description.to_uppercase();
        let allowed = |name: &str| categories.iter().any(|c| c.name == name);

        let hit = KEYWORD_RULES
            .iter()
            .filter(|(name, _)| allowed(name))
            .find(|(_, keywords)| keywords.iter().any(|k| contains_word(&desc, k)))
            .map(|(name, _)| *name);

        match hit {
            Some(name) => Ok(name.to_string()),
            None if allowed(FALLBACK_CATEGORY) => Ok(FALLBACK_CATEGORY.to_string()),
            None => Err(BooksError::Categorizer(format!("no keyword rule matched {description:?}"))),
        }
    }
}

/// `needle` occurs in `haystack` with no letter or digit directly on either side.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let is_word = |c: Option<char>| c.is_some_and(|c| c.is_ascii_alphanumeric());
    haystack.match_indices(needle).any(|(start, _)| {
        let before = haystack[..start].chars().next_back();
        let after = haystack[start + needle.len()..].chars().next();
        !is_word(before) && !is_word(after)
    })
}

/// Prompt asking an LLM to pick exactly one of `categories`.
pub fn build_categorization_prompt(categories: &[Category], description: &str) -> String {
    let category_list = categories
        .iter()
        .map(|c| format!("- {}: {}", c.name, c.description))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "You are a transaction categorizer. Given a transaction description, assign it to exactly one of the provided categories.\n\
         \n\
         Categories:\n\
         {category_list}\n\
         \n\
         Transaction description: {description}\n\
         \n\
         Return ONLY a JSON object with the category name. Example: {{\"category\": \"groceries\"}}\n\
         The category MUST be one of the names listed above. No explanations or additional text."
    )
}

#[derive(Deserialize)]
struct CategoryReply {
    category: String,
}

/// Pull `{"category": "..."}` out of a model reply and check it against `categories`.
///
/// Tolerates prose or code fences around the JSON object.
pub fn parse_category_reply(reply: &str, categories: &[Category]) -> Result<String> {
    let start = reply.find('{');
    let end = reply.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if s < e => &reply[s..=e],
        _ => return Err(BooksError::Categorizer(format!("no JSON object in reply: {reply:?}"))),
    };
    let parsed: CategoryReply = serde_json::from_str(json)?;
    let name = parsed.category.trim().to_string();
    ensure_known(&name, categories)?;
    Ok(name)
}

fn ensure_known(name: &str, categories: &[Category]) -> Result<()> {
    if categories.iter().any(|c| c.name == name) {
        return Ok(());
    }
    let mut valid: Vec<String> = categories.iter().map(|c| c.name.clone()).collect();
    valid.sort();
    Err(BooksError::UnknownCategory {
        name: name.to_string(),
        valid,
    })
}

/// Assign a category to a stored transaction and return the chosen name.
///
/// A `manual` category must be one of the account's categories. Without one,
/// `categorizer` picks from the account's categories, or from the defaults
/// when the account has none configured.
pub fn assign_category(
    store: &JsonStore,
    account_id: &str,
    transaction_id: &str,
    manual: Option<&str>,
    categorizer: &dyn Categorizer,
) -> Result<String> {
    let account = store
        .load_account(account_id)?
        .ok_or_else(|| BooksError::AccountNotFound(account_id.to_string()))?;
    let txn = store
        .find_transaction(account_id, transaction_id)?
        .ok_or_else(|| BooksError::TransactionNotFound(transaction_id.to_string()))?;

    let category = match manual {
        Some(name) => {
            ensure_known(name, &account.categories)?;
            name.to_string()
        }
        None => {
            let categories = if account.categories.is_empty() {
                default_categories()
            } else {
                account.categories.clone()
            };
            let name = categorizer.categorize(&txn.description, &categories)?;
            ensure_known(&name, &categories)?;
            debug!(description = %txn.description, category = %name, "categorized");
            name
        }
    };

    if !store.update_transaction_category(account_id, transaction_id, &category)? {
        return Err(BooksError::TransactionNotFound(transaction_id.to_string()));
    }
    info!(transaction_id, category = %category, "category assigned");
    Ok(category)
}

#[cfg(test)]
mod tests {
    use super::*;
    use balance_core::{Account, AccountType, Bank, Transaction};
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn categorize(description: &str) -> String {
        KeywordCategorizer
            .categorize(description, &default_categories())
            .unwrap()
    }

    #[test]
    fn test_keyword_rules() {
        assert_eq!(categorize("PAYROLL ACME INC PPD ID: 123"), "income");
        assert_eq!(categorize("UBER EATS 8005928996 CA"), "dining");
        assert_eq!(categorize("UBER *TRIP HELP.UBER.COM"), "transportation");
        assert_eq!(categorize("Card Purchase TRADER JOE'S #123"), "groceries");
        assert_eq!(categorize("Zelle Payment To Landlord"), "rent");
        assert_eq!(categorize("MONTHLY SERVICE FEE"), "fees");
        assert_eq!(categorize("AMAZON.COM*AB12"), "shopping");
        assert_eq!(categorize("SOMETHING UNKNOWN"), "other");
    }

    #[test]
    fn test_keywords_match_whole_words() {
        // "CURRENT" contains RENT, "PARENT" too; neither is rent.
        assert_eq!(categorize("CURRENT ACCOUNT ADJUSTMENT"), "other");
        assert_eq!(categorize("GIFT FROM PARENT"), "other");
    }

    #[test]
    fn test_keyword_respects_account_categories() {
        let cats = vec![Category::new("food", "anything edible")];
        assert!(KeywordCategorizer.categorize("STARBUCKS", &cats).is_err());

        let cats = vec![Category::new("dining", ""), Category::new("other", "")];
        assert_eq!(KeywordCategorizer.categorize("PAYROLL", &cats).unwrap(), "other");
    }

    #[test]
    fn test_prompt_lists_categories() {
        let prompt = build_categorization_prompt(&default_categories(), "STARBUCKS #1234");
        assert!(prompt.contains("- groceries: Grocery stores and supermarkets"));
        assert!(prompt.contains("Transaction description: STARBUCKS #1234"));
        assert!(prompt.contains(r#"{"category": "groceries"}"#));
    }

    #[test]
    fn test_parse_category_reply() {
        let cats = default_categories();
        assert_eq!(parse_category_reply(r#"{"category": "dining"}"#, &cats).unwrap(), "dining");
        assert_eq!(
            parse_category_reply("```json\n{\"category\": \"travel\"}\n```", &cats).unwrap(),
            "travel"
        );
        assert!(matches!(
            parse_category_reply(r#"{"category": "snacks"}"#, &cats),
            Err(BooksError::UnknownCategory { .. })
        ));
        assert!(matches!(
            parse_category_reply("dining", &cats),
            Err(BooksError::Categorizer(_))
        ));
    }

    struct Fixed(&'static str);

    impl Categorizer for Fixed {
        fn categorize(&self, _description: &str, _categories: &[Category]) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn seeded_store() -> (tempfile::TempDir, JsonStore, Transaction) {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonStore::open(dir.path()).unwrap();
        let mut account = Account::new("acct1", Bank::Chase, AccountType::Debit);
        account.categories = vec![Category::new("coffee", "Coffee shops"), Category::new("other", "")];
        store.save_account(&account).unwrap();
        let txn = Transaction::new(
            "acct1",
            NaiveDate::from_ymd_opt(2025, 12, 1).unwrap(),
            "STARBUCKS #1234",
            dec!(-5.25),
            dec!(100.00),
        )
        .unwrap();
        store.save_transactions_for_account("acct1", &[txn.clone()]).unwrap();
        (dir, store, txn)
    }

    #[test]
    fn test_assign_manual_category() {
        let (_dir, store, txn) = seeded_store();
        let name = assign_category(&store, "acct1", &txn.id, Some("coffee"), &KeywordCategorizer).unwrap();
        assert_eq!(name, "coffee");
        let stored = store.find_transaction("acct1", &txn.id).unwrap().unwrap();
        assert_eq!(stored.category.as_deref(), Some("coffee"));

        let err = assign_category(&store, "acct1", &txn.id, Some("dining"), &KeywordCategorizer).unwrap_err();
        assert!(matches!(err, BooksError::UnknownCategory { ref valid, .. } if valid == &["coffee", "other"]));
    }

    #[test]
    fn test_assign_with_categorizer_validates_answer() {
        let (_dir, store, txn) = seeded_store();
        assert_eq!(assign_category(&store, "acct1", &txn.id, None, &Fixed("coffee")).unwrap(), "coffee");
        assert!(assign_category(&store, "acct1", &txn.id, None, &Fixed("rent")).is_err());
        assert!(matches!(
            assign_category(&store, "acct1", "nope", None, &Fixed("coffee")),
            Err(BooksError::TransactionNotFound(_))
        ));
    }
}
