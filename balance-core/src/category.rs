//! Spending categories attached to accounts

use serde::{Deserialize, Serialize};

/// A named category with a description that guides (human or LLM) categorization.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Category {
    pub name: String,
    pub description: String,
}

impl Category {
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
        }
    }
}

/// Built-in category list used when an account has none configured
pub const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("income", "Salary, wages, direct deposits, and other income"),
    ("transfer", "Transfers between accounts"),
    ("groceries", "Grocery stores and supermarkets"),
    ("dining", "Restaurants, cafes, and food delivery"),
    ("utilities", "Electric, gas, water, internet, and phone bills"),
    ("rent", "Rent and mortgage payments"),
    ("transportation", "Gas, public transit, rideshare, and parking"),
    ("entertainment", "Streaming services, movies, games, and events"),
    ("shopping", "Retail purchases, clothing, and electronics"),
    ("health", "Medical, dental, pharmacy, and fitness"),
    ("travel", "Flights, hotels, and travel expenses"),
    ("subscriptions", "Recurring subscription services"),
    ("fees", "Bank fees, service charges, and penalties"),
    ("other", "Transactions that don't fit other categories"),
];

pub fn default_categories() -> Vec<Category> {
    DEFAULT_CATEGORIES
        .iter()
        .map(|(name, description)| Category::new(*name, *description))
        .collect()
}

/// Returns the first name that appears more than once, if any.
pub fn find_duplicate_name(categories: &[Category]) -> Option<&str> {
    categories.iter().enumerate().find_map(|(i, c)| {
        categories[..i]
            .iter()
            .any(|prev| prev.name == c.name)
            .then_some(c.name.as_str())
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_categories_are_unique() {
        let cats = default_categories();
        assert_eq!(cats.len(), 14);
        assert_eq!(find_duplicate_name(&cats), None);
        assert_eq!(cats.last().map(|c| c.name.as_str()), Some("other"));
    }

    #[test]
    fn test_find_duplicate_name() {
        let cats = vec![
            Category::new("dining", "a"),
            Category::new("rent", "b"),
            Category::new("dining", "c"),
        ];
        assert_eq!(find_duplicate_name(&cats), Some("dining"));
    }
}
