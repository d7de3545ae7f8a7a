//! In-memory snapshot of an already-extracted statement document.
//!
//! PDF text/table extraction happens upstream; this crate only consumes the
//! page text and the row/cell structures the extractor produced.

use serde::{Deserialize, Serialize};

/// One table row; PDF extractors emit `null` for empty cells
pub type TableRow = Vec<Option<String>>;

/// Rows of a single extracted table
pub type Table = Vec<TableRow>;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Page {
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub tables: Vec<Table>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatementDocument {
    pub pages: Vec<Page>,
}

impl StatementDocument {
    /// Single-page document from plain text
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            pages: vec![Page {
                text: text.into(),
                tables: Vec::new(),
            }],
        }
    }

    /// Attach tables to the first page (creating one if needed)
    pub fn with_tables(mut self, tables: Vec<Table>) -> Self {
        if self.pages.is_empty() {
            self.pages.push(Page::default());
        }
        self.pages[0].tables.extend(tables);
        self
    }

    /// Page texts joined with newlines, in page order.
    pub fn full_text(&self) -> String {
        self.pages
            .iter()
            .map(|p| p.text.as_str())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// All table rows across pages, in page then table order.
    pub fn table_rows(&self) -> impl Iterator<Item = &TableRow> {
        self.pages
            .iter()
            .flat_map(|p| p.tables.iter())
            .flat_map(|t| t.iter())
    }
}
