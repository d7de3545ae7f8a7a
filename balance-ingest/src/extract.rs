//! Row/line extraction: raw table rows or text lines to `(date, description, amount)`.
//!
//! Tables are tried first. When no table row survives, the page text is
//! scanned line by line instead:
//!
//!   DATE   DESCRIPTION                                   AMOUNT    BALANCE
//!   12/05  AMAZON.COM                                    -42.17     957.83
//!
//! Rows that do not look like transactions (section headers, totals, blank
//! cells, unparsable amounts) are dropped without failing the statement.

use chrono::NaiveDate;
use regex::Regex;
use rust_decimal::Decimal;
use std::borrow::Cow;
use std::str::FromStr;
use std::sync::OnceLock;
use tracing::{debug, warn};

use crate::dates::{infer_date, infer_date_or_err};
use crate::document::TableRow;
use crate::error::Result;
use crate::period::StatementPeriod;

/// A transaction row before year inference
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub month: u32,
    pub day: u32,
    pub description: String,
    pub amount: Decimal,
    /// Running balance printed next to the amount, when the line has one
    pub printed_balance: Option<Decimal>,
}

/// A transaction row placed on the calendar
#[derive(Debug, Clone, PartialEq)]
pub struct DatedRow {
    pub date: NaiveDate,
    /// Authorization date printed inside the description ("Card Purchase 11/30 ...")
    pub transaction_date: Option<NaiveDate>,
    pub description: String,
    pub amount: Decimal,
    pub printed_balance: Option<Decimal>,
}

/// What to do with a row whose month/day falls outside the statement period
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UndatedRowPolicy {
    /// Drop the row and keep going
    Skip,
    /// Fail the whole statement
    Abort,
}

/// Where the surviving rows came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RowSource {
    Tables,
    Text,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Extraction {
    pub rows: Vec<DatedRow>,
    pub source: RowSource,
    /// Rows dropped because their date could not be inferred
    pub undated: usize,
}

fn date_prefix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*(\d{1,2})/(\d{1,2})(?:\D|$)").expect("invalid date prefix regex"))
}

fn text_line_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"^(?P<month>\d{1,2})/(?P<day>\d{1,2})\s+",
            r"(?P<desc>.+?)\s+",
            r"(?P<amount>\(?-?\$?[\d,]+\.\d{2}\)?)",
            r"(?:\s+(?P<balance>\(?-?\$?[\d,]+\.\d{2}\)?))?\s*$"
        ))
        .expect("invalid text line regex")
    })
}

fn authorization_date_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)^(?:recurring\s+)?card\s+purchase(?:\s+with\s+pin)?\s+(\d{1,2})/(\d{1,2})\b")
            .expect("invalid authorization date regex")
    })
}

fn boundary_marker_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\*(?:start|end)\*\w*(\d)\w*\s*detail(\d)").expect("invalid boundary marker regex")
    })
}

/// Parse a printed money amount.
///
/// Currency symbols and inner whitespace are ignored. Commas are accepted only
/// as thousands separators (`1,234.56`, not `1,2,3.00`). `(42.17)` and
/// `-42.17` are negative.
pub fn parse_amount(raw: &str) -> Option<Decimal> {
    let cleaned: String = raw
        .chars()
        .filter(|c| !c.is_whitespace() && !matches!(c, '$' | '€' | '£'))
        .collect();

    let (negative, body) = if let Some(inner) = cleaned.strip_prefix('(').and_then(|s| s.strip_suffix(')')) {
        (true, inner)
    } else if let Some(rest) = cleaned.strip_prefix('-') {
        (true, rest)
    } else {
        (false, cleaned.strip_prefix('+').unwrap_or(&cleaned))
    };

    let body = strip_thousands_separators(body)?;
    if body.is_empty() || !body.chars().all(|c| c.is_ascii_digit() || c == '.') {
        return None;
    }
    let value = Decimal::from_str(&body).ok()?;
    Some(if negative { -value } else { value })
}

/// `1,234,567.89` -> `1234567.89`; `None` when the commas are not digit groups of three.
fn strip_thousands_separators(body: &str) -> Option<String> {
    let (int, frac) = match body.split_once('.') {
        Some((int, frac)) => (int, Some(frac)),
        None => (body, None),
    };
    if frac.is_some_and(|f| f.contains(',')) {
        return None;
    }
    if int.contains(',') {
        let mut groups = int.split(',');
        let lead = groups.next()?;
        if lead.is_empty() || lead.len() > 3 || groups.any(|g| g.len() != 3) {
            return None;
        }
    }
    let int = int.replace(',', "");
    Some(match frac {
        Some(frac) => format!("{int}.{frac}"),
        None => int,
    })
}

/// Authorization date from a "Card Purchase MM/DD ..." description, placed inside `period`.
pub fn authorization_date(description: &str, period: &StatementPeriod) -> Option<NaiveDate> {
    let caps = authorization_date_re().captures(description)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    infer_date(month, day, period)
}

/// `(month, day)` from a cell or token starting with `MM/DD`
pub fn parse_month_day(raw: &str) -> Option<(u32, u32)> {
    let caps = date_prefix_re().captures(raw)?;
    let month: u32 = caps[1].parse().ok()?;
    let day: u32 = caps[2].parse().ok()?;
    ((1..=12).contains(&month) && (1..=31).contains(&day)).then_some((month, day))
}

/// Repair page-boundary markers fused into a date token.
///
/// Some renderers emit `*end*transac1tion detail2/01` for a line that should
/// read `12/01`: the first date digit lands inside the marker word. Only this
/// known artifact is repaired.
pub fn strip_boundary_markers(text: &str) -> Cow<'_, str> {
    boundary_marker_re().replace_all(text, "${1}${2}")
}

fn cell_text(cell: &Option<String>) -> Option<&str> {
    cell.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Table path: column 0 is the date, the last column the amount, the rest the description.
pub fn rows_from_tables<'a>(rows: impl IntoIterator<Item = &'a TableRow>) -> Vec<RawRow> {
    rows.into_iter()
        .filter(|row| row.len() >= 3)
        .filter_map(|row| {
            let (month, day) = parse_month_day(cell_text(&row[0])?)?;
            let amount = parse_amount(cell_text(&row[row.len() - 1])?)?;
            let description = row[1..row.len() - 1]
                .iter()
                .filter_map(cell_text)
                .collect::<Vec<_>>()
                .join(" ");
            if description.is_empty() {
                return None;
            }
            Some(RawRow {
                month,
                day,
                description,
                amount,
                printed_balance: None,
            })
        })
        .collect()
}

/// Text fallback: one transaction per matching line.
pub fn rows_from_text(text: &str) -> Vec<RawRow> {
    let text = strip_boundary_markers(text);
    text.lines()
        .filter_map(|line| {
            let caps = text_line_re().captures(line.trim())?;
            let month: u32 = caps["month"].parse().ok()?;
            let day: u32 = caps["day"].parse().ok()?;
            let description = caps["desc"].trim().to_string();
            if description.is_empty() {
                return None;
            }
            Some(RawRow {
                month,
                day,
                description,
                amount: parse_amount(&caps["amount"])?,
                printed_balance: caps.name("balance").and_then(|m| parse_amount(m.as_str())),
            })
        })
        .collect()
}

/// Extract transaction rows, tables first, text as fallback, placing each
/// row inside `period`.
pub fn extract<'a>(
    tables: impl IntoIterator<Item = &'a TableRow>,
    text: &str,
    period: &StatementPeriod,
    policy: UndatedRowPolicy,
) -> Result<Extraction> {
    let mut raw = rows_from_tables(tables);
    let mut source = RowSource::Tables;
    if raw.is_empty() {
        raw = rows_from_text(text);
        source = RowSource::Text;
    }
    debug!(?source, rows = raw.len(), "extracted raw rows");

    let mut rows = Vec::with_capacity(raw.len());
    let mut undated = 0;
    for row in raw {
        match infer_date_or_err(row.month, row.day, period) {
            Ok(date) => rows.push(DatedRow {
                date,
                transaction_date: authorization_date(&row.description, period),
                description: row.description,
                amount: row.amount,
                printed_balance: row.printed_balance,
            }),
            Err(err) if policy == UndatedRowPolicy::Skip => {
                warn!(description = %row.description, "dropping row: {err}");
                undated += 1;
            }
            Err(err) => return Err(err),
        }
    }

    Ok(Extraction { rows, source, undated })
}
