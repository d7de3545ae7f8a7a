//! Statement period resolution.
//!
//! Statements print their coverage window in several shapes depending on the
//! bank and the statement era:
//!
//!   November 25, 2025 through December 19, 2025
//!   December 20 - January 23, 2026
//!   Opening/Closing Date 12/20/25 - 01/23/26
//!   12/20 - 01/23, 2026
//!
//! Each shape is an independent matcher returning `Option`; a calendar error
//! inside one candidate simply means "no match" and the next shape is tried.

use chrono::{Datelike, NaiveDate};
use regex::{Captures, Regex};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;
use tracing::debug;

use crate::error::{IngestError, Result};

/// Calendar window covered by one statement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatementPeriod {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

impl StatementPeriod {
    /// `None` when `start_date > end_date`
    pub fn new(start_date: NaiveDate, end_date: NaiveDate) -> Option<Self> {
        (start_date <= end_date).then_some(Self { start_date, end_date })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start_date <= date && date <= self.end_date
    }

    pub fn spans_new_year(&self) -> bool {
        self.start_date.year() != self.end_date.year()
    }

    /// Window used when a statement prints no recognizable period.
    ///
    /// Early in the year (January/February) statements may still cover the
    /// previous December, so the window reaches back a full year.
    pub fn fallback_for(today: NaiveDate) -> Self {
        let year = today.year();
        let start_year = if today.month() <= 2 { year - 1 } else { year };
        Self {
            start_date: NaiveDate::from_ymd_opt(start_year, 1, 1).unwrap_or(NaiveDate::MIN),
            end_date: NaiveDate::from_ymd_opt(year, 12, 31).unwrap_or(NaiveDate::MAX),
        }
    }
}

impl fmt::Display for StatementPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start_date, self.end_date)
    }
}

type PeriodMatcher = fn(&str) -> Option<StatementPeriod>;

/// Matchers in the order they are tried
const MATCHERS: [(&str, PeriodMatcher); 4] = [
    ("month-name through", match_named_through),
    ("month-name range", match_named_range),
    ("numeric with years", match_numeric_full),
    ("numeric trailing year", match_numeric_trailing_year),
];

/// Resolve the statement period, failing when no known shape matches.
pub fn resolve(text: &str) -> Result<StatementPeriod> {
    for (name, matcher) in MATCHERS {
        if let Some(period) = matcher(text) {
            debug!(shape = name, %period, "statement period resolved");
            return Ok(period);
        }
    }
    Err(IngestError::PeriodNotFound)
}

/// Resolve the statement period, synthesizing one around `today` when no
/// known shape matches.
pub fn resolve_lenient(text: &str, today: NaiveDate) -> StatementPeriod {
    resolve(text).unwrap_or_else(|_| {
        let period = StatementPeriod::fallback_for(today);
        debug!(%period, "no statement period found, using fallback window");
        period
    })
}

/// Month number for a full or three-letter month name (case-insensitive)
pub fn month_from_name(name: &str) -> Option<u32> {
    const MONTHS: [&str; 12] = [
        "january", "february", "march", "april", "may", "june", "july", "august", "september",
        "october", "november", "december",
    ];
    let lower = name.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS
        .iter()
        .position(|m| *m == lower || (lower.len() == 3 && m.starts_with(&lower)))
        .map(|i| i as u32 + 1)
}

fn named_through_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})\s*through\s*([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})")
            .expect("invalid named-through regex")
    })
}

fn named_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?i)([A-Za-z]+)\s+(\d{1,2})\s*[-–]\s*([A-Za-z]+)\s+(\d{1,2}),\s*(\d{4})")
            .expect("invalid named-range regex")
    })
}

fn numeric_full_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\s*[-–]\s*(\d{1,2})/(\d{1,2})/(\d{4}|\d{2})\b")
            .expect("invalid numeric-full regex")
    })
}

fn numeric_trailing_year_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"\b(\d{1,2})/(\d{1,2})\s*[-–]\s*(\d{1,2})/(\d{1,2}),\s*(\d{4})\b")
            .expect("invalid numeric-trailing-year regex")
    })
}

fn num(caps: &Captures<'_>, i: usize) -> Option<u32> {
    caps.get(i)?.as_str().parse().ok()
}

fn year(caps: &Captures<'_>, i: usize) -> Option<i32> {
    let raw = caps.get(i)?.as_str();
    let value: i32 = raw.parse().ok()?;
    Some(if raw.len() == 2 { 2000 + value } else { value })
}

/// Start year for a range whose year is printed only once, at the end.
fn rollback_start_year(start_month: u32, end_month: u32, end_year: i32) -> i32 {
    if start_month > end_month { end_year - 1 } else { end_year }
}

fn match_named_through(text: &str) -> Option<StatementPeriod> {
    named_through_re().captures_iter(text).find_map(|caps| {
        let start = NaiveDate::from_ymd_opt(
            year(&caps, 3)?,
            month_from_name(caps.get(1)?.as_str())?,
            num(&caps, 2)?,
        )?;
        let end = NaiveDate::from_ymd_opt(
            year(&caps, 6)?,
            month_from_name(caps.get(4)?.as_str())?,
            num(&caps, 5)?,
        )?;
        StatementPeriod::new(start, end)
    })
}

fn match_named_range(text: &str) -> Option<StatementPeriod> {
    named_range_re().captures_iter(text).find_map(|caps| {
        let start_month = month_from_name(caps.get(1)?.as_str())?;
        let end_month = month_from_name(caps.get(3)?.as_str())?;
        let end_year = year(&caps, 5)?;
        let start_year = rollback_start_year(start_month, end_month, end_year);
        let start = NaiveDate::from_ymd_opt(start_year, start_month, num(&caps, 2)?)?;
        let end = NaiveDate::from_ymd_opt(end_year, end_month, num(&caps, 4)?)?;
        StatementPeriod::new(start, end)
    })
}

fn match_numeric_full(text: &str) -> Option<StatementPeriod> {
    numeric_full_re().captures_iter(text).find_map(|caps| {
        let start = NaiveDate::from_ymd_opt(year(&caps, 3)?, num(&caps, 1)?, num(&caps, 2)?)?;
        let end = NaiveDate::from_ymd_opt(year(&caps, 6)?, num(&caps, 4)?, num(&caps, 5)?)?;
        StatementPeriod::new(start, end)
    })
}

fn match_numeric_trailing_year(text: &str) -> Option<StatementPeriod> {
    numeric_trailing_year_re().captures_iter(text).find_map(|caps| {
        let start_month = num(&caps, 1)?;
        let end_month = num(&caps, 3)?;
        let end_year = year(&caps, 5)?;
        let start_year = rollback_start_year(start_month, end_month, end_year);
        let start = NaiveDate::from_ymd_opt(start_year, start_month, num(&caps, 2)?)?;
        let end = NaiveDate::from_ymd_opt(end_year, end_month, num(&caps, 4)?)?;
        StatementPeriod::new(start, end)
    })
}
