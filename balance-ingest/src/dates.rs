//! Year inference for month/day transaction dates.

use chrono::{Datelike, NaiveDate};

use crate::error::IngestError;
use crate::period::StatementPeriod;

/// Place a year-less `month/day` inside `period`.
///
/// The start year is tried first, then the end year when the period crosses
/// a calendar year boundary. `None` when neither candidate is a real date
/// inside the period.
pub fn infer_date(month: u32, day: u32, period: &StatementPeriod) -> Option<NaiveDate> {
    let in_year = |year: i32| {
        NaiveDate::from_ymd_opt(year, month, day).filter(|candidate| period.contains(*candidate))
    };

    in_year(period.start_date.year()).or_else(|| {
        if period.spans_new_year() {
            in_year(period.end_date.year())
        } else {
            None
        }
    })
}

/// Same as [`infer_date`], reporting failure as an [`IngestError::DateInference`].
pub fn infer_date_or_err(month: u32, day: u32, period: &StatementPeriod) -> Result<NaiveDate, IngestError> {
    infer_date(month, day, period).ok_or(IngestError::DateInference {
        month,
        day,
        start: period.start_date,
        end: period.end_date,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn boundary_period() -> StatementPeriod {
        StatementPeriod::new(d(2025, 12, 20), d(2026, 1, 23)).unwrap()
    }

    #[test]
    fn test_infers_start_year() {
        assert_eq!(infer_date(12, 31, &boundary_period()), Some(d(2025, 12, 31)));
    }

    #[test]
    fn test_infers_end_year() {
        assert_eq!(infer_date(1, 5, &boundary_period()), Some(d(2026, 1, 5)));
    }

    #[test]
    fn test_outside_period_is_not_inferable() {
        assert_eq!(infer_date(6, 15, &boundary_period()), None);
        let err = infer_date_or_err(6, 15, &boundary_period()).unwrap_err();
        assert!(matches!(err, IngestError::DateInference { month: 6, day: 15, .. }));
    }

    #[test]
    fn test_leap_day_only_in_matching_year() {
        let period = StatementPeriod::new(d(2023, 12, 15), d(2024, 3, 14)).unwrap();
        assert_eq!(infer_date(2, 29, &period), Some(d(2024, 2, 29)));

        let non_leap = StatementPeriod::new(d(2025, 2, 1), d(2025, 2, 28)).unwrap();
        assert_eq!(infer_date(2, 29, &non_leap), None);
    }

    #[test]
    fn test_period_edges_are_inclusive() {
        let period = StatementPeriod::new(d(2025, 11, 25), d(2025, 12, 19)).unwrap();
        assert_eq!(infer_date(11, 25, &period), Some(d(2025, 11, 25)));
        assert_eq!(infer_date(12, 19, &period), Some(d(2025, 12, 19)));
        assert_eq!(infer_date(12, 20, &period), None);
    }
}
