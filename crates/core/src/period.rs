//! Provider period-string parsing.
//!
//! Government and statistics APIs encode observation periods a dozen
//! different ways: exact ISO dates, quarterly codes like `2023Q3` or
//! `2023-Q3`, compact `YYYYMM` months, BLS `year` + `M09`/`Q3` pairs,
//! and bare years. Everything resolves to a single instant with the
//! first-of-period convention, midnight UTC.
//!
//! These are pure functions of the raw record; collectors hold no
//! parsing state.

use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

/// A period string that could not be resolved to an instant.
///
/// Collectors treat this as a per-record condition: the offending
/// record is dropped, the batch continues.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unparsable period: {0}")]
pub struct PeriodError(pub String);

fn first_of(year: i32, month: u32, day: u32) -> Result<DateTime<Utc>, PeriodError> {
    NaiveDate::from_ymd_opt(year, month, day)
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| PeriodError(format!("{year:04}-{month:02}-{day:02}")))
}

/// Maps a quarter number to its first-of-period month: Q1→March,
/// Q2→June, Q3→September, Q4→December.
fn quarter_month(quarter: u32) -> Option<u32> {
    (1..=4).contains(&quarter).then_some(quarter * 3)
}

/// Parses quarterly codes: `2023Q3` or `2023-Q3`.
pub fn parse_quarter(period: &str) -> Result<DateTime<Utc>, PeriodError> {
    let err = || PeriodError(period.to_string());
    let (year, quarter) = period
        .split_once("-Q")
        .or_else(|| period.split_once('Q'))
        .ok_or_else(err)?;
    let year: i32 = year.parse().map_err(|_| err())?;
    let quarter: u32 = quarter.parse().map_err(|_| err())?;
    let month = quarter_month(quarter).ok_or_else(err)?;
    first_of(year, month, 1)
}

/// Parses a BLS `year` + `period` pair.
///
/// `M01`..`M12` is monthly, `Q1`..`Q4` quarterly. Any other prefix
/// (annual `A01`, semi-annual `S01`, ...) is out of scope and returns
/// an error so the caller skips that record.
pub fn parse_bls_period(year: i32, period: &str) -> Result<DateTime<Utc>, PeriodError> {
    let err = || PeriodError(format!("{year} {period}"));
    let month = if let Some(rest) = period.strip_prefix('M') {
        rest.parse::<u32>().map_err(|_| err())?
    } else if let Some(rest) = period.strip_prefix('Q') {
        let quarter: u32 = rest.parse().map_err(|_| err())?;
        quarter_month(quarter).ok_or_else(err)?
    } else {
        return Err(err());
    };
    first_of(year, month, 1)
}

/// Parses a compact `YYYYMM` month code (Census time slots).
pub fn parse_compact_month(period: &str) -> Result<DateTime<Utc>, PeriodError> {
    let err = || PeriodError(period.to_string());
    if period.len() < 6 || !period.is_ascii() {
        return Err(err());
    }
    let year: i32 = period[..4].parse().map_err(|_| err())?;
    let month: u32 = period[4..6].parse().map_err(|_| err())?;
    first_of(year, month, 1)
}

/// Parses the common explicit formats: `YYYY-MM-DD`, `YYYY-MM`, `YYYY`.
pub fn parse_period(period: &str) -> Result<DateTime<Utc>, PeriodError> {
    let err = || PeriodError(period.to_string());
    let mut parts = period.splitn(3, '-');
    let year: i32 = parts.next().ok_or_else(err)?.parse().map_err(|_| err())?;
    let month: u32 = match parts.next() {
        Some(m) => m.parse().map_err(|_| err())?,
        None => return first_of(year, 1, 1),
    };
    let day: u32 = match parts.next() {
        Some(d) => d.parse().map_err(|_| err())?,
        None => return first_of(year, month, 1),
    };
    first_of(year, month, day)
}

/// Parses an exact `YYYY-MM-DD` date, rejecting coarser periods.
pub fn parse_date(period: &str) -> Result<DateTime<Utc>, PeriodError> {
    NaiveDate::parse_from_str(period, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc())
        .ok_or_else(|| PeriodError(period.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn utc(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap()
    }

    // ==================== Quarter Parsing Tests ====================

    #[test]
    fn test_parse_quarter_all_quarters() {
        assert_eq!(parse_quarter("2023Q1").unwrap(), utc(2023, 3, 1));
        assert_eq!(parse_quarter("2023Q2").unwrap(), utc(2023, 6, 1));
        assert_eq!(parse_quarter("2023Q3").unwrap(), utc(2023, 9, 1));
        assert_eq!(parse_quarter("2023Q4").unwrap(), utc(2023, 12, 1));
    }

    #[test]
    fn test_parse_quarter_dashed_form() {
        assert_eq!(parse_quarter("2020-Q1").unwrap(), utc(2020, 3, 1));
        assert_eq!(parse_quarter("2024-Q4").unwrap(), utc(2024, 12, 1));
    }

    #[test]
    fn test_parse_quarter_rejects_out_of_range() {
        assert!(parse_quarter("2023Q0").is_err());
        assert!(parse_quarter("2023Q5").is_err());
    }

    #[test]
    fn test_parse_quarter_rejects_garbage() {
        assert!(parse_quarter("2023").is_err());
        assert!(parse_quarter("Q3").is_err());
        assert!(parse_quarter("").is_err());
        assert!(parse_quarter("20x3Q1").is_err());
    }

    // ==================== BLS Period Tests ====================

    #[test]
    fn test_parse_bls_monthly() {
        assert_eq!(parse_bls_period(2023, "M09").unwrap(), utc(2023, 9, 1));
        assert_eq!(parse_bls_period(2023, "M01").unwrap(), utc(2023, 1, 1));
        assert_eq!(parse_bls_period(2023, "M12").unwrap(), utc(2023, 12, 1));
    }

    #[test]
    fn test_parse_bls_quarterly() {
        assert_eq!(parse_bls_period(2023, "Q3").unwrap(), utc(2023, 9, 1));
        assert_eq!(parse_bls_period(2023, "Q02").unwrap(), utc(2023, 6, 1));
    }

    #[test]
    fn test_parse_bls_annual_is_skipped() {
        // Annual and semi-annual codes are out of scope by design.
        assert!(parse_bls_period(2023, "A01").is_err());
        assert!(parse_bls_period(2023, "S01").is_err());
    }

    #[test]
    fn test_parse_bls_invalid_month() {
        assert!(parse_bls_period(2023, "M13").is_err());
        assert!(parse_bls_period(2023, "M00").is_err());
        assert!(parse_bls_period(2023, "Mxx").is_err());
    }

    // ==================== Compact Month Tests ====================

    #[test]
    fn test_parse_compact_month() {
        assert_eq!(parse_compact_month("202309").unwrap(), utc(2023, 9, 1));
        assert_eq!(parse_compact_month("202401").unwrap(), utc(2024, 1, 1));
    }

    #[test]
    fn test_parse_compact_month_with_suffix() {
        // Census time slots can carry trailing characters past YYYYMM.
        assert_eq!(parse_compact_month("20230901").unwrap(), utc(2023, 9, 1));
    }

    #[test]
    fn test_parse_compact_month_rejects_short_input() {
        assert!(parse_compact_month("2023").is_err());
        assert!(parse_compact_month("").is_err());
    }

    #[test]
    fn test_parse_compact_month_rejects_bad_month() {
        assert!(parse_compact_month("202313").is_err());
        assert!(parse_compact_month("2023xx").is_err());
    }

    // ==================== General Period Tests ====================

    #[test]
    fn test_parse_period_full_date() {
        assert_eq!(parse_period("2024-01-02").unwrap(), utc(2024, 1, 2));
    }

    #[test]
    fn test_parse_period_year_month() {
        assert_eq!(parse_period("2023-09").unwrap(), utc(2023, 9, 1));
    }

    #[test]
    fn test_parse_period_bare_year() {
        assert_eq!(parse_period("2023").unwrap(), utc(2023, 1, 1));
    }

    #[test]
    fn test_parse_period_rejects_garbage() {
        assert!(parse_period("next tuesday").is_err());
        assert!(parse_period("2023-13").is_err());
        assert!(parse_period("2023-02-30").is_err());
    }

    #[test]
    fn test_parse_date_rejects_coarse_periods() {
        assert!(parse_date("2023-09").is_err());
        assert!(parse_date("2023").is_err());
        assert_eq!(parse_date("2024-01-02").unwrap(), utc(2024, 1, 2));
    }
}
