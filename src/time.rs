//! Month-arithmetic helpers shared by liability schedules, bucket frames,
//! and contribution series.
//!
//! All indexing in the engine happens on month-starts. Converting an
//! incoming date to its month's first day before indexing removes the
//! ambiguity the teacher's reserve/discount code sidesteps by working in
//! integer policy months instead of calendar dates.

use chrono::{Datelike, NaiveDate};

/// Normalize any date to the first day of its month.
pub fn month_start(d: NaiveDate) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year(), d.month(), 1).expect("valid year/month always has a day 1")
}

/// The first day of the month following `d`.
pub fn add_months(d: NaiveDate, months: i32) -> NaiveDate {
    let total = d.year() * 12 + (d.month() as i32 - 1) + months;
    let year = total.div_euclid(12);
    let month = (total.rem_euclid(12)) as u32 + 1;
    NaiveDate::from_ymd_opt(year, month, 1).expect("computed year/month is always valid")
}

/// Number of whole calendar months from `d` to `maturity` (may be negative).
pub fn months_between(d: NaiveDate, maturity: NaiveDate) -> i64 {
    12 * (maturity.year() as i64 - d.year() as i64) + (maturity.month() as i64 - d.month() as i64)
}

/// Inclusive month-start index `[start, end]`, both normalized to month-start.
///
/// `start` is expected to already be the first eligible month (callers pass
/// `valuation_date + 1mo`); `end` is inclusive.
pub fn month_range(start: NaiveDate, end: NaiveDate) -> Vec<NaiveDate> {
    let start = month_start(start);
    let end = month_start(end);

    let mut months = Vec::new();
    let mut cur = start;
    while cur <= end {
        months.push(cur);
        cur = add_months(cur, 1);
    }
    months
}

/// Add whole years to a date (used for expanding recurring liability
/// configs into one `Liability` per year of `duration_years`).
pub fn add_years(d: NaiveDate, years: i32) -> NaiveDate {
    NaiveDate::from_ymd_opt(d.year() + years, d.month(), d.day())
        .unwrap_or_else(|| NaiveDate::from_ymd_opt(d.year() + years, d.month() + 1, 1).unwrap())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_start_normalizes_to_first() {
        let d = NaiveDate::from_ymd_opt(2026, 3, 17).unwrap();
        assert_eq!(month_start(d), NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
    }

    #[test]
    fn add_months_rolls_year() {
        let d = NaiveDate::from_ymd_opt(2026, 11, 1).unwrap();
        assert_eq!(add_months(d, 2), NaiveDate::from_ymd_opt(2027, 1, 1).unwrap());
        assert_eq!(add_months(d, -11), NaiveDate::from_ymd_opt(2025, 12, 1).unwrap());
    }

    #[test]
    fn months_between_counts_whole_months() {
        let a = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let b = NaiveDate::from_ymd_opt(2027, 4, 1).unwrap();
        assert_eq!(months_between(a, b), 15);
    }

    #[test]
    fn month_range_is_inclusive_contiguous() {
        let start = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2026, 4, 1).unwrap();
        let months = month_range(start, end);
        assert_eq!(months.len(), 4);
        assert_eq!(months[0], start);
        assert_eq!(months[3], end);
    }
}
