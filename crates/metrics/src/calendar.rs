//! Interval Calculator — pure date arithmetic for rolling metric windows.

use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Utc};
use subpulse_core::{MetricsError, MetricsResult};

/// Parse a reference date (`YYYY-MM-DD` or `YYYY/MM/DD`) into a UTC
/// timestamp at start of day.
pub fn parse_reference_date(date: &str) -> MetricsResult<DateTime<Utc>> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(date, "%Y/%m/%d"))
        .map_err(|_| MetricsError::InvalidDate(date.to_string()))?;

    Ok(parsed.and_time(NaiveTime::MIN).and_utc())
}

/// Resolve a reference date and a trailing window length into
/// `(period_end, period_start)`.
pub fn interval_bounds(
    date: &str,
    interval_days: i64,
) -> MetricsResult<(DateTime<Utc>, DateTime<Utc>)> {
    let period_end = parse_reference_date(date)?;
    interval_bounds_at(period_end, interval_days)
}

/// Same as [`interval_bounds`] for an already-parsed reference timestamp.
pub fn interval_bounds_at(
    period_end: DateTime<Utc>,
    interval_days: i64,
) -> MetricsResult<(DateTime<Utc>, DateTime<Utc>)> {
    if interval_days < 0 {
        return Err(MetricsError::InvalidInterval(interval_days));
    }

    Ok((period_end, period_end - Duration::days(interval_days)))
}

/// Timestamp at the first instant of the given day.
pub fn start_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.date_naive().and_time(NaiveTime::MIN).and_utc()
}

/// Timestamp at the last representable instant of the given day.
pub fn end_of_day(ts: DateTime<Utc>) -> DateTime<Utc> {
    start_of_day(ts) + Duration::days(1) - Duration::microseconds(1)
}

/// The current 30-day window and the one immediately before it:
/// `(cur_end, cur_start, prev_end, prev_start)`.
pub fn rolling_month(
    date: &str,
) -> MetricsResult<(DateTime<Utc>, DateTime<Utc>, DateTime<Utc>, DateTime<Utc>)> {
    let cur_end = parse_reference_date(date)?;
    let cur_start = cur_end - Duration::days(30);
    let prev_end = cur_start;
    let prev_start = prev_end - Duration::days(30);

    Ok((cur_end, cur_start, prev_end, prev_start))
}

/// Day-of-month of the last day of the given date's month.
pub fn last_day_of_month(date: &str) -> MetricsResult<u32> {
    let parsed = parse_reference_date(date)?.date_naive();
    let (next_year, next_month) = if parsed.month() == 12 {
        (parsed.year() + 1, 1)
    } else {
        (parsed.year(), parsed.month() + 1)
    };

    // First of the following month is always constructible.
    let first_of_next = NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .ok_or_else(|| MetricsError::InvalidDate(date.to_string()))?;

    Ok((first_of_next - Duration::days(1)).day())
}

/// Days remaining between the given date and the end of its month.
pub fn days_to_month_end(date: &str) -> MetricsResult<u32> {
    let parsed = parse_reference_date(date)?.date_naive();
    Ok(last_day_of_month(date)? - parsed.day())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_interval_bounds_default_window() {
        let (end, start) = interval_bounds("2026-08-01", 30).unwrap();
        assert_eq!(end, parse_reference_date("2026-08-01").unwrap());
        assert_eq!(start, parse_reference_date("2026-07-02").unwrap());
    }

    #[test]
    fn test_slash_dates_accepted() {
        let end = parse_reference_date("2026/08/01").unwrap();
        assert_eq!(end, parse_reference_date("2026-08-01").unwrap());
    }

    #[test]
    fn test_invalid_date_rejected() {
        assert!(matches!(
            parse_reference_date("not-a-date"),
            Err(MetricsError::InvalidDate(_))
        ));
        assert!(matches!(
            parse_reference_date("2026-02-30"),
            Err(MetricsError::InvalidDate(_))
        ));
    }

    #[test]
    fn test_negative_interval_rejected() {
        assert!(matches!(
            interval_bounds("2026-08-01", -1),
            Err(MetricsError::InvalidInterval(-1))
        ));
    }

    #[test]
    fn test_zero_interval_collapses_window() {
        let (end, start) = interval_bounds("2026-08-01", 0).unwrap();
        assert_eq!(end, start);
    }

    #[test]
    fn test_day_boundaries() {
        let ts = parse_reference_date("2026-08-01").unwrap() + Duration::hours(13);
        assert_eq!(start_of_day(ts), parse_reference_date("2026-08-01").unwrap());
        let eod = end_of_day(ts);
        assert_eq!(
            eod + Duration::microseconds(1),
            parse_reference_date("2026-08-02").unwrap()
        );
    }

    #[test]
    fn test_rolling_month_windows_are_adjacent() {
        let (cur_end, cur_start, prev_end, prev_start) = rolling_month("2026-08-01").unwrap();
        assert_eq!(cur_start, prev_end);
        assert_eq!(cur_end - cur_start, Duration::days(30));
        assert_eq!(prev_end - prev_start, Duration::days(30));
    }

    #[test]
    fn test_month_end_helpers() {
        assert_eq!(last_day_of_month("2026-02-10").unwrap(), 28);
        assert_eq!(last_day_of_month("2024-02-10").unwrap(), 29);
        assert_eq!(last_day_of_month("2026-12-05").unwrap(), 31);
        assert_eq!(days_to_month_end("2026-08-30").unwrap(), 1);
        assert_eq!(days_to_month_end("2026-08-31").unwrap(), 0);
    }
}
