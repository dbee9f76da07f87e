//! Charge-based revenue metrics over a trailing window.
//!
//! Unlike MRR these are realized-cash figures: sums over captured charges
//! between `period_start` and the last instant of the reference day.

use crate::calendar;
use chrono::{DateTime, Utc};
use subpulse_core::{EnrichedCharge, MetricsResult};

fn in_window(charge: &EnrichedCharge, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
    charge.created >= start && charge.created <= calendar::end_of_day(end)
}

fn matches_product(charge: &EnrichedCharge, product: Option<&str>) -> bool {
    // Charges without a resolved product name never match a filter; the
    // product join is a left join and unlabeled charges stay unlabeled.
    match product {
        Some(wanted) => charge.name.as_deref() == Some(wanted),
        None => true,
    }
}

/// Sum of captured, non-refunded USD revenue inside the window.
pub fn total_revenue(
    charges: &[EnrichedCharge],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;

    Ok(charges
        .iter()
        .filter(|c| in_window(c, period_start, period_end))
        .filter(|c| !c.refunded)
        .filter(|c| matches_product(c, product))
        .map(|c| c.amount_captured_usd)
        .sum())
}

/// Sum of refunded amounts inside the window, in major currency units.
pub fn total_refunded(
    charges: &[EnrichedCharge],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;

    Ok(charges
        .iter()
        .filter(|c| in_window(c, period_start, period_end))
        .filter(|c| matches_product(c, product))
        .map(|c| c.amount_refunded as f64 / 100.0)
        .sum())
}

/// Number of refunded charges inside the window.
pub fn total_refunds(
    charges: &[EnrichedCharge],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<u64> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;

    Ok(charges
        .iter()
        .filter(|c| in_window(c, period_start, period_end))
        .filter(|c| matches_product(c, product))
        .filter(|c| c.refunded)
        .count() as u64)
}
