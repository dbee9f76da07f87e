//! Rate Computer — churn and retention rates from two-point comparisons of
//! the classifier's sets. Zero denominators produce 0.0 so sparse dates
//! never abort a batch sweep.

use crate::calendar;
use crate::lifecycle::{self, active_subscriber_ids_at, active_subscription_ids_at};
use subpulse_core::{MetricsResult, SubscriptionLike};

/// Share of subscribers lost over the window:
/// `churned / (active(period_start) + new(date))`.
///
/// The `active(period_start)` term is intentionally unfiltered by product,
/// matching the historical formula; the churned and new terms honor the
/// filter.
pub fn churned_subscribers_rate<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (_, period_start) = calendar::interval_bounds(date, interval_days)?;

    let churned = lifecycle::churned_customers(records, date, product, interval_days)?;
    let prev_active = active_subscriber_ids_at(records, period_start, None, interval_days)?;
    let new = lifecycle::new_subscribers(records, date, product, interval_days)?;

    let denominator = prev_active.len() + new.len();
    if denominator == 0 {
        return Ok(0.0);
    }

    Ok(churned.len() as f64 / denominator as f64)
}

/// Share of the window-start subscriber base still active at its end:
/// `(active(date) − new(date)) / active(period_start)`.
///
/// Can fall outside `[0, 1]` (even negative) when the new-subscriber count
/// overcounts relative to the active-set delta; this is documented behavior
/// of the formula, not clamped.
pub fn subscribers_retention_rate<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;

    let cur_active = active_subscriber_ids_at(records, period_end, product, interval_days)?;
    let prev_active = active_subscriber_ids_at(records, period_start, product, interval_days)?;
    let new = lifecycle::new_subscribers(records, date, product, interval_days)?;

    if prev_active.is_empty() {
        return Ok(0.0);
    }

    Ok((cur_active.len() as f64 - new.len() as f64) / prev_active.len() as f64)
}

/// [`churned_subscribers_rate`] applied to subscription ids instead of
/// customers, with the set-difference churn strategy.
pub fn churned_subscriptions_rate<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (_, period_start) = calendar::interval_bounds(date, interval_days)?;

    let churned = lifecycle::churned_subscriptions(records, date, product, interval_days)?;
    let prev_active = active_subscription_ids_at(records, period_start, product, interval_days)?;
    let new = lifecycle::new_subscriptions(records, date, product, interval_days)?;

    let denominator = prev_active.len() + new.len();
    if denominator == 0 {
        return Ok(0.0);
    }

    Ok(churned.len() as f64 / denominator as f64)
}

/// [`subscribers_retention_rate`] applied to subscription ids.
pub fn subscription_retention_rate<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;

    let cur_active = active_subscription_ids_at(records, period_end, product, interval_days)?;
    let prev_active = active_subscription_ids_at(records, period_start, product, interval_days)?;
    let new = lifecycle::new_subscriptions(records, date, product, interval_days)?;

    if prev_active.is_empty() {
        return Ok(0.0);
    }

    Ok((cur_active.len() as f64 - new.len() as f64) / prev_active.len() as f64)
}
