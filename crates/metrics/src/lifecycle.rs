//! Lifecycle Classifier — derives active / new / churned sets from
//! subscription snapshots as of an arbitrary reference date.
//!
//! Two churn computations coexist on purpose: the customer path looks at
//! realized cancellation events (`canceled_at`), while the subscription path
//! takes the difference of two activity sets. They can disagree on records
//! whose `cancel_at` is scheduled without a realized `canceled_at`; callers
//! pick the semantics they need.

use crate::calendar;
use chrono::{DateTime, Duration, Utc};
use std::collections::{HashMap, HashSet};
use subpulse_core::{MetricsError, MetricsResult, SubscriptionLike, SubscriptionStatus};

fn matches_product<R: SubscriptionLike>(record: &R, product: Option<&str>) -> bool {
    // Raw records answer `None` for product_name, so a product filter over
    // an un-enriched record set is a no-op by the type's contract.
    match (product, record.product_name()) {
        (Some(wanted), Some(name)) => name == wanted,
        _ => true,
    }
}

/// The activity predicate. `lookahead_end` is `period_end + interval_days`;
/// a trial must end strictly before it for the subscription to count
/// (the trial-exclusion rule: a trial extending past the lookahead window
/// keeps the subscription out of the active set).
fn is_active_at<R: SubscriptionLike>(
    record: &R,
    period_end: DateTime<Utc>,
    lookahead_end: DateTime<Utc>,
) -> bool {
    record.created() < period_end
        && record.canceled_at().map_or(true, |t| t > period_end)
        && record.cancel_at().map_or(true, |t| t > period_end)
        && record.trial_end().map_or(true, |t| t < lookahead_end)
}

pub(crate) fn active_subscription_ids_at<R: SubscriptionLike>(
    records: &[R],
    period_end: DateTime<Utc>,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    if interval_days < 0 {
        return Err(MetricsError::InvalidInterval(interval_days));
    }
    let lookahead_end = period_end + Duration::days(interval_days);

    Ok(records
        .iter()
        .filter(|r| is_active_at(*r, period_end, lookahead_end) && matches_product(*r, product))
        .map(|r| r.id().to_string())
        .collect())
}

pub(crate) fn active_subscriber_ids_at<R: SubscriptionLike>(
    records: &[R],
    period_end: DateTime<Utc>,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let active = active_subscription_ids_at(records, period_end, product, interval_days)?;

    Ok(records
        .iter()
        .filter(|r| active.contains(r.id()))
        .map(|r| r.customer().to_string())
        .collect())
}

/// Ids of subscriptions active as of `date`.
///
/// A subscription counts when it was created before the date, has no
/// realized or effective cancellation by the date (a scheduled future
/// `cancel_at` does not disqualify), and any trial ends within the
/// `interval_days` lookahead window.
pub fn active_subscriptions<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let period_end = calendar::parse_reference_date(date)?;
    active_subscription_ids_at(records, period_end, product, interval_days)
}

/// Distinct customer ids owning at least one active subscription as of `date`.
pub fn active_subscribers<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let period_end = calendar::parse_reference_date(date)?;
    active_subscriber_ids_at(records, period_end, product, interval_days)
}

/// Customers active as of `date` that were not active one window earlier.
///
/// Known limitation kept from the source semantics: a customer who churned
/// long before the window and resubscribed inside it is indistinguishable
/// from a first-time subscriber.
pub fn new_subscribers<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;
    let prev = active_subscriber_ids_at(records, period_start, product, interval_days)?;
    let cur = active_subscriber_ids_at(records, period_end, product, interval_days)?;

    Ok(cur.difference(&prev).cloned().collect())
}

/// Subscription ids active as of `date` that were not active one window
/// earlier. Same window semantics as [`new_subscribers`], without customer
/// de-duplication.
pub fn new_subscriptions<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;
    let prev = active_subscription_ids_at(records, period_start, product, interval_days)?;
    let cur = active_subscription_ids_at(records, period_end, product, interval_days)?;

    Ok(cur.difference(&prev).cloned().collect())
}

fn churn_dates_by_key<R, F>(
    records: &[R],
    date: Option<&str>,
    product: Option<&str>,
    interval_days: i64,
    key: F,
) -> MetricsResult<HashMap<String, Option<DateTime<Utc>>>>
where
    R: SubscriptionLike,
    F: Fn(&R) -> &str,
{
    let window = match date {
        Some(d) => Some(calendar::interval_bounds(d, interval_days)?),
        None => None,
    };

    // When a date is given, scope narrows to records whose cancellation
    // landed strictly inside the window before any per-key grouping.
    let scope: Vec<&R> = records
        .iter()
        .filter(|r| matches_product(*r, product))
        .filter(|r| match window {
            Some((end, start)) => r
                .canceled_at()
                .map_or(false, |t| t > start && t < end),
            None => true,
        })
        .collect();

    let mut groups: HashMap<&str, Vec<&R>> = HashMap::new();
    for record in scope {
        groups.entry(key(record)).or_default().push(record);
    }

    let mut churn = HashMap::with_capacity(groups.len());
    for (subject, group) in groups {
        let survives = group.iter().any(|r| r.status().is_surviving());
        let churn_date = if survives {
            None
        } else {
            group
                .iter()
                .filter(|r| r.status() == SubscriptionStatus::Canceled)
                .filter_map(|r| r.canceled_at())
                .max()
        };
        churn.insert(subject.to_string(), churn_date);
    }

    Ok(churn)
}

/// Churn date per customer: `None` while any in-scope record still has
/// status `active` or `past_due`, otherwise the latest `canceled_at` among
/// the customer's canceled records.
pub fn churn_dates<R: SubscriptionLike>(
    records: &[R],
    date: Option<&str>,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashMap<String, Option<DateTime<Utc>>>> {
    churn_dates_by_key(records, date, product, interval_days, |r| r.customer())
}

/// Same rule as [`churn_dates`], keyed per subscription id.
pub fn subscription_churn_dates<R: SubscriptionLike>(
    records: &[R],
    date: Option<&str>,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashMap<String, Option<DateTime<Utc>>>> {
    churn_dates_by_key(records, date, product, interval_days, |r| r.id())
}

/// Customers whose churn date falls strictly inside the trailing window.
pub fn churned_customers<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;
    let dates = churn_dates(records, Some(date), product, interval_days)?;

    Ok(dates
        .into_iter()
        .filter_map(|(customer, churned_at)| match churned_at {
            Some(t) if t > period_start && t < period_end => Some(customer),
            _ => None,
        })
        .collect())
}

/// Subscriptions active at the start of the window and no longer active at
/// its end. Computed as a set difference, not from cancellation events, so
/// a subscription whose scheduled `cancel_at` took effect mid-window is
/// churned here even though [`churn_dates`] never saw a `canceled_at`.
pub fn churned_subscriptions<R: SubscriptionLike>(
    records: &[R],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<HashSet<String>> {
    let (period_end, period_start) = calendar::interval_bounds(date, interval_days)?;
    let prev = active_subscription_ids_at(records, period_start, product, interval_days)?;
    let cur = active_subscription_ids_at(records, period_end, product, interval_days)?;

    Ok(prev.difference(&cur).cloned().collect())
}
