//! Revenue Aggregator — normalized monthly recurring revenue over the
//! active set.
//!
//! Operates on [`EnrichedSubscription`] only: plan and coupon fields are
//! guaranteed present by the type, so "MRR needs enrichment" is enforced at
//! the signature instead of probed at runtime.

use crate::lifecycle;
use subpulse_core::{CouponDuration, EnrichedSubscription, MetricsResult, PlanInterval};
use tracing::warn;

/// Monthly-normalized amount of one subscription in major currency units,
/// or `None` when the plan's billing interval has no monthly normalization.
fn monthly_amount(sub: &EnrichedSubscription) -> Option<f64> {
    // Only a permanent coupon reduces the recurring baseline; `once` and
    // `repeating` coupons expire and are ignored here.
    let percent_off = match sub.coupon_duration {
        Some(CouponDuration::Forever) => sub.percent_off,
        _ => 0.0,
    };

    let base = sub.plan_amount as f64 / 100.0
        * sub.quantity as f64
        * (1.0 - percent_off / 100.0);

    match sub.plan_interval {
        PlanInterval::Month => Some(base),
        PlanInterval::Year => Some(base / 12.0),
        PlanInterval::Day | PlanInterval::Week => None,
    }
}

/// Total monthly recurring revenue of the subscriptions active as of `date`,
/// in major currency units.
///
/// Day/week-billed plans carry no defined monthly normalization; their
/// contributions are excluded from the sum and logged as data-quality
/// warnings rather than failing the sweep.
pub fn monthly_recurring_revenue(
    records: &[EnrichedSubscription],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let active = lifecycle::active_subscriptions(records, date, product, interval_days)?;

    let mut mrr = 0.0;
    for sub in records.iter().filter(|s| active.contains(s.id.as_str())) {
        match monthly_amount(sub) {
            Some(amount) => mrr += amount,
            None => warn!(
                subscription = %sub.id,
                interval = ?sub.plan_interval,
                "plan interval has no monthly normalization, excluded from MRR"
            ),
        }
    }

    Ok(mrr)
}

/// MRR divided by the number of active subscribers; 0 when nobody is active.
pub fn revenue_per_subscriber(
    records: &[EnrichedSubscription],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let subscribers = lifecycle::active_subscribers(records, date, product, interval_days)?;
    if subscribers.is_empty() {
        return Ok(0.0);
    }

    let mrr = monthly_recurring_revenue(records, date, product, interval_days)?;
    Ok(mrr / subscribers.len() as f64)
}

/// MRR restricted to a single customer's subscriptions. Callers typically
/// pass a shorter window than the global default
/// ([`crate::DEFAULT_CUSTOMER_INTERVAL_DAYS`]).
pub fn mrr_per_customer(
    customer_id: &str,
    records: &[EnrichedSubscription],
    date: &str,
    product: Option<&str>,
    interval_days: i64,
) -> MetricsResult<f64> {
    let customer_records: Vec<EnrichedSubscription> = records
        .iter()
        .filter(|s| s.customer == customer_id)
        .cloned()
        .collect();

    monthly_recurring_revenue(&customer_records, date, product, interval_days)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar;
    use subpulse_core::SubscriptionStatus;

    fn enriched(
        id: &str,
        customer: &str,
        amount: i64,
        interval: PlanInterval,
        quantity: u64,
    ) -> EnrichedSubscription {
        EnrichedSubscription {
            id: id.to_string(),
            customer: customer.to_string(),
            status: SubscriptionStatus::Active,
            created: calendar::parse_reference_date("2025-08-01").unwrap(),
            canceled_at: None,
            cancel_at: None,
            trial_end: None,
            quantity,
            plan_amount: amount,
            plan_interval: interval,
            product: "prod_a".to_string(),
            percent_off: 0.0,
            coupon_duration: None,
            name: Some("Pro".to_string()),
        }
    }

    #[test]
    fn test_monthly_plan_mrr() {
        let records = vec![enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 1)];
        let mrr = monthly_recurring_revenue(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 20.0);
    }

    #[test]
    fn test_yearly_plan_normalizes_to_month() {
        let records = vec![enriched("sub_1", "cus_a", 24_000, PlanInterval::Year, 1)];
        let mrr = monthly_recurring_revenue(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 20.0);
    }

    #[test]
    fn test_only_forever_coupons_discount_mrr() {
        let mut once = enriched("sub_once", "cus_a", 2000, PlanInterval::Month, 1);
        once.percent_off = 50.0;
        once.coupon_duration = Some(CouponDuration::Once);

        let mut forever = enriched("sub_forever", "cus_b", 2000, PlanInterval::Month, 1);
        forever.percent_off = 50.0;
        forever.coupon_duration = Some(CouponDuration::Forever);

        let mrr = monthly_recurring_revenue(&[once], "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 20.0);

        let mrr = monthly_recurring_revenue(&[forever], "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 10.0);
    }

    #[test]
    fn test_quantity_multiplies() {
        let records = vec![enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 3)];
        let mrr = monthly_recurring_revenue(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 60.0);
    }

    #[test]
    fn test_weekly_plans_excluded() {
        let records = vec![
            enriched("sub_week", "cus_a", 500, PlanInterval::Week, 1),
            enriched("sub_month", "cus_b", 2000, PlanInterval::Month, 1),
        ];
        let mrr = monthly_recurring_revenue(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 20.0);
    }

    #[test]
    fn test_inactive_subscriptions_contribute_nothing() {
        let mut canceled = enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 1);
        canceled.status = SubscriptionStatus::Canceled;
        canceled.canceled_at = Some(calendar::parse_reference_date("2026-07-01").unwrap());

        let mrr = monthly_recurring_revenue(&[canceled], "2026-08-01", None, 30).unwrap();
        assert_eq!(mrr, 0.0);
    }

    #[test]
    fn test_product_filter_restricts_mrr() {
        let pro = enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 1);
        let mut lite = enriched("sub_2", "cus_b", 1000, PlanInterval::Month, 1);
        lite.name = Some("Lite".to_string());

        let mrr = monthly_recurring_revenue(&[pro, lite], "2026-08-01", Some("Pro"), 30).unwrap();
        assert_eq!(mrr, 20.0);
    }

    #[test]
    fn test_revenue_per_subscriber_zero_when_empty() {
        let records: Vec<EnrichedSubscription> = Vec::new();
        let revenue = revenue_per_subscriber(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(revenue, 0.0);
    }

    #[test]
    fn test_revenue_per_subscriber_divides_by_customers() {
        // cus_a holds two subscriptions, cus_b one: 60.00 across 2 subscribers.
        let records = vec![
            enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 1),
            enriched("sub_2", "cus_a", 2000, PlanInterval::Month, 1),
            enriched("sub_3", "cus_b", 2000, PlanInterval::Month, 1),
        ];
        let revenue = revenue_per_subscriber(&records, "2026-08-01", None, 30).unwrap();
        assert_eq!(revenue, 30.0);
    }

    #[test]
    fn test_mrr_per_customer_restricts_records() {
        let records = vec![
            enriched("sub_1", "cus_a", 2000, PlanInterval::Month, 1),
            enriched("sub_2", "cus_b", 9000, PlanInterval::Month, 1),
        ];
        let mrr = mrr_per_customer("cus_a", &records, "2026-08-01", None, 14).unwrap();
        assert_eq!(mrr, 20.0);
    }
}
