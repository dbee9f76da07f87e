//! Record enrichment — flattens nested plan/discount objects and joins
//! product and balance-transaction snapshots onto subscription and charge
//! records.
//!
//! Enrichment happens once, up front; downstream metrics never probe nested
//! fields. The output types ([`EnrichedSubscription`], [`EnrichedCharge`])
//! are what the revenue paths require.

use std::collections::HashMap;
use subpulse_core::{
    BalanceTransactionRecord, ChargeRecord, EnrichedCharge, EnrichedSubscription, MetricsError,
    MetricsResult, ProductRecord, SubscriptionRecord,
};
use tracing::{debug, warn};

/// Flatten one subscription's plan and coupon fields.
///
/// Fails with [`MetricsError::MissingField`] when the record carries no
/// plan; plan-less rows cannot contribute to revenue metrics.
pub fn flatten_subscription(sub: &SubscriptionRecord) -> MetricsResult<EnrichedSubscription> {
    let plan = sub.plan.as_ref().ok_or_else(|| MetricsError::MissingField {
        record: format!("subscription {}", sub.id),
        field: "plan".to_string(),
    })?;

    let (percent_off, coupon_duration) = match &sub.discount {
        Some(discount) => (discount.coupon.percent_off, Some(discount.coupon.duration)),
        None => (0.0, None),
    };

    Ok(EnrichedSubscription {
        id: sub.id.clone(),
        customer: sub.customer.clone(),
        status: sub.status,
        created: sub.created,
        canceled_at: sub.canceled_at,
        cancel_at: sub.cancel_at,
        trial_end: sub.trial_end,
        quantity: sub.quantity,
        plan_amount: plan.amount,
        plan_interval: plan.interval,
        product: plan.product.clone(),
        percent_off,
        coupon_duration,
        name: None,
    })
}

/// Enrich a subscription snapshot.
///
/// Rows without a plan are dropped with a warning. When product records are
/// given, display names are resolved through an inner join on the plan's
/// product id: subscriptions whose product is absent from the catalog are
/// dropped as well, and the resulting records support product filtering.
pub fn enrich_subscriptions(
    subs: &[SubscriptionRecord],
    products: Option<&[ProductRecord]>,
) -> Vec<EnrichedSubscription> {
    let names: Option<HashMap<&str, &str>> = products.map(|catalog| {
        catalog
            .iter()
            .map(|p| (p.id.as_str(), p.name.as_str()))
            .collect()
    });

    let mut enriched = Vec::with_capacity(subs.len());
    for sub in subs {
        let mut flat = match flatten_subscription(sub) {
            Ok(flat) => flat,
            Err(e) => {
                warn!(subscription = %sub.id, error = %e, "dropping subscription from enrichment");
                continue;
            }
        };

        if let Some(names) = &names {
            match names.get(flat.product.as_str()) {
                Some(name) => flat.name = Some((*name).to_string()),
                None => {
                    warn!(
                        subscription = %sub.id,
                        product = %flat.product,
                        "product missing from catalog, dropping subscription"
                    );
                    continue;
                }
            }
        }

        enriched.push(flat);
    }

    debug!(input = subs.len(), output = enriched.len(), "enriched subscription snapshot");
    enriched
}

/// Enrich a charge snapshot with balance-transaction currency conversion
/// and product names.
///
/// Balance transactions join on `source == charge id` (left join; a missing
/// transaction means no conversion, rate 1). Product names resolve through
/// the charge's `product_key` metadata (left join; unlabeled charges keep
/// `name = None` and never match a product filter).
pub fn enrich_charges(
    charges: &[ChargeRecord],
    products: &[ProductRecord],
    balances: &[BalanceTransactionRecord],
) -> Vec<EnrichedCharge> {
    let by_source: HashMap<&str, &BalanceTransactionRecord> =
        balances.iter().map(|b| (b.source.as_str(), b)).collect();
    let names: HashMap<&str, &str> = products
        .iter()
        .map(|p| (p.id.as_str(), p.name.as_str()))
        .collect();

    charges
        .iter()
        .map(|charge| {
            let balance = by_source.get(charge.id.as_str());
            let exchange_rate = balance.and_then(|b| b.exchange_rate).unwrap_or(1.0);

            let name = charge
                .metadata
                .get("product_key")
                .and_then(|key| names.get(key.as_str()))
                .map(|n| (*n).to_string());

            EnrichedCharge {
                id: charge.id.clone(),
                created: charge.created,
                amount_captured_usd: charge.amount_captured as f64 * exchange_rate / 100.0,
                refunded: charge.refunded,
                amount_refunded: charge.amount_refunded,
                currency: balance.map(|b| b.currency.clone()),
                name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use subpulse_core::{CouponDuration, CouponInfo, Discount, PlanInfo, PlanInterval, SubscriptionStatus};

    fn sub_with_plan(id: &str, product: &str) -> SubscriptionRecord {
        SubscriptionRecord {
            id: id.to_string(),
            customer: "cus_a".to_string(),
            status: SubscriptionStatus::Active,
            created: Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap(),
            canceled_at: None,
            cancel_at: None,
            trial_end: None,
            quantity: 1,
            plan: Some(PlanInfo {
                amount: 2000,
                interval: PlanInterval::Month,
                product: product.to_string(),
            }),
            discount: None,
        }
    }

    #[test]
    fn test_flatten_extracts_plan_and_coupon() {
        let mut sub = sub_with_plan("sub_1", "prod_a");
        sub.discount = Some(Discount {
            coupon: CouponInfo {
                percent_off: 25.0,
                duration: CouponDuration::Forever,
            },
        });

        let flat = flatten_subscription(&sub).unwrap();
        assert_eq!(flat.plan_amount, 2000);
        assert_eq!(flat.plan_interval, PlanInterval::Month);
        assert_eq!(flat.product, "prod_a");
        assert_eq!(flat.percent_off, 25.0);
        assert_eq!(flat.coupon_duration, Some(CouponDuration::Forever));
        assert!(flat.name.is_none());
    }

    #[test]
    fn test_flatten_without_plan_is_missing_field() {
        let mut sub = sub_with_plan("sub_1", "prod_a");
        sub.plan = None;

        assert!(matches!(
            flatten_subscription(&sub),
            Err(MetricsError::MissingField { .. })
        ));
    }

    #[test]
    fn test_no_coupon_means_zero_percent_off() {
        let flat = flatten_subscription(&sub_with_plan("sub_1", "prod_a")).unwrap();
        assert_eq!(flat.percent_off, 0.0);
        assert!(flat.coupon_duration.is_none());
    }

    #[test]
    fn test_enrich_drops_planless_rows() {
        let mut planless = sub_with_plan("sub_planless", "prod_a");
        planless.plan = None;
        let subs = vec![sub_with_plan("sub_ok", "prod_a"), planless];

        let enriched = enrich_subscriptions(&subs, None);
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].id, "sub_ok");
    }

    #[test]
    fn test_product_join_resolves_names_and_drops_unmatched() {
        let subs = vec![
            sub_with_plan("sub_known", "prod_a"),
            sub_with_plan("sub_unknown", "prod_zzz"),
        ];
        let catalog = vec![ProductRecord {
            id: "prod_a".to_string(),
            name: "Pro".to_string(),
        }];

        let enriched = enrich_subscriptions(&subs, Some(&catalog));
        assert_eq!(enriched.len(), 1);
        assert_eq!(enriched[0].name.as_deref(), Some("Pro"));
    }

    #[test]
    fn test_enrich_charges_converts_currency_and_joins_names() {
        let mut metadata = std::collections::HashMap::new();
        metadata.insert("product_key".to_string(), "prod_a".to_string());

        let charges = vec![
            ChargeRecord {
                id: "ch_eur".to_string(),
                created: Utc.with_ymd_and_hms(2026, 7, 1, 12, 0, 0).unwrap(),
                amount_captured: 10_000,
                refunded: false,
                amount_refunded: 0,
                metadata,
            },
            ChargeRecord {
                id: "ch_usd".to_string(),
                created: Utc.with_ymd_and_hms(2026, 7, 2, 12, 0, 0).unwrap(),
                amount_captured: 5_000,
                refunded: false,
                amount_refunded: 0,
                metadata: Default::default(),
            },
        ];
        let balances = vec![BalanceTransactionRecord {
            source: "ch_eur".to_string(),
            currency: "eur".to_string(),
            exchange_rate: Some(1.1),
            txn_type: "charge".to_string(),
        }];
        let products = vec![ProductRecord {
            id: "prod_a".to_string(),
            name: "Pro".to_string(),
        }];

        let enriched = enrich_charges(&charges, &products, &balances);
        assert_eq!(enriched.len(), 2);

        let eur = enriched.iter().find(|c| c.id == "ch_eur").unwrap();
        assert!((eur.amount_captured_usd - 110.0).abs() < 1e-9);
        assert_eq!(eur.currency.as_deref(), Some("eur"));
        assert_eq!(eur.name.as_deref(), Some("Pro"));

        let usd = enriched.iter().find(|c| c.id == "ch_usd").unwrap();
        assert_eq!(usd.amount_captured_usd, 50.0);
        assert!(usd.currency.is_none());
        assert!(usd.name.is_none());
    }
}
