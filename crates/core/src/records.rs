//! Snapshot record types consumed by the metrics engine.
//!
//! Raw records mirror the shapes a billing-API snapshot delivers (nested
//! plan/discount objects, Unix-second timestamps). Enriched records are the
//! flattened shapes produced by `subpulse-enrich`; revenue operations accept
//! only enriched records, so "needs enrichment" is visible in the signature.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Enums
// ---------------------------------------------------------------------------

/// Subscription lifecycle status as reported by the billing provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    PastDue,
    Canceled,
    Trialing,
    Unpaid,
    Incomplete,
    IncompleteExpired,
    Paused,
}

impl SubscriptionStatus {
    /// A surviving record keeps its owner out of the churned set.
    pub fn is_surviving(self) -> bool {
        matches!(self, SubscriptionStatus::Active | SubscriptionStatus::PastDue)
    }
}

/// Billing cadence of a plan. Day/week plans exist in snapshots but carry
/// no defined monthly normalization and are excluded from MRR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanInterval {
    Day,
    Week,
    Month,
    Year,
}

/// How long a coupon applies. Only `Forever` reduces recurring revenue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CouponDuration {
    Once,
    Repeating,
    Forever,
}

// ---------------------------------------------------------------------------
// Raw snapshot records
// ---------------------------------------------------------------------------

/// Plan details embedded in a subscription record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanInfo {
    /// Recurring amount in minor currency units (cents).
    pub amount: i64,
    pub interval: PlanInterval,
    /// Product id the plan bills for.
    pub product: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CouponInfo {
    /// Percentage discount in `[0, 100]`.
    pub percent_off: f64,
    pub duration: CouponDuration,
}

/// Discount attached to a subscription; decoded once, never probed ad hoc.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Discount {
    pub coupon: CouponInfo,
}

/// One subscription row at its snapshot state.
///
/// `canceled_at` is set only once a cancellation has taken effect;
/// `cancel_at` marks a scheduled future cancellation and is never a churn
/// event by itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionRecord {
    pub id: String,
    /// Owning customer; several subscriptions may share one customer.
    pub customer: String,
    pub status: SubscriptionStatus,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub canceled_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub cancel_at: Option<DateTime<Utc>>,
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub trial_end: Option<DateTime<Utc>>,
    #[serde(default = "default_quantity")]
    pub quantity: u64,
    #[serde(default)]
    pub plan: Option<PlanInfo>,
    #[serde(default)]
    pub discount: Option<Discount>,
}

fn default_quantity() -> u64 {
    1
}

/// Product catalog row, used to resolve display names during enrichment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductRecord {
    pub id: String,
    pub name: String,
}

/// One captured charge at its snapshot state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChargeRecord {
    pub id: String,
    #[serde(with = "chrono::serde::ts_seconds")]
    pub created: DateTime<Utc>,
    /// Captured amount in minor units of the charge currency.
    pub amount_captured: i64,
    #[serde(default)]
    pub refunded: bool,
    #[serde(default)]
    pub amount_refunded: i64,
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

/// Balance-transaction row; `source` points back at the charge id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceTransactionRecord {
    pub source: String,
    pub currency: String,
    /// Conversion rate into USD; absent for USD-native transactions.
    #[serde(default)]
    pub exchange_rate: Option<f64>,
    #[serde(rename = "type")]
    pub txn_type: String,
}

// ---------------------------------------------------------------------------
// Enriched records
// ---------------------------------------------------------------------------

/// Subscription with plan and coupon fields flattened by enrichment.
///
/// `name` is present only when product records were joined in; without it,
/// product filtering on this record set is unavailable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedSubscription {
    pub id: String,
    pub customer: String,
    pub status: SubscriptionStatus,
    pub created: DateTime<Utc>,
    pub canceled_at: Option<DateTime<Utc>>,
    pub cancel_at: Option<DateTime<Utc>>,
    pub trial_end: Option<DateTime<Utc>>,
    pub quantity: u64,
    /// Recurring amount in minor currency units.
    pub plan_amount: i64,
    pub plan_interval: PlanInterval,
    /// Product id from the plan.
    pub product: String,
    /// Effective percentage discount; 0 when no coupon is attached.
    pub percent_off: f64,
    /// `None` means the subscription carries no coupon.
    pub coupon_duration: Option<CouponDuration>,
    /// Product display name, set by the product join.
    pub name: Option<String>,
}

/// Charge with balance-transaction and product fields joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedCharge {
    pub id: String,
    pub created: DateTime<Utc>,
    /// Captured amount converted to USD, in major units.
    pub amount_captured_usd: f64,
    pub refunded: bool,
    /// Refunded amount in minor units of the charge currency.
    pub amount_refunded: i64,
    pub currency: Option<String>,
    /// Product display name resolved via the charge's `product_key` metadata.
    pub name: Option<String>,
}

// ---------------------------------------------------------------------------
// Classifier view
// ---------------------------------------------------------------------------

/// Accessor view the lifecycle classifier operates on.
///
/// `product_name` encodes the product-filter capability in the type:
/// [`SubscriptionRecord`] always answers `None`, so a product filter over
/// raw records is a no-op by contract, while [`EnrichedSubscription`]
/// answers with the joined display name.
pub trait SubscriptionLike {
    fn id(&self) -> &str;
    fn customer(&self) -> &str;
    fn status(&self) -> SubscriptionStatus;
    fn created(&self) -> DateTime<Utc>;
    fn canceled_at(&self) -> Option<DateTime<Utc>>;
    fn cancel_at(&self) -> Option<DateTime<Utc>>;
    fn trial_end(&self) -> Option<DateTime<Utc>>;
    fn quantity(&self) -> u64;
    fn product_name(&self) -> Option<&str>;
}

impl SubscriptionLike for SubscriptionRecord {
    fn id(&self) -> &str {
        &self.id
    }
    fn customer(&self) -> &str {
        &self.customer
    }
    fn status(&self) -> SubscriptionStatus {
        self.status
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }
    fn cancel_at(&self) -> Option<DateTime<Utc>> {
        self.cancel_at
    }
    fn trial_end(&self) -> Option<DateTime<Utc>> {
        self.trial_end
    }
    fn quantity(&self) -> u64 {
        self.quantity
    }
    fn product_name(&self) -> Option<&str> {
        None
    }
}

impl SubscriptionLike for EnrichedSubscription {
    fn id(&self) -> &str {
        &self.id
    }
    fn customer(&self) -> &str {
        &self.customer
    }
    fn status(&self) -> SubscriptionStatus {
        self.status
    }
    fn created(&self) -> DateTime<Utc> {
        self.created
    }
    fn canceled_at(&self) -> Option<DateTime<Utc>> {
        self.canceled_at
    }
    fn cancel_at(&self) -> Option<DateTime<Utc>> {
        self.cancel_at
    }
    fn trial_end(&self) -> Option<DateTime<Utc>> {
        self.trial_end
    }
    fn quantity(&self) -> u64 {
        self.quantity
    }
    fn product_name(&self) -> Option<&str> {
        self.name.as_deref()
    }
}
