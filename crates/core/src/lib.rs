pub mod config;
pub mod error;
pub mod records;

pub use config::AppConfig;
pub use error::{MetricsError, MetricsResult};
pub use records::{
    BalanceTransactionRecord, ChargeRecord, CouponDuration, CouponInfo, Discount, EnrichedCharge,
    EnrichedSubscription, PlanInfo, PlanInterval, ProductRecord, SubscriptionLike,
    SubscriptionRecord, SubscriptionStatus,
};
