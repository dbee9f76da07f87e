//! SubPulse — subscription-billing health metrics from snapshot files.
//!
//! Loads subscription / product / charge / balance-transaction JSON
//! snapshots, enriches them, and prints a metrics report for a reference
//! date, rolling interval, and optional product filter.

use anyhow::Context;
use clap::Parser;
use serde::Serialize;
use std::path::{Path, PathBuf};
use subpulse_core::{
    AppConfig, BalanceTransactionRecord, ChargeRecord, ProductRecord, SubscriptionRecord,
};
use subpulse_enrich::{enrich_charges, enrich_subscriptions};
use subpulse_metrics::{charges, lifecycle, rates, revenue};
use tracing::info;

#[derive(Parser, Debug)]
#[command(name = "subpulse")]
#[command(about = "Subscription-billing health metrics from billing snapshots")]
#[command(version)]
struct Cli {
    /// Subscription snapshot (JSON array)
    #[arg(long, env = "SUBPULSE__SUBSCRIPTIONS")]
    subscriptions: PathBuf,

    /// Product snapshot; enables product-name filtering
    #[arg(long, env = "SUBPULSE__PRODUCTS")]
    products: Option<PathBuf>,

    /// Charge snapshot; enables charge revenue totals
    #[arg(long, env = "SUBPULSE__CHARGES")]
    charges: Option<PathBuf>,

    /// Balance-transaction snapshot for currency conversion
    #[arg(long, env = "SUBPULSE__BALANCES")]
    balances: Option<PathBuf>,

    /// Reference date (YYYY-MM-DD)
    #[arg(long)]
    date: String,

    /// Rolling window length in days (overrides config)
    #[arg(long)]
    interval_days: Option<i64>,

    /// Restrict metrics to one product by display name
    #[arg(long)]
    product: Option<String>,

    /// Also report MRR for this customer id
    #[arg(long)]
    customer: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChargeTotals {
    total_revenue: f64,
    total_refunded: f64,
    total_refunds: u64,
}

#[derive(Debug, Serialize)]
struct MetricsReport {
    date: String,
    interval_days: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    product: Option<String>,
    active_subscriptions: usize,
    active_subscribers: usize,
    new_subscriptions: usize,
    new_subscribers: usize,
    churned_subscriptions: usize,
    churned_customers: usize,
    monthly_recurring_revenue: f64,
    revenue_per_subscriber: f64,
    churned_subscribers_rate: f64,
    subscribers_retention_rate: f64,
    churned_subscriptions_rate: f64,
    subscription_retention_rate: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    charges: Option<ChargeTotals>,
    #[serde(skip_serializing_if = "Option::is_none")]
    customer_mrr: Option<f64>,
}

fn load_snapshot<T: serde::de::DeserializeOwned>(dir: &str, path: &Path) -> anyhow::Result<Vec<T>> {
    let resolved = if path.is_absolute() {
        path.to_path_buf()
    } else {
        Path::new(dir).join(path)
    };
    let raw = std::fs::read_to_string(&resolved)
        .with_context(|| format!("reading snapshot {}", resolved.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("decoding snapshot {}", resolved.display()))
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "subpulse=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = AppConfig::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load config, using defaults");
        AppConfig::default()
    });

    let interval_days = cli.interval_days.unwrap_or(config.interval_days);
    let product = cli.product.as_deref();
    let dir = &config.snapshots.dir;

    let subs: Vec<SubscriptionRecord> = load_snapshot(dir, &cli.subscriptions)?;
    let product_records: Option<Vec<ProductRecord>> = match &cli.products {
        Some(path) => Some(load_snapshot(dir, path)?),
        None => None,
    };

    info!(
        subscriptions = subs.len(),
        products = product_records.as_ref().map_or(0, Vec::len),
        date = %cli.date,
        interval_days,
        "Snapshots loaded"
    );

    let enriched = enrich_subscriptions(&subs, product_records.as_deref());

    let charge_totals = match (&cli.charges, &cli.balances) {
        (Some(charge_path), balance_path) => {
            let charge_records: Vec<ChargeRecord> = load_snapshot(dir, charge_path)?;
            let balance_records: Vec<BalanceTransactionRecord> = match balance_path {
                Some(path) => load_snapshot(dir, path)?,
                None => Vec::new(),
            };
            let enriched_charges = enrich_charges(
                &charge_records,
                product_records.as_deref().unwrap_or(&[]),
                &balance_records,
            );

            Some(ChargeTotals {
                total_revenue: charges::total_revenue(
                    &enriched_charges,
                    &cli.date,
                    product,
                    interval_days,
                )?,
                total_refunded: charges::total_refunded(
                    &enriched_charges,
                    &cli.date,
                    product,
                    interval_days,
                )?,
                total_refunds: charges::total_refunds(
                    &enriched_charges,
                    &cli.date,
                    product,
                    interval_days,
                )?,
            })
        }
        (None, _) => None,
    };

    let customer_mrr = match &cli.customer {
        Some(customer_id) => Some(revenue::mrr_per_customer(
            customer_id,
            &enriched,
            &cli.date,
            product,
            config.customer_interval_days,
        )?),
        None => None,
    };

    let report = MetricsReport {
        date: cli.date.clone(),
        interval_days,
        product: cli.product.clone(),
        active_subscriptions: lifecycle::active_subscriptions(
            &enriched, &cli.date, product, interval_days,
        )?
        .len(),
        active_subscribers: lifecycle::active_subscribers(
            &enriched, &cli.date, product, interval_days,
        )?
        .len(),
        new_subscriptions: lifecycle::new_subscriptions(
            &enriched, &cli.date, product, interval_days,
        )?
        .len(),
        new_subscribers: lifecycle::new_subscribers(&enriched, &cli.date, product, interval_days)?
            .len(),
        churned_subscriptions: lifecycle::churned_subscriptions(
            &enriched, &cli.date, product, interval_days,
        )?
        .len(),
        churned_customers: lifecycle::churned_customers(
            &enriched, &cli.date, product, interval_days,
        )?
        .len(),
        monthly_recurring_revenue: revenue::monthly_recurring_revenue(
            &enriched, &cli.date, product, interval_days,
        )?,
        revenue_per_subscriber: revenue::revenue_per_subscriber(
            &enriched, &cli.date, product, interval_days,
        )?,
        churned_subscribers_rate: rates::churned_subscribers_rate(
            &enriched, &cli.date, product, interval_days,
        )?,
        subscribers_retention_rate: rates::subscribers_retention_rate(
            &enriched, &cli.date, product, interval_days,
        )?,
        churned_subscriptions_rate: rates::churned_subscriptions_rate(
            &enriched, &cli.date, product, interval_days,
        )?,
        subscription_retention_rate: rates::subscription_retention_rate(
            &enriched, &cli.date, product, interval_days,
        )?,
        charges: charge_totals,
        customer_mrr,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
