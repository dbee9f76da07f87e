//! Subscription lifecycle and revenue metrics engine.
//!
//! Every operation is a pure projection of `(records, date, interval,
//! product)`: nothing here holds state between calls, mutates its inputs,
//! or performs I/O. Independent metric computations for different dates or
//! products can run in parallel without coordination.

pub mod calendar;
pub mod charges;
pub mod lifecycle;
pub mod rates;
pub mod revenue;

/// Rolling-window length used across metrics unless overridden.
pub const DEFAULT_INTERVAL_DAYS: i64 = 30;

/// Shorter lookahead used for per-customer revenue breakdowns.
pub const DEFAULT_CUSTOMER_INTERVAL_DAYS: i64 = 14;
