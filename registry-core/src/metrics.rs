//! Metrics collection for observability
//!
//! This module provides Prometheus metrics for monitoring the registry.
//!
//! # Metrics
//!
//! - `registry_registrations_total` - Identity registrations issued
//! - `registry_mints_total` - Successful mint operations
//! - `registry_burns_total` - Successful burn operations
//! - `registry_transfers_total` - Successful transfers
//! - `registry_purchases_total` - Successful sale purchases
//! - `registry_rejections_total` - Rejected operations of any kind
//! - `registry_total_supply` - Current total supply (clamped to i64)
//! - `registry_custody_balance` - Current custody balance (clamped to i64)

use crate::types::Amount;
use prometheus::{IntCounter, IntGauge, Opts, Registry};
use std::sync::Arc;

/// Metrics collector
///
/// Each collector registers into its own `Registry`, so multiple
/// instances can coexist in one process.
#[derive(Clone)]
pub struct Metrics {
    /// Identity registrations issued
    pub registrations_total: IntCounter,

    /// Successful mints
    pub mints_total: IntCounter,

    /// Successful burns
    pub burns_total: IntCounter,

    /// Successful transfers
    pub transfers_total: IntCounter,

    /// Successful purchases
    pub purchases_total: IntCounter,

    /// Rejected operations
    pub rejections_total: IntCounter,

    /// Current total supply
    pub total_supply: IntGauge,

    /// Current custody balance
    pub custody_balance: IntGauge,

    /// Prometheus registry
    registry: Arc<Registry>,
}

impl Metrics {
    /// Create new metrics collector
    pub fn new() -> prometheus::Result<Self> {
        let registry = Arc::new(Registry::new());

        let registrations_total = IntCounter::with_opts(Opts::new(
            "registry_registrations_total",
            "Identity registrations issued",
        ))?;
        registry.register(Box::new(registrations_total.clone()))?;

        let mints_total = IntCounter::with_opts(Opts::new(
            "registry_mints_total",
            "Successful mint operations",
        ))?;
        registry.register(Box::new(mints_total.clone()))?;

        let burns_total = IntCounter::with_opts(Opts::new(
            "registry_burns_total",
            "Successful burn operations",
        ))?;
        registry.register(Box::new(burns_total.clone()))?;

        let transfers_total = IntCounter::with_opts(Opts::new(
            "registry_transfers_total",
            "Successful transfers",
        ))?;
        registry.register(Box::new(transfers_total.clone()))?;

        let purchases_total = IntCounter::with_opts(Opts::new(
            "registry_purchases_total",
            "Successful sale purchases",
        ))?;
        registry.register(Box::new(purchases_total.clone()))?;

        let rejections_total = IntCounter::with_opts(Opts::new(
            "registry_rejections_total",
            "Rejected operations of any kind",
        ))?;
        registry.register(Box::new(rejections_total.clone()))?;

        let total_supply = IntGauge::with_opts(Opts::new(
            "registry_total_supply",
            "Current total supply in base units",
        ))?;
        registry.register(Box::new(total_supply.clone()))?;

        let custody_balance = IntGauge::with_opts(Opts::new(
            "registry_custody_balance",
            "Current custody balance in external base units",
        ))?;
        registry.register(Box::new(custody_balance.clone()))?;

        Ok(Self {
            registrations_total,
            mints_total,
            burns_total,
            transfers_total,
            purchases_total,
            rejections_total,
            total_supply,
            custody_balance,
            registry,
        })
    }

    /// Record a rejected operation
    pub fn record_rejection(&self) {
        self.rejections_total.inc();
    }

    /// Update the total supply gauge
    pub fn set_total_supply(&self, supply: Amount) {
        self.total_supply.set(clamp_to_i64(supply));
    }

    /// Update the custody balance gauge
    pub fn set_custody_balance(&self, balance: Amount) {
        self.custody_balance.set(clamp_to_i64(balance));
    }

    /// Get metrics registry
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new().expect("metrics collector with a private registry cannot collide")
    }
}

/// Gauges are i64; amounts beyond that saturate at the top
fn clamp_to_i64(amount: Amount) -> i64 {
    amount.min(i64::MAX as Amount) as i64
}
