//! Storage pricing types for the cost-review screen

use crate::constants::BPS_DENOMINATOR;
use serde::Serialize;

/// Live protocol pricing state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PricingSnapshot {
    /// FROST per billing unit per epoch
    pub storage_price_per_unit: u64,
    /// FROST per billing unit, charged once
    pub write_price_per_unit: u64,
    /// Committee shard count
    pub shard_count: u16,
    /// Buyer subsidy in basis points
    pub subsidy_rate_bps: u32,
}

impl PricingSnapshot {
    /// Subsidy as a fraction clamped to `[0, 1]`
    pub fn subsidy_rate(&self) -> f64 {
        (self.subsidy_rate_bps as f64 / BPS_DENOMINATOR as f64).clamp(0.0, 1.0)
    }
}

/// Cost returned by the network's own cost function, in FROST
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LiveCost {
    pub storage_cost: u128,
    pub write_cost: u128,
}

/// Where the un-subsidised cost figures came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CostSource {
    Network,
    Formula,
}

/// Cost breakdown for storing one blob
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageCostEstimate {
    pub raw_size: u64,
    /// Erasure-coded size including metadata
    pub encoded_size: u64,
    pub metadata_size: u64,
    pub billing_units: u64,
    pub epochs: u32,

    pub storage_cost_frost: u128,
    pub write_cost_frost: u128,
    pub total_cost_frost: u128,

    pub storage_cost_wal: f64,
    pub write_cost_wal: f64,
    pub total_cost_wal: f64,

    pub subsidized_storage_cost_wal: f64,
    pub subsidized_write_cost_wal: f64,
    pub subsidized_total_cost_wal: f64,

    pub subsidy_rate: f64,
    pub source: CostSource,
}
