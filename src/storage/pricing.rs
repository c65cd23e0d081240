//! Storage cost estimation
//!
//! Prices come from live protocol state, cached per network for a short TTL.
//! The network's own cost function is preferred; the unit formula is only used
//! when that query fails.

use super::encoding::encoded_size;
use crate::config::Network;
use crate::constants::{frost_to_wal, BYTES_PER_UNIT_SIZE};
use crate::error::{Error, Result};
use crate::types::{CostSource, LiveCost, PricingSnapshot, StorageCostEstimate};
use dashmap::DashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

/// Source of live storage pricing
pub trait StoragePricingSource: Send + Sync {
    /// Current prices, committee size and subsidy rate
    fn snapshot(&self) -> impl std::future::Future<Output = Result<PricingSnapshot>> + Send;

    /// Cost as computed by the network itself
    fn live_cost(
        &self,
        raw_size: u64,
        epochs: u32,
    ) -> impl std::future::Future<Output = Result<LiveCost>> + Send;
}

#[derive(Debug, Clone, Copy)]
struct CachedSnapshot {
    fetched_at: Instant,
    snapshot: PricingSnapshot,
}

/// Time-keyed pricing snapshots, one per network.
///
/// Writes are idempotent re-fetches, so concurrent refreshes simply race and
/// the last one wins.
#[derive(Debug, Default)]
pub struct PricingCache {
    entries: DashMap<Network, CachedSnapshot>,
}

impl PricingCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, network: Network, ttl: Duration) -> Option<PricingSnapshot> {
        let entry = self.entries.get(&network)?;
        (entry.fetched_at.elapsed() < ttl).then_some(entry.snapshot)
    }

    pub fn insert(&self, network: Network, snapshot: PricingSnapshot) {
        self.entries.insert(
            network,
            CachedSnapshot {
                fetched_at: Instant::now(),
                snapshot,
            },
        );
    }

    pub fn invalidate(&self, network: Network) {
        self.entries.remove(&network);
    }
}

/// Number of 1 MiB billing units covering `encoded_bytes`
pub fn billing_units(encoded_bytes: u64) -> u64 {
    encoded_bytes.div_ceil(BYTES_PER_UNIT_SIZE)
}

/// Storage and write cost from unit prices, in FROST. `None` on overflow.
pub fn formula_cost(
    billing_units: u64,
    snapshot: &PricingSnapshot,
    epochs: u32,
) -> Option<LiveCost> {
    let units = billing_units as u128;
    Some(LiveCost {
        storage_cost: units
            .checked_mul(snapshot.storage_price_per_unit as u128)?
            .checked_mul(epochs as u128)?,
        write_cost: units.checked_mul(snapshot.write_price_per_unit as u128)?,
    })
}

/// Converts payload sizes into storage cost estimates
pub struct PricingEngine<S> {
    source: S,
    network: Network,
    cache: Arc<PricingCache>,
    ttl: Duration,
    max_epochs_ahead: u32,
}

impl<S: StoragePricingSource> PricingEngine<S> {
    pub fn new(source: S, network: Network, ttl: Duration, max_epochs_ahead: u32) -> Self {
        Self {
            source,
            network,
            cache: Arc::new(PricingCache::new()),
            ttl,
            max_epochs_ahead,
        }
    }

    /// Share a cache with other engines
    pub fn with_cache(mut self, cache: Arc<PricingCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn network(&self) -> Network {
        self.network
    }

    /// Drop the cached snapshot so the next estimate re-queries the network
    pub fn invalidate(&self) {
        self.cache.invalidate(self.network);
    }

    /// Pricing snapshot, from cache when fresh
    pub async fn snapshot(&self) -> Result<PricingSnapshot> {
        if let Some(snapshot) = self.cache.get(self.network, self.ttl) {
            return Ok(snapshot);
        }

        let snapshot = self.source.snapshot().await.map_err(|err| {
            warn!(network = %self.network, error = ?err, "Storage pricing query failed");
            Error::PricingUnavailable(Box::new(err))
        })?;

        debug!(network = %self.network, ?snapshot, "Refreshed storage pricing");
        self.cache.insert(self.network, snapshot);
        Ok(snapshot)
    }

    /// Estimate the cost of storing `raw_size` bytes for `epochs` epochs
    pub async fn estimate(&self, raw_size: u64, epochs: u32) -> Result<StorageCostEstimate> {
        if epochs == 0 || epochs > self.max_epochs_ahead {
            return Err(Error::validation(
                "epochs",
                format!("must be between 1 and {}", self.max_epochs_ahead),
            ));
        }

        let snapshot = self.snapshot().await?;
        let sizes = encoded_size(raw_size, snapshot.shard_count)?;
        let units = billing_units(sizes.encoded_bytes);

        let overflow = || Error::EncodingOverflow {
            raw_size,
            shard_count: snapshot.shard_count,
        };

        let (cost, source) = match self.source.live_cost(raw_size, epochs).await {
            Ok(cost) => (cost, CostSource::Network),
            Err(err) => {
                warn!(
                    raw_size,
                    epochs,
                    error = %err,
                    "Live storage cost query failed, falling back to unit prices"
                );
                let cost = formula_cost(units, &snapshot, epochs).ok_or_else(overflow)?;
                (cost, CostSource::Formula)
            }
        };

        let total = cost
            .storage_cost
            .checked_add(cost.write_cost)
            .ok_or_else(overflow)?;
        let subsidy_rate = snapshot.subsidy_rate();
        let subsidized = |wal: f64| wal * (1.0 - subsidy_rate);

        let storage_wal = frost_to_wal(cost.storage_cost);
        let write_wal = frost_to_wal(cost.write_cost);
        let total_wal = frost_to_wal(total);

        Ok(StorageCostEstimate {
            raw_size,
            encoded_size: sizes.encoded_bytes,
            metadata_size: sizes.metadata_bytes,
            billing_units: units,
            epochs,
            storage_cost_frost: cost.storage_cost,
            write_cost_frost: cost.write_cost,
            total_cost_frost: total,
            storage_cost_wal: storage_wal,
            write_cost_wal: write_wal,
            total_cost_wal: total_wal,
            subsidized_storage_cost_wal: subsidized(storage_wal),
            subsidized_write_cost_wal: subsidized(write_wal),
            subsidized_total_cost_wal: subsidized(total_wal),
            subsidy_rate,
            source,
        })
    }
}
