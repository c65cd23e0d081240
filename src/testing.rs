//! In-memory doubles for the ledger, price feed and pricing ports

use crate::config::{Network, NetworkConfig, OracleConfig, WalrusConfig};
use crate::error::{eyre, Result};
use crate::ledger::{DryRunGas, DryRunOutcome, LedgerClient};
use crate::oracle::OracleObjects;
use crate::price::{PriceFeed, PriceUpdate};
use crate::ptb::DonationTransaction;
use crate::storage::StoragePricingSource;
use crate::types::{
    CoinPage, CoinRecord, FeedId, LiveCost, ObjectDigest, ObjectId, ObjectRef, PricingSnapshot,
    SharedObjectRef, SuiAddress, TokenDescriptor,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

pub(crate) fn coin(id_byte: u8, balance: u64) -> CoinRecord {
    CoinRecord {
        object_id: ObjectId::new([id_byte; 32]),
        balance,
        version: 1,
        digest: ObjectDigest([id_byte; 32]),
    }
}

pub(crate) fn sample_token(coin_type: &str, decimals: u8) -> TokenDescriptor {
    let symbol = coin_type.rsplit("::").next().unwrap_or(coin_type).to_string();
    TokenDescriptor {
        coin_type: coin_type.to_string(),
        symbol,
        decimals,
        enabled: true,
        feed_id: FeedId::repeat_byte(0x11),
        max_price_age_secs: 60,
        price_info_object: ObjectId::new([0x77; 32]),
    }
}

pub(crate) fn oracle_config() -> OracleConfig {
    OracleConfig::new(
        ObjectId::new([0x30; 32]),
        ObjectId::new([0x31; 32]),
        ObjectId::new([0x32; 32]),
    )
}

pub(crate) fn oracle_objects() -> OracleObjects {
    OracleObjects {
        pyth_state: SharedObjectRef::new(ObjectId::new([0x31; 32]), 3, false),
        wormhole_state: SharedObjectRef::new(ObjectId::new([0x32; 32]), 3, false),
        price_info: SharedObjectRef::new(ObjectId::new([0x77; 32]), 5, true),
        clock: SharedObjectRef::new(ObjectId::new([0x06; 32]), 1, false),
    }
}

pub(crate) fn network_config() -> NetworkConfig {
    NetworkConfig::new(
        Network::Testnet,
        ObjectId::new([0x40; 32]),
        ObjectId::new([0x41; 32]),
        oracle_config(),
        WalrusConfig::new(ObjectId::new([0x50; 32])),
    )
}

/// Ledger holding a fixed coin set per coin type
pub(crate) struct MockLedger {
    coins: HashMap<String, Vec<CoinRecord>>,
    page_size: usize,
    dry_run_gas: Option<DryRunGas>,
    reference_gas_price: u64,
    calls: AtomicUsize,
    coin_page_calls: AtomicUsize,
    dry_run_calls: AtomicUsize,
}

impl MockLedger {
    pub(crate) fn new() -> Self {
        Self {
            coins: HashMap::new(),
            page_size: usize::MAX,
            dry_run_gas: None,
            reference_gas_price: 750,
            calls: AtomicUsize::new(0),
            coin_page_calls: AtomicUsize::new(0),
            dry_run_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_coins(mut self, coin_type: &str, coins: Vec<CoinRecord>) -> Self {
        self.coins.insert(coin_type.to_string(), coins);
        self
    }

    pub(crate) fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    /// Dry runs succeed with `gas`; without this they report failure
    pub(crate) fn with_dry_run_gas(mut self, gas: DryRunGas) -> Self {
        self.dry_run_gas = Some(gas);
        self
    }

    pub(crate) fn with_reference_gas_price(mut self, price: u64) -> Self {
        self.reference_gas_price = price;
        self
    }

    pub(crate) fn network_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub(crate) fn coin_page_calls(&self) -> usize {
        self.coin_page_calls.load(Ordering::SeqCst)
    }

    pub(crate) fn dry_run_calls(&self) -> usize {
        self.dry_run_calls.load(Ordering::SeqCst)
    }

    fn record(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }
}

impl LedgerClient for MockLedger {
    async fn coins_page(
        &self,
        _owner: &SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<CoinPage> {
        self.record();
        self.coin_page_calls.fetch_add(1, Ordering::SeqCst);

        let all = self.coins.get(coin_type).cloned().unwrap_or_default();
        let start = match cursor {
            Some(cursor) => cursor.parse::<usize>().map_err(|e| eyre!("bad cursor: {}", e))?,
            None => 0,
        };
        let end = all.len().min(start.saturating_add(limit.min(self.page_size)));
        let has_next_page = end < all.len();

        Ok(CoinPage {
            coins: all.get(start..end).map(<[_]>::to_vec).unwrap_or_default(),
            next_cursor: has_next_page.then(|| end.to_string()),
            has_next_page,
        })
    }

    async fn object_ref(&self, id: &ObjectId) -> Result<ObjectRef> {
        self.record();
        Ok(ObjectRef {
            object_id: *id,
            version: 7,
            digest: ObjectDigest(*id.as_bytes()),
        })
    }

    async fn shared_object(&self, id: &ObjectId, mutable: bool) -> Result<SharedObjectRef> {
        self.record();
        Ok(SharedObjectRef::new(*id, 2, mutable))
    }

    async fn reference_gas_price(&self) -> Result<u64> {
        self.record();
        Ok(self.reference_gas_price)
    }

    async fn dry_run(&self, _tx: &DonationTransaction) -> Result<DryRunOutcome> {
        self.record();
        self.dry_run_calls.fetch_add(1, Ordering::SeqCst);

        Ok(match self.dry_run_gas {
            Some(gas) => DryRunOutcome {
                success: true,
                gas,
                ..Default::default()
            },
            None => DryRunOutcome {
                success: false,
                error: Some("InsufficientGas".to_string()),
                ..Default::default()
            },
        })
    }
}

/// Feed returning a fixed price
pub(crate) struct MockPriceFeed {
    price: i64,
    expo: i32,
    age_secs: u64,
    calls: AtomicUsize,
}

impl MockPriceFeed {
    pub(crate) fn new(price: i64, expo: i32) -> Self {
        Self {
            price,
            expo,
            age_secs: 0,
            calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_age_secs(mut self, age_secs: u64) -> Self {
        self.age_secs = age_secs;
        self
    }

    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl PriceFeed for MockPriceFeed {
    async fn latest_update(&self, feed_id: &FeedId) -> Result<PriceUpdate> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as i64)
            .unwrap_or_default();

        Ok(PriceUpdate {
            feed_id: *feed_id,
            price: self.price,
            conf: 0,
            expo: self.expo,
            publish_time: now - self.age_secs as i64,
            update_data: b"PNAU".to_vec(),
        })
    }
}

/// Pricing source with a fixed snapshot and optional live cost
pub(crate) struct MockPricingSource {
    snapshot: Option<PricingSnapshot>,
    live_cost: Option<LiveCost>,
    pub(crate) snapshot_calls: AtomicUsize,
}

impl MockPricingSource {
    pub(crate) fn new(snapshot: PricingSnapshot) -> Self {
        Self {
            snapshot: Some(snapshot),
            live_cost: None,
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn failing() -> Self {
        Self {
            snapshot: None,
            live_cost: None,
            snapshot_calls: AtomicUsize::new(0),
        }
    }

    pub(crate) fn with_live_cost(mut self, cost: LiveCost) -> Self {
        self.live_cost = Some(cost);
        self
    }
}

impl StoragePricingSource for MockPricingSource {
    async fn snapshot(&self) -> Result<PricingSnapshot> {
        self.snapshot_calls.fetch_add(1, Ordering::SeqCst);
        self.snapshot
            .ok_or_else(|| eyre!("system object unavailable").into())
    }

    async fn live_cost(&self, _raw_size: u64, _epochs: u32) -> Result<LiveCost> {
        self.live_cost
            .ok_or_else(|| eyre!("no cost function configured").into())
    }
}
