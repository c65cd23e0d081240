//! CrowdfundClient - main entry point for the SDK

use crate::coin::CoinSelector;
use crate::config::NetworkConfig;
use crate::donation::DonationTransactionBuilder;
use crate::error::{Error, Result};
use crate::ledger::LedgerClient;
use crate::oracle::PriceOracleAdapter;
use crate::price::{HermesClient, PriceFeed};
use crate::rpc::SuiRpcClient;
use crate::signer::TransactionSigner;
use crate::storage::{PricingCache, PricingEngine, StoragePricingSource};
use crate::types::{
    DonationBuildResult, DonationFlow, DonationRequest, StorageCostEstimate, SuiAddress,
};
use std::sync::Arc;
use tracing::info;

/// Client backed by a Sui full node and Pyth Hermes
pub type RpcCrowdfundClient = CrowdfundClient<SuiRpcClient, HermesClient, SuiRpcClient>;

/// Main client for building donations and quoting storage
pub struct CrowdfundClient<L, P, S> {
    config: NetworkConfig,
    ledger: L,
    oracle: PriceOracleAdapter<P>,
    pricing: PricingEngine<S>,
}

impl RpcCrowdfundClient {
    /// Connect to the endpoints in `config`
    pub fn connect(config: NetworkConfig) -> Result<Self> {
        let rpc = SuiRpcClient::new(config.rpc_url.clone(), config.walrus.clone())?;
        let hermes = HermesClient::new(config.hermes_url.clone())?;
        info!(network = %config.network, rpc_url = %config.rpc_url, "Connected crowdfund client");
        Ok(Self::new(config, rpc.clone(), hermes, rpc))
    }
}

impl<L, P, S> CrowdfundClient<L, P, S>
where
    L: LedgerClient,
    P: PriceFeed,
    S: StoragePricingSource,
{
    /// Create a client from explicit port implementations
    pub fn new(config: NetworkConfig, ledger: L, feed: P, pricing_source: S) -> Self {
        let oracle = PriceOracleAdapter::new(feed, config.oracle.clone());
        let pricing = PricingEngine::new(
            pricing_source,
            config.network,
            config.pricing_cache_ttl,
            config.max_epochs_ahead,
        );
        Self {
            config,
            ledger,
            oracle,
            pricing,
        }
    }

    /// Share a pricing cache with other clients on the same process
    pub fn with_pricing_cache(mut self, cache: Arc<PricingCache>) -> Self {
        self.pricing = self.pricing.with_cache(cache);
        self
    }

    /// Get the network configuration
    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    // ========== Donations ==========

    /// Build an unsigned donation transaction
    pub async fn build_donation(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
    ) -> Result<DonationBuildResult> {
        DonationTransactionBuilder::new(&self.config, &self.ledger, &self.oracle)
            .build(request, flow)
            .await
    }

    /// Hand a built donation to `signer`, returning the transaction digest
    pub async fn submit_donation<T: TransactionSigner>(
        &self,
        signer: &T,
        built: &DonationBuildResult,
    ) -> Result<String> {
        let sender = built.transaction.sender;
        if signer.address() != sender {
            return Err(Error::validation(
                "signer",
                format!("signer {} cannot sign for {}", signer.address(), sender),
            ));
        }

        let digest = signer.sign_and_execute(&built.transaction).await?;
        info!(
            %digest,
            symbol = %built.token.symbol,
            raw_amount = built.raw_amount,
            "Donation submitted"
        );
        Ok(digest)
    }

    /// Total balance of `coin_type` held by `owner`
    pub async fn balance(&self, owner: &SuiAddress, coin_type: &str) -> Result<u64> {
        let selection = CoinSelector::new(&self.ledger)
            .select_up_to(owner, coin_type, u64::MAX)
            .await?;
        Ok(selection.total)
    }

    // ========== Storage ==========

    /// Estimate the cost of storing `raw_size` bytes for `epochs` epochs
    pub async fn estimate_storage_cost(
        &self,
        raw_size: u64,
        epochs: u32,
    ) -> Result<StorageCostEstimate> {
        self.pricing.estimate(raw_size, epochs).await
    }

    /// Force the next storage estimate to re-query prices
    pub fn refresh_storage_pricing(&self) {
        self.pricing.invalidate();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ptb::DonationTransaction;
    use crate::testing::{
        coin, network_config, sample_token, MockLedger, MockPriceFeed, MockPricingSource,
    };
    use crate::types::{ObjectId, PricingSnapshot};
    use std::sync::Mutex;

    const DONOR: SuiAddress = ObjectId::new([0xaa; 32]);
    const USDC: &str = "0xa::usdc::USDC";

    struct MockSigner {
        address: SuiAddress,
        signed: Mutex<Vec<DonationTransaction>>,
    }

    impl MockSigner {
        fn new(address: SuiAddress) -> Self {
            Self {
                address,
                signed: Mutex::new(Vec::new()),
            }
        }
    }

    impl TransactionSigner for MockSigner {
        fn address(&self) -> SuiAddress {
            self.address
        }

        async fn sign_and_execute(&self, tx: &DonationTransaction) -> Result<String> {
            self.signed.lock().unwrap().push(tx.clone());
            Ok("8Wkmqp5cFqe2HEKMS6cj4WSx7Rty4tTZMfeuTvVxKdAs".to_string())
        }
    }

    fn snapshot() -> PricingSnapshot {
        PricingSnapshot {
            storage_price_per_unit: 11_000,
            write_price_per_unit: 20_000,
            shard_count: 1000,
            subsidy_rate_bps: 0,
        }
    }

    fn client() -> CrowdfundClient<MockLedger, MockPriceFeed, MockPricingSource> {
        let ledger = MockLedger::new().with_coins(USDC, vec![coin(1, 3_000_000), coin(2, 500)]);
        CrowdfundClient::new(
            network_config(),
            ledger,
            MockPriceFeed::new(1, 0),
            MockPricingSource::new(snapshot()),
        )
    }

    fn request() -> DonationRequest {
        DonationRequest::new(
            DONOR,
            ObjectId::new([0xc1; 32]),
            ObjectId::new([0xc2; 32]),
            sample_token(USDC, 6),
            1_000_000,
        )
    }

    #[tokio::test]
    async fn test_build_and_submit() {
        let client = client();
        let built = client
            .build_donation(&request(), DonationFlow::FirstTime)
            .await
            .unwrap();

        let signer = MockSigner::new(DONOR);
        let digest = client.submit_donation(&signer, &built).await.unwrap();

        assert!(!digest.is_empty());
        let signed = signer.signed.lock().unwrap();
        assert_eq!(signed.len(), 1);
        assert_eq!(signed[0], built.transaction);
    }

    #[tokio::test]
    async fn test_submit_rejects_foreign_signer() {
        let client = client();
        let built = client
            .build_donation(&request(), DonationFlow::FirstTime)
            .await
            .unwrap();

        let signer = MockSigner::new(ObjectId::new([0xbb; 32]));
        let err = client.submit_donation(&signer, &built).await.unwrap_err();
        assert!(matches!(err, Error::Validation { field: "signer", .. }));
        assert!(signer.signed.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_balance_sums_all_coins() {
        assert_eq!(client().balance(&DONOR, USDC).await.unwrap(), 3_000_500);
    }

    #[tokio::test]
    async fn test_storage_estimate_through_client() {
        let estimate = client().estimate_storage_cost(5_000_000, 2).await.unwrap();
        assert_eq!(estimate.billing_units, 84);
        assert_eq!(estimate.total_cost_frost, 84 * 11_000 * 2 + 84 * 20_000);
    }
}
