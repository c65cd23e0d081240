//! Crowdfund SDK for Rust
//!
//! Client-side core of a Sui crowdfunding platform: turns donation form input
//! into unsigned programmable transactions and quotes Walrus storage costs.
//!
//! # Features
//!
//! - Exact decimal amount parsing (no floating point)
//! - Coin selection with merge/split to the exact donation amount
//! - Pyth price updates attached to the donation, with a slippage floor
//! - Gas reserve estimation for donations paid in SUI
//! - Walrus encoded-size and storage cost estimates
//!
//! # Example
//!
//! ```rust,ignore
//! use crowdfund_sdk::{
//!     parse_to_raw_amount, RpcCrowdfundClient, DonationFlow, DonationRequest, Network, NetworkConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> crowdfund_sdk::Result<()> {
//!     let config = NetworkConfig::from_env(Network::Testnet)?;
//!     let client = RpcCrowdfundClient::connect(config)?;
//!
//!     let raw_amount = parse_to_raw_amount("12.5", token.decimals)?;
//!     let request = DonationRequest::new(donor, campaign_id, stats_id, token, raw_amount)
//!         .with_slippage_bps(100);
//!     let built = client.build_donation(&request, DonationFlow::FirstTime).await?;
//!
//!     let quote = client.estimate_storage_cost(5_000_000, 2).await?;
//!     println!("{} WAL", quote.total_cost_wal);
//!     Ok(())
//! }
//! ```

pub mod amount;
pub mod client;
pub mod coin;
pub mod config;
pub mod constants;
pub mod contracts;
pub mod donation;
pub mod error;
pub mod gas;
pub mod ledger;
pub mod oracle;
pub mod price;
pub mod ptb;
pub mod rpc;
pub mod signer;
pub mod storage;
pub mod types;

#[cfg(test)]
mod testing;

// Re-export main types for convenience
pub use amount::{format_raw_amount, parse_to_raw_amount};
pub use client::{CrowdfundClient, RpcCrowdfundClient};
pub use coin::{CoinSelection, CoinSelector};
pub use config::{Network, NetworkConfig, OracleConfig, WalrusConfig};
pub use donation::DonationTransactionBuilder;
pub use error::{eyre, Context, Error, Report, Result};
pub use gas::{GasReserveEstimator, GasReservePolicy, ReserveState};
pub use ledger::{DryRunGas, DryRunOutcome, LedgerClient};
pub use oracle::{derive_minimum_acceptable, PriceOracleAdapter};
pub use price::{HermesClient, PriceFeed, PriceUpdate};
pub use ptb::{DonationTransaction, PtbBuilder};
pub use rpc::SuiRpcClient;
pub use signer::TransactionSigner;
pub use storage::{encoded_size, PricingCache, PricingEngine, StoragePricingSource};
pub use types::{
    CoinRecord, DonationBuildResult, DonationFlow, DonationRequest, ObjectId, PriceQuote,
    StorageCostEstimate, SuiAddress, TokenDescriptor,
};
