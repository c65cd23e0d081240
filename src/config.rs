//! Network configuration for the crowdfund SDK

use crate::constants::{
    DEFAULT_MAX_EPOCHS_AHEAD, DEFAULT_ORACLE_UPDATE_FEE, DEFAULT_PRICING_CACHE_TTL_SECS,
};
use crate::error::{Error, Result};
use crate::gas::GasReservePolicy;
use crate::ptb::MoveTarget;
use crate::types::ObjectId;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Sui network the SDK talks to; also the pricing cache key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
    Mainnet,
    Testnet,
    Devnet,
    Localnet,
}

impl Network {
    pub fn default_rpc_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://fullnode.mainnet.sui.io:443",
            Network::Testnet => "https://fullnode.testnet.sui.io:443",
            Network::Devnet => "https://fullnode.devnet.sui.io:443",
            Network::Localnet => "http://127.0.0.1:9000",
        }
    }

    pub fn default_hermes_url(&self) -> &'static str {
        match self {
            Network::Mainnet => "https://hermes.pyth.network",
            _ => "https://hermes-beta.pyth.network",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Network::Mainnet => "mainnet",
            Network::Testnet => "testnet",
            Network::Devnet => "devnet",
            Network::Localnet => "localnet",
        };
        f.write_str(name)
    }
}

impl FromStr for Network {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Network::Mainnet),
            "testnet" => Ok(Network::Testnet),
            "devnet" => Ok(Network::Devnet),
            "localnet" | "local" => Ok(Network::Localnet),
            other => Err(Error::Config(format!("unknown network {:?}", other))),
        }
    }
}

/// Price oracle update entry point and the objects it needs
#[derive(Debug, Clone)]
pub struct OracleConfig {
    /// Move function that verifies and stores a price update
    pub update_target: MoveTarget,
    pub pyth_state: ObjectId,
    pub wormhole_state: ObjectId,
    /// Fee paid per price update, in MIST
    pub update_fee: u64,
}

impl OracleConfig {
    pub fn new(package: ObjectId, pyth_state: ObjectId, wormhole_state: ObjectId) -> Self {
        Self {
            update_target: MoveTarget::new(package, "oracle", "update_price"),
            pyth_state,
            wormhole_state,
            update_fee: DEFAULT_ORACLE_UPDATE_FEE,
        }
    }
}

/// Walrus objects read for storage pricing
#[derive(Debug, Clone)]
pub struct WalrusConfig {
    pub system_object: ObjectId,
    pub subsidies_object: Option<ObjectId>,
    /// View function returning `(storage_cost, write_cost)` for a size and epoch count
    pub cost_function: Option<MoveTarget>,
}

impl WalrusConfig {
    pub fn new(system_object: ObjectId) -> Self {
        Self {
            system_object,
            subsidies_object: None,
            cost_function: None,
        }
    }
}

/// Network configuration containing endpoints and on-chain object ids
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    pub network: Network,
    /// Sui JSON-RPC endpoint
    pub rpc_url: String,
    /// Pyth Hermes endpoint
    pub hermes_url: String,
    /// Crowdfunding package id
    pub crowdfund_package: ObjectId,
    /// Shared token registry object
    pub token_registry: ObjectId,
    pub oracle: OracleConfig,
    pub walrus: WalrusConfig,
    pub gas_policy: GasReservePolicy,
    pub pricing_cache_ttl: Duration,
    pub max_epochs_ahead: u32,
}

impl NetworkConfig {
    /// Create a configuration with default endpoints for `network`
    pub fn new(
        network: Network,
        crowdfund_package: ObjectId,
        token_registry: ObjectId,
        oracle: OracleConfig,
        walrus: WalrusConfig,
    ) -> Self {
        Self {
            network,
            rpc_url: network.default_rpc_url().to_string(),
            hermes_url: network.default_hermes_url().to_string(),
            crowdfund_package,
            token_registry,
            oracle,
            walrus,
            gas_policy: GasReservePolicy::default(),
            pricing_cache_ttl: Duration::from_secs(DEFAULT_PRICING_CACHE_TTL_SECS),
            max_epochs_ahead: DEFAULT_MAX_EPOCHS_AHEAD,
        }
    }

    /// Load configuration from `CROWDFUND_*` and `WALRUS_*` environment variables
    pub fn from_env(network: Network) -> Result<Self> {
        dotenvy::dotenv().ok();

        let oracle_package = required_id("CROWDFUND_ORACLE_PACKAGE_ID")?;
        let mut oracle = OracleConfig::new(
            oracle_package,
            required_id("CROWDFUND_PYTH_STATE_ID")?,
            required_id("CROWDFUND_WORMHOLE_STATE_ID")?,
        );
        if let Some(fee) = optional_var("CROWDFUND_ORACLE_UPDATE_FEE") {
            oracle.update_fee = fee
                .parse()
                .map_err(|_| Error::Config(format!("invalid oracle update fee {:?}", fee)))?;
        }

        let mut walrus = WalrusConfig::new(required_id("WALRUS_SYSTEM_OBJECT_ID")?);
        walrus.subsidies_object = optional_var("WALRUS_SUBSIDIES_OBJECT_ID")
            .map(|id| parse_id("WALRUS_SUBSIDIES_OBJECT_ID", &id))
            .transpose()?;
        walrus.cost_function = optional_var("WALRUS_COST_FUNCTION")
            .map(|target| parse_target(&target))
            .transpose()?;

        let mut config = Self::new(
            network,
            required_id("CROWDFUND_PACKAGE_ID")?,
            required_id("CROWDFUND_TOKEN_REGISTRY_ID")?,
            oracle,
            walrus,
        );

        if let Some(url) = optional_var("CROWDFUND_RPC_URL") {
            config = config.with_rpc_url(url);
        }
        if let Some(url) = optional_var("CROWDFUND_HERMES_URL") {
            config = config.with_hermes_url(url);
        }

        Ok(config)
    }

    /// Set a custom RPC URL
    pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
        self.rpc_url = rpc_url.into();
        self
    }

    pub fn with_hermes_url(mut self, hermes_url: impl Into<String>) -> Self {
        self.hermes_url = hermes_url.into();
        self
    }

    /// Override the gas reserve policy
    pub fn with_gas_policy(mut self, gas_policy: GasReservePolicy) -> Self {
        self.gas_policy = gas_policy;
        self
    }

    pub fn with_pricing_cache_ttl(mut self, ttl: Duration) -> Self {
        self.pricing_cache_ttl = ttl;
        self
    }

    pub fn with_max_epochs_ahead(mut self, max_epochs_ahead: u32) -> Self {
        self.max_epochs_ahead = max_epochs_ahead;
        self
    }

    /// Target for a function in the crowdfunding package
    pub(crate) fn crowdfund_target(&self, module: &str, function: &str) -> MoveTarget {
        MoveTarget::new(self.crowdfund_package, module, function)
    }
}

fn optional_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn required_id(key: &str) -> Result<ObjectId> {
    let value = optional_var(key)
        .ok_or_else(|| Error::Config(format!("{} environment variable must be set", key)))?;
    parse_id(key, &value)
}

fn parse_id(key: &str, value: &str) -> Result<ObjectId> {
    value
        .parse()
        .map_err(|_| Error::Config(format!("{} is not a valid object id: {:?}", key, value)))
}

/// Parse `0xpkg::module::function`
fn parse_target(value: &str) -> Result<MoveTarget> {
    let mut parts = value.split("::");
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(package), Some(module), Some(function), None) => Ok(MoveTarget::new(
            parse_id("WALRUS_COST_FUNCTION", package)?,
            module,
            function,
        )),
        _ => Err(Error::Config(format!(
            "expected package::module::function, got {:?}",
            value
        ))),
    }
}
