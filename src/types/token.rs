//! Token descriptors for accepted donation tokens

use super::move_type::TypeTag;
use super::object::ObjectId;
use crate::constants::SUI_COIN_TYPE;
use crate::error::Result;
use alloy::primitives::B256;
use serde::{Deserialize, Serialize};

/// Pyth price feed identifier
pub type FeedId = B256;

/// Token accepted by the donation contract
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenDescriptor {
    /// Fully qualified coin type, e.g. `0x2::sui::SUI`
    pub coin_type: String,
    pub symbol: String,
    pub decimals: u8,
    pub enabled: bool,
    /// Pyth feed id for the token's USD price
    pub feed_id: FeedId,
    /// Maximum accepted age of a price update, in seconds
    pub max_price_age_secs: u64,
    /// Shared `PriceInfoObject` holding the feed on chain
    pub price_info_object: ObjectId,
}

impl TokenDescriptor {
    /// Parsed Move type of the coin
    pub fn type_tag(&self) -> Result<TypeTag> {
        self.coin_type.parse()
    }

    /// True when the token is the gas coin
    pub fn is_native(&self) -> bool {
        match (self.coin_type.parse::<TypeTag>(), SUI_COIN_TYPE.parse::<TypeTag>()) {
            (Ok(ours), Ok(sui)) => ours == sui,
            _ => false,
        }
    }
}
