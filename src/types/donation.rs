//! Donation request and result types

use super::object::{ObjectId, SuiAddress};
use super::token::{FeedId, TokenDescriptor};
use crate::ptb::DonationTransaction;
use serde::Serialize;

/// Which donation entry point to target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum DonationFlow {
    /// Donor has no profile yet; the contract creates one
    FirstTime,
    /// Donor already owns a profile object
    Repeat,
}

/// Validated donation input from the form layer
#[derive(Debug, Clone)]
pub struct DonationRequest {
    pub donor: SuiAddress,
    pub campaign_id: ObjectId,
    pub stats_id: ObjectId,
    pub token: TokenDescriptor,
    /// Amount in the token's smallest unit
    pub raw_amount: u64,
    /// Donor profile, required for repeat donations
    pub profile_id: Option<ObjectId>,
    /// Price slippage tolerance in basis points
    pub slippage_bps: u16,
    /// Override for the registry's maximum price age, in seconds
    pub max_age_override_secs: Option<u64>,
}

impl DonationRequest {
    pub fn new(
        donor: SuiAddress,
        campaign_id: ObjectId,
        stats_id: ObjectId,
        token: TokenDescriptor,
        raw_amount: u64,
    ) -> Self {
        Self {
            donor,
            campaign_id,
            stats_id,
            token,
            raw_amount,
            profile_id: None,
            slippage_bps: crate::constants::DEFAULT_SLIPPAGE_BPS,
            max_age_override_secs: None,
        }
    }

    pub fn with_profile(mut self, profile_id: ObjectId) -> Self {
        self.profile_id = Some(profile_id);
        self
    }

    pub fn with_slippage_bps(mut self, slippage_bps: u16) -> Self {
        self.slippage_bps = slippage_bps;
        self
    }

    pub fn with_max_age_override(mut self, max_age_secs: u64) -> Self {
        self.max_age_override_secs = Some(max_age_secs);
        self
    }

    /// Price age limit that applies to this request
    pub fn effective_max_age_secs(&self) -> u64 {
        self.max_age_override_secs
            .unwrap_or(self.token.max_price_age_secs)
    }
}

/// Price quote attached to a transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// USD value of the raw amount in micro-dollars
    pub usd_micro: u64,
    /// Unix seconds
    pub publish_time: i64,
    pub feed_id: FeedId,
    pub max_age_secs: u64,
}

/// Unsigned donation ready for the signer
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DonationBuildResult {
    pub transaction: DonationTransaction,
    pub quoted_usd_micro: u64,
    pub expected_min_usd_micro: u64,
    pub raw_amount: u64,
    pub publish_time: i64,
    pub feed_id: FeedId,
    pub token: TokenDescriptor,
}
