//! Price updates from the Pyth Hermes service

use crate::error::{Context, Error, Result};
use crate::types::FeedId;
use alloy::primitives::hex;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

/// A signed price update for one feed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceUpdate {
    pub feed_id: FeedId,
    /// Price mantissa; the value is `price * 10^expo`
    pub price: i64,
    pub conf: u64,
    pub expo: i32,
    /// Unix seconds
    pub publish_time: i64,
    /// Accumulator update bytes verified on chain
    pub update_data: Vec<u8>,
}

/// Source of signed price updates
pub trait PriceFeed: Send + Sync {
    fn latest_update(
        &self,
        feed_id: &FeedId,
    ) -> impl std::future::Future<Output = Result<PriceUpdate>> + Send;
}

#[derive(Debug, Deserialize)]
struct LatestUpdatesResponse {
    binary: BinaryUpdate,
    parsed: Vec<ParsedUpdate>,
}

#[derive(Debug, Deserialize)]
struct BinaryUpdate {
    encoding: String,
    data: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ParsedUpdate {
    id: String,
    price: RawPrice,
}

#[derive(Debug, Deserialize)]
struct RawPrice {
    price: String,
    conf: String,
    expo: i32,
    publish_time: i64,
}

/// Hermes REST client
#[derive(Debug, Clone)]
pub struct HermesClient {
    base_url: String,
    client: Client,
}

impl HermesClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("CrowdfundRustSDK/0.1.0")
            .timeout(Duration::from_secs(15))
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            client,
        })
    }
}

impl PriceFeed for HermesClient {
    async fn latest_update(&self, feed_id: &FeedId) -> Result<PriceUpdate> {
        let url = format!("{}/v2/updates/price/latest", self.base_url);
        let id = hex::encode(feed_id);

        let response = self
            .client
            .get(&url)
            .query(&[("ids[]", id.as_str()), ("encoding", "base64"), ("parsed", "true")])
            .send()
            .await
            .context("Failed to fetch price update")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(eyre::eyre!("Hermes returned {}: {}", status, body).into());
        }

        let text = response
            .text()
            .await
            .context("Failed to read price response body")?;

        parse_body(feed_id, &text)
    }
}

fn parse_body(feed_id: &FeedId, text: &str) -> Result<PriceUpdate> {
    let parsed: LatestUpdatesResponse = serde_json::from_str(text).map_err(|e| {
        let excerpt: String = text.chars().take(200).collect();
        Error::malformed(format!("price update: {} in {}", e, excerpt))
    })?;

    parse_update(feed_id, parsed)
}

fn parse_update(feed_id: &FeedId, response: LatestUpdatesResponse) -> Result<PriceUpdate> {
    if response.binary.encoding != "base64" {
        return Err(Error::malformed(format!(
            "unexpected update encoding {:?}",
            response.binary.encoding
        )));
    }

    let entry = response
        .parsed
        .into_iter()
        .find(|p| p.id.parse::<FeedId>().ok().as_ref() == Some(feed_id))
        .ok_or_else(|| Error::malformed(format!("no price returned for feed {}", feed_id)))?;

    let data = response
        .binary
        .data
        .first()
        .ok_or_else(|| Error::malformed("price update has no binary data"))?;
    let update_data = BASE64
        .decode(data)
        .map_err(|e| Error::malformed(format!("price update data: {}", e)))?;

    Ok(PriceUpdate {
        feed_id: *feed_id,
        price: entry
            .price
            .price
            .parse()
            .map_err(|_| Error::malformed(format!("price {:?}", entry.price.price)))?,
        conf: entry
            .price
            .conf
            .parse()
            .map_err(|_| Error::malformed(format!("confidence {:?}", entry.price.conf)))?,
        expo: entry.price.expo,
        publish_time: entry.price.publish_time,
        update_data,
    })
}
