//! Sui JSON-RPC client
//!
//! Implements the ledger and storage pricing ports over a full node's JSON-RPC
//! endpoint. Responses are parsed strictly: anything missing or mistyped is a
//! [`Error::MalformedLedgerResponse`].

use crate::config::WalrusConfig;
use crate::error::{Context, Error, Result};
use crate::ledger::{DryRunGas, DryRunOutcome, LedgerClient};
use crate::ptb::{DonationTransaction, PtbBuilder};
use crate::storage::StoragePricingSource;
use crate::types::{
    CoinPage, CoinRecord, LiveCost, ObjectId, ObjectRef, PricingSnapshot, SharedObjectRef,
    SuiAddress,
};
use futures::future::try_join;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize, Debug)]
struct RpcError {
    code: i64,
    message: String,
}

/// JSON-RPC client for a Sui full node
#[derive(Debug, Clone)]
pub struct SuiRpcClient {
    url: String,
    client: Client,
    walrus: WalrusConfig,
    next_id: Arc<AtomicU64>,
}

impl SuiRpcClient {
    pub fn new(url: impl Into<String>, walrus: WalrusConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent("CrowdfundRustSDK/0.1.0")
            .timeout(Duration::from_secs(30))
            .connect_timeout(Duration::from_secs(10))
            .use_rustls_tls()
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            url: url.into(),
            client,
            walrus,
            next_id: Arc::new(AtomicU64::new(1)),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Perform one JSON-RPC call
    pub async fn call<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: self.next_id.fetch_add(1, Ordering::Relaxed),
            method,
            params,
        };

        debug!(method, "Sui RPC request");

        let response = self
            .client
            .post(&self.url)
            .header("Content-Type", "application/json")
            .json(&request)
            .send()
            .await
            .with_context(|| format!("Failed to call {}", method))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(eyre::eyre!("{} returned {}: {}", method, status, body).into());
        }

        let body: RpcResponse<T> = response
            .json()
            .await
            .map_err(|e| Error::malformed(format!("{}: {}", method, e)))?;

        if let Some(error) = body.error {
            return Err(Error::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        body.result
            .ok_or_else(|| Error::malformed(format!("{} returned no result", method)))
    }

    async fn get_object(&self, id: &ObjectId) -> Result<Value> {
        let result: Value = self
            .call(
                "sui_getObject",
                json!([id, { "showOwner": true, "showContent": true }]),
            )
            .await?;
        object_data(result, id)
    }

    async fn walrus_system_fields(&self) -> Result<Value> {
        let system_id = self.walrus.system_object;
        let system = self.get_object(&system_id).await?;
        let version = json_u64(field(&system, &["content", "fields", "version"])?, "system version")?;

        let inner: Value = self
            .call(
                "suix_getDynamicFieldObject",
                json!([system_id, { "type": "u64", "value": version.to_string() }]),
            )
            .await?;
        let inner = object_data(inner, &system_id)?;
        Ok(field(&inner, &["content", "fields", "value", "fields"])?.clone())
    }

    async fn buyer_subsidy_bps(&self) -> Result<u32> {
        let Some(subsidies_id) = self.walrus.subsidies_object else {
            return Ok(0);
        };
        let subsidies = self.get_object(&subsidies_id).await?;
        let rate = json_u64(
            field(&subsidies, &["content", "fields", "buyer_subsidy_rate"])?,
            "buyer subsidy rate",
        )?;
        u32::try_from(rate).map_err(|_| Error::malformed("buyer subsidy rate out of range"))
    }
}

impl LedgerClient for SuiRpcClient {
    async fn coins_page(
        &self,
        owner: &SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> Result<CoinPage> {
        let result: Value = self
            .call("suix_getCoins", json!([owner, coin_type, cursor, limit]))
            .await?;
        parse_coin_page(&result)
    }

    async fn object_ref(&self, id: &ObjectId) -> Result<ObjectRef> {
        let data = self.get_object(id).await?;
        parse_object_ref(&data)
    }

    async fn shared_object(&self, id: &ObjectId, mutable: bool) -> Result<SharedObjectRef> {
        let data = self.get_object(id).await?;
        let initial_shared_version = parse_shared_version(&data)
            .map_err(|_| Error::malformed(format!("object {} is not shared", id)))?;
        Ok(SharedObjectRef::new(*id, initial_shared_version, mutable))
    }

    async fn reference_gas_price(&self) -> Result<u64> {
        let price: Value = self.call("suix_getReferenceGasPrice", json!([])).await?;
        json_u64(&price, "reference gas price")
    }

    async fn dry_run(&self, tx: &DonationTransaction) -> Result<DryRunOutcome> {
        let result: Value = self
            .call(
                "sui_devInspectTransactionBlock",
                json!([tx.sender, tx.kind_base64()?]),
            )
            .await?;
        parse_dev_inspect(&result)
    }
}

impl StoragePricingSource for SuiRpcClient {
    async fn snapshot(&self) -> Result<PricingSnapshot> {
        let (inner, subsidy_rate_bps) =
            try_join(self.walrus_system_fields(), self.buyer_subsidy_bps()).await?;
        parse_pricing(&inner, subsidy_rate_bps)
    }

    async fn live_cost(&self, raw_size: u64, epochs: u32) -> Result<LiveCost> {
        let target = self
            .walrus
            .cost_function
            .as_ref()
            .ok_or_else(|| Error::Config("no Walrus cost function configured".to_string()))?;
        let system = self.shared_object(&self.walrus.system_object, false).await?;

        let mut ptb = PtbBuilder::new();
        let system = ptb.object(system)?;
        let size = ptb.pure(&raw_size)?;
        let epochs = ptb.pure(&epochs)?;
        ptb.move_call(target, vec![], vec![system, size, epochs]);

        let inspect = DonationTransaction {
            sender: ObjectId::ZERO,
            kind: ptb.finish(),
            gas_payment: Vec::new(),
            gas_budget: None,
        };
        let outcome = self.dry_run(&inspect).await?;
        if !outcome.success {
            return Err(eyre::eyre!(
                "{} failed: {}",
                target,
                outcome.error.unwrap_or_default()
            )
            .into());
        }

        let values = outcome
            .return_values
            .last()
            .ok_or_else(|| Error::malformed("cost function returned nothing"))?;
        match values.as_slice() {
            [storage, write, ..] => Ok(LiveCost {
                storage_cost: decode_u64(storage)? as u128,
                write_cost: decode_u64(write)? as u128,
            }),
            _ => Err(Error::malformed("cost function must return two values")),
        }
    }
}

fn field<'a>(value: &'a Value, path: &[&str]) -> Result<&'a Value> {
    path.iter().try_fold(value, |current, key| {
        current
            .get(key)
            .ok_or_else(|| Error::malformed(format!("missing field {}", path.join("."))))
    })
}

/// Sui encodes 64-bit numbers as strings and smaller ones as numbers
fn json_u64(value: &Value, what: &str) -> Result<u64> {
    let parsed = match value {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_u64(),
        _ => None,
    };
    parsed.ok_or_else(|| Error::malformed(format!("{} is not an unsigned integer: {}", what, value)))
}

fn json_str<'a>(value: &'a Value, path: &[&str]) -> Result<&'a str> {
    field(value, path)?
        .as_str()
        .ok_or_else(|| Error::malformed(format!("{} is not a string", path.join("."))))
}

fn parse<T: std::str::FromStr>(value: &Value, path: &[&str]) -> Result<T> {
    let raw = json_str(value, path)?;
    raw.parse()
        .map_err(|_| Error::malformed(format!("invalid {}: {:?}", path.join("."), raw)))
}

fn object_data(result: Value, id: &ObjectId) -> Result<Value> {
    if let Some(error) = result.get("error").filter(|e| !e.is_null()) {
        return Err(Error::malformed(format!("object {}: {}", id, error)));
    }
    match result {
        Value::Object(mut map) => map
            .remove("data")
            .filter(|data| !data.is_null())
            .ok_or_else(|| Error::malformed(format!("object {} has no data", id))),
        _ => Err(Error::malformed(format!("object {} response is not an object", id))),
    }
}

fn parse_coin_page(result: &Value) -> Result<CoinPage> {
    let data = field(result, &["data"])?
        .as_array()
        .ok_or_else(|| Error::malformed("coin page data is not an array"))?;

    let coins = data
        .iter()
        .map(|coin| -> Result<CoinRecord> {
            Ok(CoinRecord {
                object_id: parse(coin, &["coinObjectId"])?,
                balance: json_u64(field(coin, &["balance"])?, "balance")?,
                version: json_u64(field(coin, &["version"])?, "version")?,
                digest: parse(coin, &["digest"])?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(CoinPage {
        coins,
        next_cursor: result
            .get("nextCursor")
            .and_then(Value::as_str)
            .map(str::to_string),
        has_next_page: result
            .get("hasNextPage")
            .and_then(Value::as_bool)
            .unwrap_or(false),
    })
}

fn parse_object_ref(data: &Value) -> Result<ObjectRef> {
    Ok(ObjectRef {
        object_id: parse(data, &["objectId"])?,
        version: json_u64(field(data, &["version"])?, "version")?,
        digest: parse(data, &["digest"])?,
    })
}

fn parse_shared_version(data: &Value) -> Result<u64> {
    let version = field(data, &["owner", "Shared", "initial_shared_version"])?;
    json_u64(version, "initial shared version")
}

fn parse_dev_inspect(result: &Value) -> Result<DryRunOutcome> {
    let status = json_str(result, &["effects", "status", "status"])?;
    let gas_used = field(result, &["effects", "gasUsed"])?;
    let gas = DryRunGas {
        computation_cost: json_u64(field(gas_used, &["computationCost"])?, "computation cost")?,
        storage_cost: json_u64(field(gas_used, &["storageCost"])?, "storage cost")?,
        storage_rebate: json_u64(field(gas_used, &["storageRebate"])?, "storage rebate")?,
        non_refundable_storage_fee: json_u64(
            field(gas_used, &["nonRefundableStorageFee"])?,
            "non-refundable storage fee",
        )?,
    };

    let error = result
        .get("error")
        .and_then(Value::as_str)
        .or_else(|| {
            result
                .pointer("/effects/status/error")
                .and_then(Value::as_str)
        })
        .map(str::to_string);

    let return_values = match result.get("results").and_then(Value::as_array) {
        Some(results) => results
            .iter()
            .map(parse_return_values)
            .collect::<Result<Vec<_>>>()?,
        None => Vec::new(),
    };

    Ok(DryRunOutcome {
        success: status == "success" && error.is_none(),
        error,
        gas,
        return_values,
    })
}

/// `returnValues` is a list of `[bytes, type]` pairs
fn parse_return_values(result: &Value) -> Result<Vec<Vec<u8>>> {
    let Some(values) = result.get("returnValues").and_then(Value::as_array) else {
        return Ok(Vec::new());
    };
    values
        .iter()
        .map(|pair| {
            let bytes = pair
                .get(0)
                .and_then(Value::as_array)
                .ok_or_else(|| Error::malformed("return value has no bytes"))?;
            bytes
                .iter()
                .map(|b| {
                    b.as_u64()
                        .and_then(|b| u8::try_from(b).ok())
                        .ok_or_else(|| Error::malformed("return value byte out of range"))
                })
                .collect::<Result<Vec<u8>>>()
        })
        .collect()
}

fn decode_u64(bytes: &[u8]) -> Result<u64> {
    bcs::from_bytes(bytes).map_err(|e| Error::malformed(format!("u64 return value: {}", e)))
}

fn parse_pricing(inner: &Value, subsidy_rate_bps: u32) -> Result<PricingSnapshot> {
    let shard_count = json_u64(field(inner, &["committee", "fields", "n_shards"])?, "n_shards")?;
    Ok(PricingSnapshot {
        storage_price_per_unit: json_u64(
            field(inner, &["storage_price_per_unit_size"])?,
            "storage price",
        )?,
        write_price_per_unit: json_u64(
            field(inner, &["write_price_per_unit_size"])?,
            "write price",
        )?,
        shard_count: u16::try_from(shard_count)
            .map_err(|_| Error::malformed(format!("n_shards out of range: {}", shard_count)))?,
        subsidy_rate_bps,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_coin_page() {
        let result = json!({
            "data": [{
                "coinType": "0x2::sui::SUI",
                "coinObjectId": "0x0b",
                "version": "42",
                "digest": "11111111111111111111111111111111",
                "balance": "1500000000",
                "previousTransaction": "11111111111111111111111111111111"
            }],
            "nextCursor": "0x0b",
            "hasNextPage": true
        });

        let page = parse_coin_page(&result).unwrap();
        assert_eq!(page.coins.len(), 1);
        assert_eq!(page.coins[0].balance, 1_500_000_000);
        assert_eq!(page.coins[0].version, 42);
        assert_eq!(page.coins[0].object_id, "0xb".parse::<ObjectId>().unwrap());
        assert_eq!(page.next_cursor.as_deref(), Some("0x0b"));
        assert!(page.has_next_page);
    }

    #[test]
    fn test_parse_coin_page_rejects_bad_balance() {
        let result = json!({
            "data": [{
                "coinObjectId": "0x0b",
                "version": "1",
                "digest": "11111111111111111111111111111111",
                "balance": "-5"
            }],
            "nextCursor": null,
            "hasNextPage": false
        });
        assert!(matches!(
            parse_coin_page(&result),
            Err(Error::MalformedLedgerResponse(_))
        ));
    }

    #[test]
    fn test_shared_owner() {
        let shared = json!({ "owner": { "Shared": { "initial_shared_version": 1234 } } });
        assert_eq!(parse_shared_version(&shared).unwrap(), 1234);

        let owned = json!({ "owner": { "AddressOwner": "0x1" } });
        assert!(parse_shared_version(&owned).is_err());
    }

    #[test]
    fn test_object_data_error() {
        let id = ObjectId::new([1; 32]);
        let missing = json!({ "error": { "code": "notExists", "object_id": "0x1" } });
        assert!(object_data(missing, &id).is_err());

        let found = json!({ "data": { "objectId": "0x1" } });
        assert_eq!(object_data(found, &id).unwrap()["objectId"], "0x1");
    }

    #[test]
    fn test_parse_dev_inspect() {
        let result = json!({
            "effects": {
                "status": { "status": "success" },
                "gasUsed": {
                    "computationCost": "1000000",
                    "storageCost": "2964000",
                    "storageRebate": "978120",
                    "nonRefundableStorageFee": "9880"
                }
            },
            "results": [
                { "mutableReferenceOutputs": [] },
                { "returnValues": [[[64, 66, 15, 0, 0, 0, 0, 0], "u64"], [[1, 0, 0, 0, 0, 0, 0, 0], "u64"]] }
            ]
        });

        let outcome = parse_dev_inspect(&result).unwrap();
        assert!(outcome.success);
        assert_eq!(outcome.gas.storage_rebate, 978_120);
        assert_eq!(outcome.return_values.len(), 2);
        assert_eq!(decode_u64(&outcome.return_values[1][0]).unwrap(), 1_000_000);
        assert_eq!(decode_u64(&outcome.return_values[1][1]).unwrap(), 1);
    }

    #[test]
    fn test_parse_failed_dev_inspect() {
        let result = json!({
            "effects": {
                "status": { "status": "failure", "error": "InsufficientCoinBalance" },
                "gasUsed": {
                    "computationCost": "1000000",
                    "storageCost": "0",
                    "storageRebate": "0",
                    "nonRefundableStorageFee": "0"
                }
            }
        });
        let outcome = parse_dev_inspect(&result).unwrap();
        assert!(!outcome.success);
        assert_eq!(outcome.error.as_deref(), Some("InsufficientCoinBalance"));
    }

    #[test]
    fn test_parse_pricing() {
        let inner = json!({
            "committee": { "type": "0x1::bls_aggregate::BlsCommittee", "fields": { "n_shards": 1000 } },
            "storage_price_per_unit_size": "11000",
            "write_price_per_unit_size": "20000"
        });
        let snapshot = parse_pricing(&inner, 8_000).unwrap();
        assert_eq!(snapshot.shard_count, 1000);
        assert_eq!(snapshot.storage_price_per_unit, 11_000);
        assert_eq!(snapshot.write_price_per_unit, 20_000);
        assert_eq!(snapshot.subsidy_rate_bps, 8_000);
    }

    #[test]
    fn test_json_u64_accepts_strings_and_numbers() {
        assert_eq!(json_u64(&json!("750"), "price").unwrap(), 750);
        assert_eq!(json_u64(&json!(750), "price").unwrap(), 750);
        assert!(json_u64(&json!(-1), "price").is_err());
        assert!(json_u64(&json!("abc"), "price").is_err());
    }
}
