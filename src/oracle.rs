//! Price quote attachment and slippage bounds
//!
//! The donation contract re-checks the USD value on chain against the
//! minimum computed here, so the client only has to set that guard correctly
//! and fail early when it cannot.

use crate::config::OracleConfig;
use crate::constants::{BPS_DENOMINATOR, USD_MICRO_DECIMALS};
use crate::contracts;
use crate::error::{Error, Result};
use crate::price::PriceFeed;
use crate::ptb::{Argument, PtbBuilder};
use crate::types::{PriceQuote, SharedObjectRef, TokenDescriptor};
use alloy::primitives::U256;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Shared objects the oracle update touches
#[derive(Debug, Clone, Copy)]
pub struct OracleObjects {
    pub pyth_state: SharedObjectRef,
    pub wormhole_state: SharedObjectRef,
    pub price_info: SharedObjectRef,
    pub clock: SharedObjectRef,
}

/// Quote plus the transaction argument holding the refreshed price object
#[derive(Debug, Clone)]
pub struct AttachedQuote {
    pub quote: PriceQuote,
    pub price_info: Argument,
}

/// Attaches signed price updates to donation transactions
#[derive(Debug, Clone)]
pub struct PriceOracleAdapter<P> {
    feed: P,
    config: OracleConfig,
}

impl<P: PriceFeed> PriceOracleAdapter<P> {
    pub fn new(feed: P, config: OracleConfig) -> Self {
        Self { feed, config }
    }

    pub fn feed(&self) -> &P {
        &self.feed
    }

    /// Fee split from the gas coin per attached update
    pub fn update_fee(&self) -> u64 {
        self.config.update_fee
    }

    /// Fetch a fresh price update, embed it in `ptb`, and quote `raw_amount` in USD micro units
    pub async fn attach_quote(
        &self,
        ptb: &mut PtbBuilder,
        token: &TokenDescriptor,
        raw_amount: u64,
        max_age_secs: u64,
        objects: &OracleObjects,
    ) -> Result<AttachedQuote> {
        let update = self.feed.latest_update(&token.feed_id).await?;

        let age = unix_now().saturating_sub(update.publish_time);
        if age > max_age_secs as i64 {
            return Err(Error::StalePriceQuote {
                publish_time: update.publish_time,
                max_age_secs,
            });
        }

        let usd_micro = quote_usd_micro(raw_amount, token.decimals, update.price, update.expo)?;
        debug!(
            symbol = %token.symbol,
            raw_amount,
            price = update.price,
            expo = update.expo,
            usd_micro,
            "Quoted donation value"
        );

        let price_info = contracts::oracle::update_price(
            ptb,
            &self.config,
            objects,
            &update.update_data,
        )?;

        Ok(AttachedQuote {
            quote: PriceQuote {
                usd_micro,
                publish_time: update.publish_time,
                feed_id: token.feed_id,
                max_age_secs,
            },
            price_info,
        })
    }
}

/// USD micro value of `raw_amount` at `price * 10^expo` dollars per whole token.
///
/// Rounds down. Fails with [`Error::ZeroPriceQuote`] when the price or the
/// resulting value is not positive.
pub fn quote_usd_micro(raw_amount: u64, decimals: u8, price: i64, expo: i32) -> Result<u64> {
    if price <= 0 {
        return Err(Error::ZeroPriceQuote);
    }

    let value = U256::from(raw_amount) * U256::from(price as u64);
    let exponent = USD_MICRO_DECIMALS
        .checked_add(expo)
        .and_then(|e| e.checked_sub(decimals as i32))
        .ok_or_else(|| Error::malformed(format!("price exponent {} out of range", expo)))?;
    let ten = U256::from(10u64);

    let scaled = if exponent >= 0 {
        ten.checked_pow(U256::from(exponent as u64))
            .and_then(|scale| value.checked_mul(scale))
            .ok_or_else(|| Error::AmountOverflow("quoted USD value".to_string()))?
    } else {
        match ten.checked_pow(U256::from(exponent.unsigned_abs() as u64)) {
            Some(scale) => value / scale,
            None => U256::ZERO,
        }
    };

    if scaled.is_zero() {
        return Err(Error::ZeroPriceQuote);
    }

    u64::try_from(scaled).map_err(|_| Error::AmountOverflow("quoted USD value".to_string()))
}

/// Minimum acceptable USD value after slippage: `quoted * (10000 - bps) / 10000`, rounded down
pub fn derive_minimum_acceptable(quoted_usd_micro: u64, slippage_bps: u16) -> Result<u64> {
    if slippage_bps as u64 > BPS_DENOMINATOR {
        return Err(Error::validation(
            "slippage_bps",
            format!("{} exceeds {}", slippage_bps, BPS_DENOMINATOR),
        ));
    }
    if quoted_usd_micro == 0 {
        return Err(Error::ZeroPriceQuote);
    }

    let minimum = quoted_usd_micro as u128 * (BPS_DENOMINATOR - slippage_bps as u64) as u128
        / BPS_DENOMINATOR as u128;

    if minimum == 0 {
        return Err(Error::SlippageTooStrict {
            quoted: quoted_usd_micro,
            slippage_bps,
        });
    }

    // never exceeds the quote, so it fits
    Ok(minimum as u64)
}

fn unix_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{oracle_config, oracle_objects, sample_token, MockPriceFeed};
    use crate::ptb::{CallArg, Command};

    #[test]
    fn test_quote_usd_micro() {
        // 1 SUI at $3.50
        assert_eq!(quote_usd_micro(1_000_000_000, 9, 350_000_000, -8).unwrap(), 3_500_000);
        // 2.5 USDC at $1.00
        assert_eq!(quote_usd_micro(2_500_000, 6, 100_000_000, -8).unwrap(), 2_500_000);
        // positive exponent
        assert_eq!(quote_usd_micro(1, 0, 3, 2).unwrap(), 300_000_000);
    }

    #[test]
    fn test_quote_rejects_non_positive() {
        assert!(matches!(quote_usd_micro(1_000, 9, 0, -8), Err(Error::ZeroPriceQuote)));
        assert!(matches!(quote_usd_micro(1_000, 9, -5, -8), Err(Error::ZeroPriceQuote)));
        // dust rounds to zero dollars
        assert!(matches!(quote_usd_micro(1, 9, 350_000_000, -8), Err(Error::ZeroPriceQuote)));
    }

    #[test]
    fn test_quote_overflow() {
        assert!(matches!(
            quote_usd_micro(u64::MAX, 0, i64::MAX, 0),
            Err(Error::AmountOverflow(_))
        ));
    }

    #[test]
    fn test_extreme_exponent_rejected() {
        assert!(matches!(
            quote_usd_micro(1, 9, 1, i32::MIN + 1),
            Err(Error::MalformedLedgerResponse(_))
        ));
        assert!(matches!(
            quote_usd_micro(1, 0, 1, i32::MAX),
            Err(Error::MalformedLedgerResponse(_))
        ));
        assert!(matches!(
            quote_usd_micro(1, 0, 1, i32::MIN),
            Err(Error::ZeroPriceQuote)
        ));
    }

    #[test]
    fn test_minimum_acceptable() {
        assert_eq!(derive_minimum_acceptable(2_000_000, 100).unwrap(), 1_980_000);
        assert_eq!(derive_minimum_acceptable(2_000_000, 0).unwrap(), 2_000_000);
        assert_eq!(derive_minimum_acceptable(999, 50).unwrap(), 994);
        assert_eq!(derive_minimum_acceptable(u64::MAX, 0).unwrap(), u64::MAX);
    }

    #[test]
    fn test_minimum_monotonic_in_slippage() {
        for quoted in [1u64, 7, 1_000, 2_000_000, u64::MAX] {
            let mut previous = u64::MAX;
            for bps in (0..=9_999u16).step_by(37) {
                let minimum = match derive_minimum_acceptable(quoted, bps) {
                    Ok(v) => v,
                    Err(Error::SlippageTooStrict { .. }) => 0,
                    Err(e) => panic!("unexpected {e:?}"),
                };
                assert!(minimum <= previous);
                previous = minimum;
            }
        }
    }

    #[test]
    fn test_minimum_errors() {
        assert!(matches!(derive_minimum_acceptable(0, 100), Err(Error::ZeroPriceQuote)));
        assert!(matches!(
            derive_minimum_acceptable(1, 100),
            Err(Error::SlippageTooStrict { .. })
        ));
        assert!(matches!(
            derive_minimum_acceptable(1_000, 10_000),
            Err(Error::SlippageTooStrict { .. })
        ));
        assert!(matches!(
            derive_minimum_acceptable(1_000, 10_001),
            Err(Error::Validation { field: "slippage_bps", .. })
        ));
    }

    #[tokio::test]
    async fn test_attach_quote_adds_update_call() {
        let feed = MockPriceFeed::new(2, 0);
        let adapter = PriceOracleAdapter::new(feed, oracle_config());
        let token = sample_token("0xa::usdc::USDC", 6);
        let mut ptb = PtbBuilder::new();

        let attached = adapter
            .attach_quote(&mut ptb, &token, 1_000_000, 60, &oracle_objects())
            .await
            .unwrap();

        assert_eq!(attached.quote.usd_micro, 2_000_000);
        assert_eq!(attached.quote.feed_id, token.feed_id);

        let tx = ptb.finish();
        assert!(matches!(tx.commands[0], Command::SplitCoins(Argument::GasCoin, _)));
        let Command::MoveCall(call) = &tx.commands[1] else {
            panic!("expected oracle move call");
        };
        assert_eq!(call.function, "update_price");
        assert_eq!(call.arguments.len(), 6);
        assert!(tx
            .inputs
            .iter()
            .any(|input| matches!(input, CallArg::Pure(bytes) if bytes.ends_with(b"PNAU"))));
    }

    #[tokio::test]
    async fn test_attach_quote_rejects_stale_price() {
        let feed = MockPriceFeed::new(2, 0).with_age_secs(120);
        let adapter = PriceOracleAdapter::new(feed, oracle_config());
        let token = sample_token("0xa::usdc::USDC", 6);

        let err = adapter
            .attach_quote(&mut PtbBuilder::new(), &token, 1_000_000, 60, &oracle_objects())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StalePriceQuote { max_age_secs: 60, .. }));
    }
}
