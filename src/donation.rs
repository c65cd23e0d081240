//! Donation transaction assembly
//!
//! Composes coin selection, the price oracle and the gas reserve loop into a
//! single unsigned transaction targeting one of the donation entry points.

use crate::coin::CoinSelector;
use crate::config::NetworkConfig;
use crate::constants::{
    BPS_DENOMINATOR, MAX_GAS_PAYMENT_OBJECTS, SUI_CLOCK_INITIAL_SHARED_VERSION,
    SUI_CLOCK_OBJECT_ID,
};
use crate::contracts::{self, DonationCall, DonationObjects};
use crate::error::{Error, Result};
use crate::gas::{GasReserveEstimator, NativeDraft};
use crate::ledger::LedgerClient;
use crate::oracle::{derive_minimum_acceptable, OracleObjects, PriceOracleAdapter};
use crate::price::PriceFeed;
use crate::ptb::{Argument, DonationTransaction, PtbBuilder};
use crate::types::{
    DonationBuildResult, DonationFlow, DonationRequest, ObjectId, PriceQuote, SharedObjectRef,
};
use futures::future::{try_join, try_join_all};
use tracing::{debug, info};

/// Every object a donation transaction references
#[derive(Debug, Clone, Copy)]
struct ResolvedObjects {
    donation: DonationObjects,
    oracle: OracleObjects,
}

/// Quote data carried alongside each draft
#[derive(Debug, Clone)]
struct Priced {
    quote: PriceQuote,
    expected_min_usd_micro: u64,
}

/// Builds unsigned donation transactions
pub struct DonationTransactionBuilder<'a, L, P> {
    config: &'a NetworkConfig,
    ledger: &'a L,
    oracle: &'a PriceOracleAdapter<P>,
}

impl<'a, L: LedgerClient, P: PriceFeed> DonationTransactionBuilder<'a, L, P> {
    pub fn new(config: &'a NetworkConfig, ledger: &'a L, oracle: &'a PriceOracleAdapter<P>) -> Self {
        Self {
            config,
            ledger,
            oracle,
        }
    }

    /// Build the donation described by `request` for the given entry point
    pub async fn build(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
    ) -> Result<DonationBuildResult> {
        validate_request(request, flow)?;

        info!(
            symbol = %request.token.symbol,
            raw_amount = request.raw_amount,
            ?flow,
            campaign = %request.campaign_id,
            "Building donation"
        );

        let objects = self.resolve_objects(request, flow).await?;

        let (transaction, priced) = if request.token.is_native() {
            self.build_native(request, flow, &objects).await?
        } else {
            self.build_token(request, flow, &objects).await?
        };

        info!(
            quoted_usd_micro = priced.quote.usd_micro,
            expected_min_usd_micro = priced.expected_min_usd_micro,
            gas_budget = ?transaction.gas_budget,
            "Donation ready for signing"
        );

        Ok(DonationBuildResult {
            transaction,
            quoted_usd_micro: priced.quote.usd_micro,
            expected_min_usd_micro: priced.expected_min_usd_micro,
            raw_amount: request.raw_amount,
            publish_time: priced.quote.publish_time,
            feed_id: priced.quote.feed_id,
            token: request.token.clone(),
        })
    }

    async fn resolve_objects(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
    ) -> Result<ResolvedObjects> {
        let oracle = &self.config.oracle;
        let lookups = [
            (request.campaign_id, true),
            (request.stats_id, true),
            (self.config.token_registry, false),
            (oracle.pyth_state, false),
            (oracle.wormhole_state, false),
            (request.token.price_info_object, true),
        ];
        let shared = try_join_all(
            lookups
                .iter()
                .map(|(id, mutable)| self.ledger.shared_object(id, *mutable)),
        );
        let profile_id = match flow {
            DonationFlow::Repeat => request.profile_id,
            DonationFlow::FirstTime => None,
        };
        let profile = async {
            match profile_id {
                Some(id) => self.ledger.object_ref(&id).await.map(Some),
                None => Ok(None),
            }
        };

        let (shared, profile) = try_join(shared, profile).await?;
        let [campaign, stats, token_registry, pyth_state, wormhole_state, price_info]: [SharedObjectRef; 6] =
            shared
                .try_into()
                .map_err(|_| Error::malformed("missing shared object reference"))?;

        let clock_id: ObjectId = SUI_CLOCK_OBJECT_ID.parse()?;
        let clock = SharedObjectRef::new(clock_id, SUI_CLOCK_INITIAL_SHARED_VERSION, false);

        debug!(campaign = %campaign.object_id, stats = %stats.object_id, "Resolved donation objects");

        Ok(ResolvedObjects {
            donation: DonationObjects {
                campaign,
                stats,
                token_registry,
                clock,
                profile,
            },
            oracle: OracleObjects {
                pyth_state,
                wormhole_state,
                price_info,
                clock,
            },
        })
    }

    /// Non-native tokens: one coin selection, gas left to the signer
    async fn build_token(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
        objects: &ResolvedObjects,
    ) -> Result<(DonationTransaction, Priced)> {
        let selection = CoinSelector::new(self.ledger)
            .select_for_amount(&request.donor, &request.token, request.raw_amount)
            .await?;

        let mut ptb = PtbBuilder::new();
        let coin = selection.prepare(&mut ptb, request.raw_amount)?;
        let priced = self.finish_call(&mut ptb, request, flow, objects, coin).await?;

        let transaction = DonationTransaction {
            sender: request.donor,
            kind: ptb.finish(),
            gas_payment: Vec::new(),
            gas_budget: None,
        };
        Ok((transaction, priced))
    }

    /// Native token: the gas coin funds the donation, the oracle fee and gas
    async fn build_native(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
        objects: &ResolvedObjects,
    ) -> Result<(DonationTransaction, Priced)> {
        let spend = request
            .raw_amount
            .checked_add(self.oracle.update_fee())
            .ok_or_else(|| Error::AmountOverflow("donation plus oracle fee".to_string()))?;

        let estimator = GasReserveEstimator::new(self.ledger, self.config.gas_policy);
        let draft = estimator
            .reserve(spend, move |target| {
                self.native_draft(request, flow, objects, spend, target)
            })
            .await?;

        Ok((draft.transaction, draft.payload))
    }

    async fn native_draft(
        &self,
        request: &DonationRequest,
        flow: DonationFlow,
        objects: &ResolvedObjects,
        spend: u64,
        target: u64,
    ) -> Result<NativeDraft<Priced>> {
        let selection = CoinSelector::new(self.ledger)
            .select_up_to(&request.donor, &request.token.coin_type, target)
            .await?;
        if !selection.covers(spend) {
            return Err(Error::InsufficientBalance {
                symbol: request.token.symbol.clone(),
                required: spend,
                available: selection.total,
            });
        }
        if selection.coins.len() > MAX_GAS_PAYMENT_OBJECTS {
            return Err(Error::TooManyGasCoins {
                count: selection.coins.len(),
                max: MAX_GAS_PAYMENT_OBJECTS,
            });
        }

        let mut ptb = PtbBuilder::new();
        let amount = ptb.pure(&request.raw_amount)?;
        let coin = ptb.split_coins(Argument::GasCoin, vec![amount])[0];
        let priced = self.finish_call(&mut ptb, request, flow, objects, coin).await?;

        Ok(NativeDraft {
            transaction: DonationTransaction {
                sender: request.donor,
                kind: ptb.finish(),
                gas_payment: selection.object_refs(),
                gas_budget: None,
            },
            available: selection.total,
            payload: priced,
        })
    }

    /// Attach the price update, derive the minimum and append the donation call
    async fn finish_call(
        &self,
        ptb: &mut PtbBuilder,
        request: &DonationRequest,
        flow: DonationFlow,
        objects: &ResolvedObjects,
        coin: Argument,
    ) -> Result<Priced> {
        let attached = self
            .oracle
            .attach_quote(
                ptb,
                &request.token,
                request.raw_amount,
                request.effective_max_age_secs(),
                &objects.oracle,
            )
            .await?;
        let expected_min_usd_micro =
            derive_minimum_acceptable(attached.quote.usd_micro, request.slippage_bps)?;

        contracts::donation::donate(
            ptb,
            self.config,
            &objects.donation,
            DonationCall {
                flow,
                coin_type: request.token.type_tag()?,
                coin,
                price_info: attached.price_info,
                expected_min_usd_micro,
                max_age_override_secs: request.max_age_override_secs,
            },
        )?;

        Ok(Priced {
            quote: attached.quote,
            expected_min_usd_micro,
        })
    }
}

/// Checks that need no network access
pub fn validate_request(request: &DonationRequest, flow: DonationFlow) -> Result<()> {
    if !request.token.enabled {
        return Err(Error::TokenDisabled(request.token.symbol.clone()));
    }
    if request.raw_amount == 0 {
        return Err(Error::InvalidAmount(
            "amount must be greater than zero".to_string(),
        ));
    }
    if request.slippage_bps as u64 > BPS_DENOMINATOR {
        return Err(Error::validation(
            "slippage_bps",
            format!("{} exceeds {}", request.slippage_bps, BPS_DENOMINATOR),
        ));
    }
    if request.donor.is_zero() {
        return Err(Error::validation("donor", "missing donor address"));
    }
    if request.campaign_id.is_zero() {
        return Err(Error::validation("campaign_id", "missing campaign"));
    }
    if request.stats_id.is_zero() {
        return Err(Error::validation("stats_id", "missing campaign stats"));
    }
    if request.token.price_info_object.is_zero() {
        return Err(Error::validation("token", "no price object configured"));
    }
    if flow == DonationFlow::Repeat && request.profile_id.map_or(true, |id| id.is_zero()) {
        return Err(Error::validation(
            "profile_id",
            "required for repeat donations",
        ));
    }
    request.token.type_tag()?;
    Ok(())
}
