//! Gas reserve estimation for native-token donations
//!
//! When the donation is paid in the gas coin, the same balance has to cover
//! the donation and the transaction's own gas. The gas cost is only known
//! after building a draft, and the draft needs a coin selection, so the
//! reserve is found with a short bounded loop.

use crate::constants::{
    DEFAULT_FALLBACK_GAS_RESERVE, DEFAULT_GAS_FLAT_OVERHEAD, DEFAULT_GAS_MULTIPLIER_PCT,
    DEFAULT_GAS_RESERVE_ATTEMPTS,
};
use crate::error::{Error, Result};
use crate::ledger::LedgerClient;
use crate::ptb::DonationTransaction;
use futures::future::try_join;
use std::future::Future;
use tracing::{debug, warn};

/// How much native balance to hold back for gas
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GasReservePolicy {
    /// Safety multiplier on the estimated budget, in percent
    pub multiplier_pct: u64,
    /// Flat amount added after the multiplier, in MIST
    pub flat_overhead: u64,
    /// Reserve used when no estimate is available, in MIST
    pub fallback_reserve: u64,
    pub max_attempts: u8,
}

impl Default for GasReservePolicy {
    fn default() -> Self {
        Self {
            multiplier_pct: DEFAULT_GAS_MULTIPLIER_PCT,
            flat_overhead: DEFAULT_GAS_FLAT_OVERHEAD,
            fallback_reserve: DEFAULT_FALLBACK_GAS_RESERVE,
            max_attempts: DEFAULT_GAS_RESERVE_ATTEMPTS,
        }
    }
}

impl GasReservePolicy {
    /// `ceil(budget * multiplier) + flat`, or the fallback without an estimate
    pub fn required_reserve(&self, budget: Option<u64>) -> u64 {
        match budget {
            Some(budget) => {
                let scaled = (budget as u128 * self.multiplier_pct as u128).div_ceil(100);
                u64::try_from(scaled)
                    .unwrap_or(u64::MAX)
                    .saturating_add(self.flat_overhead)
            }
            None => self.fallback_reserve,
        }
    }
}

/// States of the reserve loop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReserveState {
    /// Select coins covering the spend plus `reserve_hint`
    Selecting { attempt: u8, reserve_hint: u64 },
    /// Draft built from coins worth `available`; waiting for a gas estimate
    Estimating { attempt: u8, available: u64 },
    /// Selected coins cover spend plus `reserve`
    Sufficient { attempt: u8, reserve: u64 },
    /// Gave up after the last attempt
    Exhausted { required: u64, available: u64 },
}

/// Bounded reserve search.
///
/// Every `Estimating -> Selecting` transition increments the attempt counter,
/// so the loop ends after at most `max_attempts` drafts.
#[derive(Debug, Clone)]
pub struct ReserveLoop {
    policy: GasReservePolicy,
    spend: u64,
    state: ReserveState,
}

impl ReserveLoop {
    /// `spend` is everything paid from the gas coin besides gas itself
    pub fn new(policy: GasReservePolicy, spend: u64) -> Self {
        Self {
            policy,
            spend,
            state: ReserveState::Selecting {
                attempt: 1,
                reserve_hint: policy.fallback_reserve,
            },
        }
    }

    pub fn state(&self) -> ReserveState {
        self.state
    }

    pub fn spend(&self) -> u64 {
        self.spend
    }

    /// Coins to select for in the current attempt
    pub fn selection_target(&self) -> Option<u64> {
        match self.state {
            ReserveState::Selecting { reserve_hint, .. } => {
                Some(self.spend.saturating_add(reserve_hint))
            }
            _ => None,
        }
    }

    /// A draft was built from coins worth `available`
    pub fn drafted(&mut self, available: u64) -> ReserveState {
        if let ReserveState::Selecting { attempt, .. } = self.state {
            self.state = ReserveState::Estimating { attempt, available };
        }
        self.state
    }

    /// Gas estimate for the current draft; `None` when estimation failed
    pub fn estimated(&mut self, budget: Option<u64>) -> ReserveState {
        let ReserveState::Estimating { attempt, available } = self.state else {
            return self.state;
        };

        let required = self.policy.required_reserve(budget);
        self.state = if available >= self.spend.saturating_add(required) {
            ReserveState::Sufficient {
                attempt,
                reserve: required,
            }
        } else if attempt >= self.policy.max_attempts {
            ReserveState::Exhausted {
                required,
                available,
            }
        } else {
            ReserveState::Selecting {
                attempt: attempt + 1,
                reserve_hint: required,
            }
        };
        self.state
    }
}

/// A draft built for one attempt
#[derive(Debug, Clone)]
pub struct NativeDraft<T> {
    pub transaction: DonationTransaction,
    /// Total balance of the gas coins the draft pays with
    pub available: u64,
    /// Whatever else the caller produced alongside the draft
    pub payload: T,
}

/// Estimates gas budgets and drives the reserve loop
pub struct GasReserveEstimator<'a, L> {
    ledger: &'a L,
    policy: GasReservePolicy,
}

impl<'a, L: LedgerClient> GasReserveEstimator<'a, L> {
    pub fn new(ledger: &'a L, policy: GasReservePolicy) -> Self {
        Self { ledger, policy }
    }

    /// Dry-run `draft` and derive its gas budget; `None` if that fails
    pub async fn estimate_budget(&self, draft: &DonationTransaction) -> Option<u64> {
        match try_join(self.ledger.dry_run(draft), self.ledger.reference_gas_price()).await {
            Ok((outcome, gas_price)) if outcome.success => {
                let budget = outcome.gas.budget(gas_price);
                debug!(budget, gas_price, "Estimated gas budget");
                Some(budget)
            }
            Ok((outcome, _)) => {
                warn!(error = ?outcome.error, "Dry run failed, using fallback gas reserve");
                None
            }
            Err(err) => {
                warn!(error = %err, "Gas estimation failed, using fallback gas reserve");
                None
            }
        }
    }

    /// Build drafts until the selected coins cover `spend` plus the gas reserve.
    ///
    /// `build` receives the amount to select coins for and returns a complete
    /// draft. On success the draft's gas budget is set to the reserve.
    pub async fn reserve<T, F, Fut>(&self, spend: u64, mut build: F) -> Result<NativeDraft<T>>
    where
        F: FnMut(u64) -> Fut,
        Fut: Future<Output = Result<NativeDraft<T>>>,
    {
        let mut machine = ReserveLoop::new(self.policy, spend);
        let mut current: Option<NativeDraft<T>> = None;

        loop {
            match machine.state() {
                ReserveState::Selecting { attempt, reserve_hint } => {
                    let target = spend.saturating_add(reserve_hint);
                    debug!(attempt, target, "Building native donation draft");
                    let draft = build(target).await?;
                    machine.drafted(draft.available);
                    current = Some(draft);
                }
                ReserveState::Estimating { .. } => {
                    let budget = match current.as_ref() {
                        Some(draft) => self.estimate_budget(&draft.transaction).await,
                        None => None,
                    };
                    machine.estimated(budget);
                }
                ReserveState::Sufficient { attempt, reserve } => {
                    let mut draft = current
                        .take()
                        .ok_or_else(|| Error::validation("gas_reserve", "no draft was built"))?;
                    debug!(attempt, reserve, "Gas reserve covered");
                    draft.transaction.gas_budget = Some(reserve);
                    return Ok(draft);
                }
                ReserveState::Exhausted { required, available } => {
                    warn!(required, available, spend, "Gas reserve not covered after retries");
                    return Err(Error::InsufficientGasReserve {
                        required,
                        available: available.saturating_sub(spend),
                    });
                }
            }
        }
    }
}
