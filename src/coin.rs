//! Coin selection for donation amounts

use crate::constants::COIN_PAGE_LIMIT;
use crate::error::{Error, Result};
use crate::ledger::LedgerClient;
use crate::ptb::{Argument, PtbBuilder};
use crate::types::{CoinRecord, ObjectRef, SuiAddress, TokenDescriptor};
use tracing::debug;

/// Coins chosen to fund a donation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CoinSelection {
    pub coins: Vec<CoinRecord>,
    pub total: u64,
}

impl CoinSelection {
    pub fn covers(&self, amount: u64) -> bool {
        self.total >= amount
    }

    pub fn object_refs(&self) -> Vec<ObjectRef> {
        self.coins.iter().map(CoinRecord::object_ref).collect()
    }

    /// Produce an argument holding exactly `amount`.
    ///
    /// A single coin of the exact amount is used as is. Otherwise every
    /// selected coin is merged into the first and `amount` is split out of it
    /// when the merged total is larger; the remainder stays with the owner.
    pub fn prepare(&self, ptb: &mut PtbBuilder, amount: u64) -> Result<Argument> {
        let Some((first, rest)) = self.coins.split_first() else {
            return Err(Error::validation("coins", "no coins selected"));
        };
        if !self.covers(amount) {
            return Err(Error::validation(
                "coins",
                format!("selected {} but {} is required", self.total, amount),
            ));
        }

        let primary = ptb.object(first.object_ref())?;
        if !rest.is_empty() {
            let sources = rest
                .iter()
                .map(|coin| ptb.object(coin.object_ref()))
                .collect::<Result<Vec<_>>>()?;
            ptb.merge_coins(primary, sources);
        }

        if self.total == amount {
            return Ok(primary);
        }

        let amount = ptb.pure(&amount)?;
        Ok(ptb.split_coins(primary, vec![amount])[0])
    }
}

/// Pages through an owner's coins until a target is covered
pub struct CoinSelector<'a, L> {
    ledger: &'a L,
}

impl<'a, L: LedgerClient> CoinSelector<'a, L> {
    pub fn new(ledger: &'a L) -> Self {
        Self { ledger }
    }

    /// Select coins whose balances sum to at least `required`
    pub async fn select_for_amount(
        &self,
        owner: &SuiAddress,
        token: &TokenDescriptor,
        required: u64,
    ) -> Result<CoinSelection> {
        let selection = self.select_up_to(owner, &token.coin_type, required).await?;
        if !selection.covers(required) {
            return Err(Error::InsufficientBalance {
                symbol: token.symbol.clone(),
                required,
                available: selection.total,
            });
        }
        Ok(selection)
    }

    /// Gather coins until `target` is reached or the owner runs out.
    ///
    /// Never fails for lack of funds; callers compare `total` themselves.
    pub async fn select_up_to(
        &self,
        owner: &SuiAddress,
        coin_type: &str,
        target: u64,
    ) -> Result<CoinSelection> {
        let mut selection = CoinSelection::default();
        let mut cursor: Option<String> = None;

        loop {
            let page = self
                .ledger
                .coins_page(owner, coin_type, cursor.as_deref(), COIN_PAGE_LIMIT)
                .await?;

            for coin in page.coins.into_iter().filter(|c| c.balance > 0) {
                selection.total = selection.total.saturating_add(coin.balance);
                selection.coins.push(coin);
                if selection.covers(target) {
                    debug!(coin_type, target, coins = selection.coins.len(), "Selected coins");
                    return Ok(selection);
                }
            }

            match page.next_cursor {
                Some(next) if page.has_next_page => {
                    if cursor.as_deref() == Some(next.as_str()) {
                        return Err(Error::malformed("coin page cursor did not advance"));
                    }
                    cursor = Some(next);
                }
                _ => break,
            }
        }

        debug!(
            coin_type,
            target,
            available = selection.total,
            "Coin listing exhausted before target"
        );
        Ok(selection)
    }
}
