//! Ledger query capability used by coin selection and gas estimation

use crate::constants::GAS_SAFE_OVERHEAD;
use crate::error::Result;
use crate::ptb::DonationTransaction;
use crate::types::{CoinPage, ObjectId, ObjectRef, SharedObjectRef, SuiAddress};

/// Gas figures reported by a dry run, in MIST
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DryRunGas {
    pub computation_cost: u64,
    pub storage_cost: u64,
    pub storage_rebate: u64,
    pub non_refundable_storage_fee: u64,
}

impl DryRunGas {
    /// Gas budget for the transaction, computed the way wallets do:
    /// computation plus a safe overhead, plus net storage when positive.
    pub fn budget(&self, reference_gas_price: u64) -> u64 {
        let overhead = GAS_SAFE_OVERHEAD.saturating_mul(reference_gas_price);
        let base = self.computation_cost.saturating_add(overhead);
        let with_storage = base
            .saturating_add(self.storage_cost)
            .saturating_sub(self.storage_rebate);
        base.max(with_storage)
    }
}

/// Outcome of dry-running a transaction
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DryRunOutcome {
    pub success: bool,
    pub error: Option<String>,
    pub gas: DryRunGas,
    /// BCS return values per command
    pub return_values: Vec<Vec<Vec<u8>>>,
}

/// Read-only access to the ledger
pub trait LedgerClient: Send + Sync {
    /// One page of coins of `coin_type` owned by `owner`
    fn coins_page(
        &self,
        owner: &SuiAddress,
        coin_type: &str,
        cursor: Option<&str>,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<CoinPage>> + Send;

    /// Current reference to an owned or immutable object
    fn object_ref(
        &self,
        id: &ObjectId,
    ) -> impl std::future::Future<Output = Result<ObjectRef>> + Send;

    /// Shared object reference, failing if the object is not shared
    fn shared_object(
        &self,
        id: &ObjectId,
        mutable: bool,
    ) -> impl std::future::Future<Output = Result<SharedObjectRef>> + Send;

    fn reference_gas_price(&self) -> impl std::future::Future<Output = Result<u64>> + Send;

    /// Execute the transaction without committing it
    fn dry_run(
        &self,
        tx: &DonationTransaction,
    ) -> impl std::future::Future<Output = Result<DryRunOutcome>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_budget_ignores_net_rebate() {
        let gas = DryRunGas {
            computation_cost: 1_000_000,
            storage_cost: 2_000_000,
            storage_rebate: 3_000_000,
            non_refundable_storage_fee: 0,
        };
        assert_eq!(gas.budget(750), 1_000_000 + 750_000);
    }

    #[test]
    fn test_budget_adds_net_storage() {
        let gas = DryRunGas {
            computation_cost: 1_000_000,
            storage_cost: 4_000_000,
            storage_rebate: 1_000_000,
            non_refundable_storage_fee: 10_000,
        };
        assert_eq!(gas.budget(1000), 1_000_000 + 1_000_000 + 3_000_000);
    }
}
