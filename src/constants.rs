//! Protocol constants and fixed-point helpers

/// SUI has 9 decimals; gas is paid in MIST
pub const SUI_DECIMALS: u8 = 9;

pub const MIST_PER_SUI: u64 = 1_000_000_000;

/// WAL has 9 decimals; storage is charged in FROST
pub const WAL_DECIMALS: u8 = 9;

pub const FROST_PER_WAL: u64 = 1_000_000_000;

/// USD values exchanged with the donation contract are in micro-dollars
pub const USD_MICRO_DECIMALS: i32 = 6;

/// Slippage and subsidy rates are expressed in basis points
pub const BPS_DENOMINATOR: u64 = 10_000;

/// Default slippage tolerance (1%)
pub const DEFAULT_SLIPPAGE_BPS: u16 = 100;

/// Walrus bills storage in units of 1 MiB
pub const BYTES_PER_UNIT_SIZE: u64 = 1024 * 1024;

/// Walrus digest and blob id length
pub const DIGEST_LEN: u64 = 32;

pub const BLOB_ID_LEN: u64 = 32;

/// Maximum number of epochs storage can be bought ahead on Walrus
pub const DEFAULT_MAX_EPOCHS_AHEAD: u32 = 53;

pub const SUI_COIN_TYPE: &str = "0x2::sui::SUI";

/// Shared clock object
pub const SUI_CLOCK_OBJECT_ID: &str = "0x6";

pub const SUI_CLOCK_INITIAL_SHARED_VERSION: u64 = 1;

/// Page size used when listing coins
pub const COIN_PAGE_LIMIT: usize = 50;

/// Most coin objects a transaction may pay gas with
pub const MAX_GAS_PAYMENT_OBJECTS: usize = 256;

/// Gas units the Sui SDK adds on top of the dry-run computation cost
pub const GAS_SAFE_OVERHEAD: u64 = 1000;

/// Gas reserve multiplier in percent (1.3x)
pub const DEFAULT_GAS_MULTIPLIER_PCT: u64 = 130;

/// Flat buffer added to the multiplied gas budget (0.005 SUI)
pub const DEFAULT_GAS_FLAT_OVERHEAD: u64 = 5_000_000;

/// Reserve used when gas estimation fails (0.03 SUI)
pub const DEFAULT_FALLBACK_GAS_RESERVE: u64 = 30_000_000;

pub const DEFAULT_GAS_RESERVE_ATTEMPTS: u8 = 3;

/// Default Pyth update fee on Sui, in MIST
pub const DEFAULT_ORACLE_UPDATE_FEE: u64 = 1;

/// Pricing snapshot time-to-live
pub const DEFAULT_PRICING_CACHE_TTL_SECS: u64 = 60;

/// Convert a smallest-unit amount into display units.
///
/// Only used for presentation; cost arithmetic stays in integers.
pub fn to_display_units(value: u128, per_unit: u64) -> f64 {
    let per_unit = per_unit as u128;
    let whole = value / per_unit;
    let remainder = value % per_unit;
    whole as f64 + remainder as f64 / per_unit as f64
}

/// Convert FROST to WAL for display
pub fn frost_to_wal(frost: u128) -> f64 {
    to_display_units(frost, FROST_PER_WAL)
}

/// Convert MIST to SUI for display
pub fn mist_to_sui(mist: u64) -> f64 {
    to_display_units(mist as u128, MIST_PER_SUI)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frost_to_wal() {
        assert_eq!(frost_to_wal(1_500_000_000), 1.5);
        assert_eq!(frost_to_wal(0), 0.0);
        assert_eq!(frost_to_wal(250_000), 0.00025);
    }

    #[test]
    fn test_mist_to_sui() {
        assert_eq!(mist_to_sui(30_000_000), 0.03);
        assert_eq!(mist_to_sui(2 * MIST_PER_SUI), 2.0);
    }
}
