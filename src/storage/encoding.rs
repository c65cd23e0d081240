//! Erasure-coded blob size
//!
//! A blob is split into `primary * secondary` source symbols and expanded into
//! one primary and one secondary sliver per shard. Every shard also stores the
//! blob metadata: two digests per shard plus the blob id.

use crate::constants::{BLOB_ID_LEN, DIGEST_LEN};
use crate::error::{Error, Result};

/// Symbol counts derived from the committee size
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSymbols {
    pub max_faulty: u64,
    pub primary: u64,
    pub secondary: u64,
}

impl SourceSymbols {
    pub fn for_shards(shard_count: u16) -> Result<Self> {
        if shard_count == 0 {
            return Err(Error::validation("shard_count", "must be at least 1"));
        }
        let n = shard_count as u64;
        let max_faulty = (n - 1) / 3;
        Ok(Self {
            max_faulty,
            primary: n - 2 * max_faulty,
            secondary: n - max_faulty,
        })
    }

    pub fn total(&self) -> u64 {
        self.primary * self.secondary
    }
}

/// Encoded size breakdown of a blob
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErasureSizes {
    pub symbol_size: u64,
    pub sliver_bytes: u64,
    pub metadata_bytes: u64,
    /// Slivers plus metadata; what the network bills
    pub encoded_bytes: u64,
}

/// Encoded size of a `raw_size` byte blob stored across `shard_count` shards.
///
/// Empty blobs are sized as one byte.
pub fn encoded_size(raw_size: u64, shard_count: u16) -> Result<ErasureSizes> {
    let symbols = SourceSymbols::for_shards(shard_count)?;
    let overflow = || Error::EncodingOverflow {
        raw_size,
        shard_count,
    };

    let n = shard_count as u64;
    let symbol_size =
        round_up_to_even(raw_size.max(1).div_ceil(symbols.total())).ok_or_else(overflow)?;

    let sliver_bytes = n
        .checked_mul(symbols.primary + symbols.secondary)
        .and_then(|v| v.checked_mul(symbol_size))
        .ok_or_else(overflow)?;

    let metadata_bytes = metadata_size(shard_count).ok_or_else(overflow)?;

    let encoded_bytes = sliver_bytes
        .checked_add(metadata_bytes)
        .ok_or_else(overflow)?;

    Ok(ErasureSizes {
        symbol_size,
        sliver_bytes,
        metadata_bytes,
        encoded_bytes,
    })
}

/// Metadata replicated on every shard
fn metadata_size(shard_count: u16) -> Option<u64> {
    let n = shard_count as u64;
    let per_shard = n.checked_mul(DIGEST_LEN * 2)?.checked_add(BLOB_ID_LEN)?;
    n.checked_mul(per_shard)
}

fn round_up_to_even(value: u64) -> Option<u64> {
    value.checked_add(value & 1)
}
