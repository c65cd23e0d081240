//! Spendable coin records

use super::object::{ObjectDigest, ObjectId, ObjectRef};
use serde::{Deserialize, Serialize};

/// A ledger coin object holding a balance of one token type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CoinRecord {
    pub object_id: ObjectId,
    pub balance: u64,
    pub version: u64,
    pub digest: ObjectDigest,
}

impl CoinRecord {
    pub fn object_ref(&self) -> ObjectRef {
        ObjectRef {
            object_id: self.object_id,
            version: self.version,
            digest: self.digest,
        }
    }
}

/// One page of coins returned by the ledger
#[derive(Debug, Clone, Default)]
pub struct CoinPage {
    pub coins: Vec<CoinRecord>,
    pub next_cursor: Option<String>,
    pub has_next_page: bool,
}
