//! Ledger object identifiers and references

use crate::error::{Error, Result};
use alloy::primitives::{hex, B256};
use serde::{de, Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// 32-byte object identifier (also used for account addresses)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct ObjectId(pub B256);

/// Accounts share the object id representation
pub type SuiAddress = ObjectId;

impl ObjectId {
    pub const ZERO: Self = Self(B256::ZERO);

    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(B256::new(bytes))
    }

    pub fn is_zero(&self) -> bool {
        self.0 == B256::ZERO
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0 .0
    }
}

impl FromStr for ObjectId {
    type Err = Error;

    /// Parses full or short (`0x2`) hex, left-padding to 32 bytes
    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);

        if digits.is_empty() || digits.len() > 64 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::validation("object_id", format!("{:?} is not a valid id", s)));
        }

        let padded = format!("{:0>64}", digits);
        let bytes = B256::from_str(&padded)
            .map_err(|e| Error::validation("object_id", format!("{:?}: {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 32]> for ObjectId {
    fn from(bytes: [u8; 32]) -> Self {
        Self::new(bytes)
    }
}

impl Serialize for ObjectId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            // fixed-size tuple, no length prefix
            self.as_bytes().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for ObjectId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            <[u8; 32]>::deserialize(deserializer).map(Self::new)
        }
    }
}

/// 32-byte object digest, base58 in JSON
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ObjectDigest(pub [u8; 32]);

impl FromStr for ObjectDigest {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let bytes = bs58::decode(s)
            .into_vec()
            .map_err(|e| Error::malformed(format!("digest {:?}: {}", s, e)))?;
        let bytes: [u8; 32] = bytes
            .try_into()
            .map_err(|_| Error::malformed(format!("digest {:?} is not 32 bytes", s)))?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for ObjectDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&bs58::encode(self.0).into_string())
    }
}

impl Serialize for ObjectDigest {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        if serializer.is_human_readable() {
            serializer.serialize_str(&self.to_string())
        } else {
            // digests are length-prefixed on the wire
            serializer.serialize_bytes(&self.0)
        }
    }
}

impl<'de> Deserialize<'de> for ObjectDigest {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        if deserializer.is_human_readable() {
            let s = String::deserialize(deserializer)?;
            s.parse().map_err(de::Error::custom)
        } else {
            let bytes = Vec::<u8>::deserialize(deserializer)?;
            let bytes: [u8; 32] = bytes
                .try_into()
                .map_err(|_| de::Error::custom("digest must be 32 bytes"))?;
            Ok(Self(bytes))
        }
    }
}

/// Reference to an owned or immutable object at a specific version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    pub object_id: ObjectId,
    pub version: u64,
    pub digest: ObjectDigest,
}

/// Reference to a shared object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SharedObjectRef {
    pub object_id: ObjectId,
    pub initial_shared_version: u64,
    pub mutable: bool,
}

impl SharedObjectRef {
    pub fn new(object_id: ObjectId, initial_shared_version: u64, mutable: bool) -> Self {
        Self {
            object_id,
            initial_shared_version,
            mutable,
        }
    }

    /// Same object, read-only access
    pub fn immutable(mut self) -> Self {
        self.mutable = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_id_padding() {
        let id: ObjectId = "0x6".parse().unwrap();
        assert_eq!(
            id.to_string(),
            "0x0000000000000000000000000000000000000000000000000000000000000006"
        );
        assert_eq!(id.as_bytes()[31], 6);
        assert!(!id.is_zero());
    }

    #[test]
    fn test_invalid_ids() {
        assert!("".parse::<ObjectId>().is_err());
        assert!("0x".parse::<ObjectId>().is_err());
        assert!("0xzz".parse::<ObjectId>().is_err());
        assert!(format!("0x{}", "1".repeat(65)).parse::<ObjectId>().is_err());
    }

    #[test]
    fn test_id_serialization() {
        let id: ObjectId = "0x2".parse().unwrap();
        assert_eq!(
            serde_json::to_string(&id).unwrap(),
            format!("\"{}\"", id)
        );
        let bytes = bcs::to_bytes(&id).unwrap();
        assert_eq!(bytes.len(), 32);
        assert_eq!(bcs::from_bytes::<ObjectId>(&bytes).unwrap(), id);
    }

    #[test]
    fn test_digest_bcs_is_length_prefixed() {
        let digest = ObjectDigest([7u8; 32]);
        let bytes = bcs::to_bytes(&digest).unwrap();
        assert_eq!(bytes.len(), 33);
        assert_eq!(bytes[0], 32);

        let text = digest.to_string();
        assert_eq!(text.parse::<ObjectDigest>().unwrap(), digest);
    }
}
