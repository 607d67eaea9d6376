// crates/budstake-core/src/types.rs

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Identifier of a non-fungible item in the custody ledger.
pub type ItemId = u64;

/// Smallest unit of the reward token (1 SEED = 10^18 wei).
pub type Wei = u128;

/// Identity of an account on the hosting ledger.
///
/// Opaque to the engine: it is only compared and used as a map key. Hosts
/// typically use hex addresses (e.g. "0xdf29...").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccountId(String);

impl AccountId {
    /// Create an account id, normalising hex addresses to lowercase.
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        if id.starts_with("0x") || id.starts_with("0X") {
            Self(id.to_lowercase())
        } else {
            Self(id)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AccountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for AccountId {
    fn from(s: &str) -> Self {
        AccountId::new(s)
    }
}

/// A live stake position for a single item.
///
/// Created by `stake` (or migration replay), destroyed by `withdraw`.
/// At most one record exists per item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StakeRecord {
    pub item_id: ItemId,
    pub owner: AccountId,
    /// Time the item entered custody (historical for replayed records).
    pub staked_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_account_id_normalises_hex() {
        let a = AccountId::new("0xDF29B31798a447956E6fcef6CD9428c4ae9caF39");
        let b = AccountId::new("0xdf29b31798a447956e6fcef6cd9428c4ae9caf39");
        assert_eq!(a, b);
    }

    #[test]
    fn test_account_id_keeps_plain_names() {
        assert_eq!(AccountId::new("Alice").as_str(), "Alice");
    }

    #[test]
    fn test_account_id_serializes_transparently() {
        let json = serde_json::to_string(&AccountId::new("alice")).unwrap();
        assert_eq!(json, "\"alice\"");
    }
}
