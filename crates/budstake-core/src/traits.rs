// crates/budstake-core/src/traits.rs

use crate::error::StakingError;
use crate::types::{AccountId, ItemId, Timestamp, Wei};

/// Source of the current time.
///
/// Must be monotonically non-decreasing across calls within one timeline.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Fungible reward-token ledger the engine pays claims from.
///
/// Implemented in-memory by `budstake_economics::SeedLedger`.
pub trait RewardLedger: Send + Sync {
    /// Balance held by `account`, in wei.
    fn balance_of(&self, account: &AccountId) -> Wei;

    /// Move `amount` from `from` to `to`.
    ///
    /// Must fail without side effects if `from` cannot cover the amount.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Wei) -> Result<(), StakingError>;
}

/// Custody ledger for the staked non-fungible items.
///
/// Implemented in-memory by `budstake_economics::ItemVault`.
pub trait ItemCustody: Send + Sync {
    /// Current owner of an item, if it exists.
    fn owner_of(&self, item: ItemId) -> Option<AccountId>;

    /// Whether `operator` may move `item` on behalf of `owner`.
    ///
    /// False when `owner` does not hold the item.
    fn is_authorized(&self, owner: &AccountId, operator: &AccountId, item: ItemId) -> bool;

    /// Transfer `item` from `from` to `to`. Fails if `from` does not own it.
    fn transfer(&mut self, from: &AccountId, to: &AccountId, item: ItemId) -> Result<(), StakingError>;
}
