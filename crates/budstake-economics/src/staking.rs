// crates/budstake-economics/src/staking.rs
//
// Stake registry: the set of live stake records and who owns them.
//
// The registry is pure bookkeeping. It validates a whole batch before
// touching anything, so a rejected batch leaves it unchanged. Reward
// synchronisation around count changes is the accumulator's job (see
// rewards.rs); the engine calls both in the required order.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use budstake_core::{AccountId, ItemId, StakeRecord, StakingError, Timestamp};

/// Owns every live [`StakeRecord`], indexed by item and by owner.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StakeRegistry {
    records: BTreeMap<ItemId, StakeRecord>,
    by_owner: BTreeMap<AccountId, BTreeSet<ItemId>>,
}

impl StakeRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Check that `items` can be staked as one batch.
    ///
    /// # Errors
    /// Returns `StakingError::InvalidStakeState` for an empty batch, a
    /// duplicate id within the batch, or an item that is already staked.
    pub fn check_stake(&self, items: &[ItemId]) -> Result<(), StakingError> {
        check_batch_shape(items)?;
        if let Some(record) = items.iter().find_map(|id| self.records.get(id)) {
            return Err(StakingError::InvalidStakeState(format!(
                "item {} is already staked by {}",
                record.item_id, record.owner
            )));
        }
        Ok(())
    }

    /// Check that `owner` can withdraw `items` as one batch.
    ///
    /// # Errors
    /// Returns `StakingError::InvalidStakeState` for an empty or duplicated
    /// batch, an item that is not staked, or an item staked by someone else.
    pub fn check_withdraw(&self, owner: &AccountId, items: &[ItemId]) -> Result<(), StakingError> {
        check_batch_shape(items)?;
        for id in items {
            match self.records.get(id) {
                None => {
                    return Err(StakingError::InvalidStakeState(format!(
                        "item {} is not staked",
                        id
                    )))
                }
                Some(record) if record.owner != *owner => {
                    return Err(StakingError::InvalidStakeState(format!(
                        "item {} is not staked by {}",
                        id, owner
                    )))
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Record a validated batch. Call [`check_stake`](Self::check_stake) first.
    ///
    /// # Errors
    /// Re-validates and returns the same errors as `check_stake`; nothing is
    /// inserted on error.
    pub fn insert(
        &mut self,
        owner: &AccountId,
        items: &[ItemId],
        staked_at: Timestamp,
    ) -> Result<(), StakingError> {
        self.check_stake(items)?;
        let owned = self.by_owner.entry(owner.clone()).or_default();
        for &item_id in items {
            owned.insert(item_id);
            self.records.insert(
                item_id,
                StakeRecord {
                    item_id,
                    owner: owner.clone(),
                    staked_at,
                },
            );
        }
        Ok(())
    }

    /// Remove a validated batch and return the removed records, in batch order.
    ///
    /// # Errors
    /// Re-validates and returns the same errors as `check_withdraw`; nothing
    /// is removed on error.
    pub fn remove(
        &mut self,
        owner: &AccountId,
        items: &[ItemId],
    ) -> Result<Vec<StakeRecord>, StakingError> {
        self.check_withdraw(owner, items)?;
        let mut removed = Vec::with_capacity(items.len());
        for id in items {
            if let Some(record) = self.records.remove(id) {
                removed.push(record);
            }
        }
        if let Some(owned) = self.by_owner.get_mut(owner) {
            for id in items {
                owned.remove(id);
            }
            if owned.is_empty() {
                self.by_owner.remove(owner);
            }
        }
        Ok(removed)
    }

    /// The live record for an item, if staked.
    pub fn get(&self, item: ItemId) -> Option<&StakeRecord> {
        self.records.get(&item)
    }

    /// Ids staked by `owner`, ascending.
    pub fn items_of(&self, owner: &AccountId) -> Vec<ItemId> {
        self.by_owner
            .get(owner)
            .map(|items| items.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Records staked by `owner`, ascending by item id.
    pub fn records_of(&self, owner: &AccountId) -> Vec<&StakeRecord> {
        self.by_owner
            .get(owner)
            .map(|items| items.iter().filter_map(|id| self.records.get(id)).collect())
            .unwrap_or_default()
    }

    /// Number of live records.
    pub fn total_staked(&self) -> u64 {
        self.records.len() as u64
    }

    /// Every live record, ascending by item id.
    pub fn records(&self) -> impl Iterator<Item = &StakeRecord> {
        self.records.values()
    }

    /// Accounts with at least one live record.
    pub fn stakers(&self) -> impl Iterator<Item = &AccountId> {
        self.by_owner.keys()
    }
}

fn check_batch_shape(items: &[ItemId]) -> Result<(), StakingError> {
    if items.is_empty() {
        return Err(StakingError::InvalidStakeState(
            "batch contains no items".to_string(),
        ));
    }
    let mut seen = BTreeSet::new();
    for id in items {
        if !seen.insert(*id) {
            return Err(StakingError::InvalidStakeState(format!(
                "item {} appears more than once in the batch",
                id
            )));
        }
    }
    Ok(())
}
