// crates/budstake-economics/src/custody.rs
//
// In-memory item custody ledger.
//
// Mirrors the subset of an NFT collection the engine relies on: who owns an
// item, operator approval for all of an owner's items, and transfers. The
// engine deposits by transferring from the staker to its own account, which
// requires the staker to have approved the engine as operator first.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use budstake_core::{AccountId, ItemCustody, ItemId, StakingError};

/// Ownership and approval records for non-fungible items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ItemVault {
    owners: BTreeMap<ItemId, AccountId>,
    /// owner -> operators allowed to move all of the owner's items.
    approvals: BTreeMap<AccountId, BTreeSet<AccountId>>,
}

impl ItemVault {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `item` owned by `to`.
    ///
    /// # Errors
    /// Returns `StakingError::Custody` if the item already exists.
    pub fn mint(&mut self, to: &AccountId, item: ItemId) -> Result<(), StakingError> {
        if let Some(owner) = self.owners.get(&item) {
            return Err(StakingError::Custody(format!(
                "item {} already exists (owned by {})",
                item, owner
            )));
        }
        self.owners.insert(item, to.clone());
        Ok(())
    }

    /// Grant or revoke `operator`'s right to move every item of `owner`.
    pub fn set_approval_for_all(&mut self, owner: &AccountId, operator: &AccountId, approved: bool) {
        if approved {
            self.approvals
                .entry(owner.clone())
                .or_default()
                .insert(operator.clone());
        } else if let Some(operators) = self.approvals.get_mut(owner) {
            operators.remove(operator);
            if operators.is_empty() {
                self.approvals.remove(owner);
            }
        }
    }

    pub fn is_approved_for_all(&self, owner: &AccountId, operator: &AccountId) -> bool {
        self.approvals
            .get(owner)
            .is_some_and(|operators| operators.contains(operator))
    }

    /// Items held by `owner`, ascending.
    pub fn items_of(&self, owner: &AccountId) -> Vec<ItemId> {
        self.owners
            .iter()
            .filter(|(_, o)| *o == owner)
            .map(|(id, _)| *id)
            .collect()
    }
}

impl ItemCustody for ItemVault {
    fn owner_of(&self, item: ItemId) -> Option<AccountId> {
        self.owners.get(&item).cloned()
    }

    fn is_authorized(&self, owner: &AccountId, operator: &AccountId, item: ItemId) -> bool {
        match self.owners.get(&item) {
            Some(current) if current == owner => operator == owner || self.is_approved_for_all(owner, operator),
            _ => false,
        }
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, item: ItemId) -> Result<(), StakingError> {
        match self.owners.get_mut(&item) {
            Some(owner) if owner == from => {
                *owner = to.clone();
                Ok(())
            }
            Some(owner) => Err(StakingError::Custody(format!(
                "item {} is owned by {}, not {}",
                item, owner, from
            ))),
            None => Err(StakingError::Custody(format!("item {} does not exist", item))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    fn engine() -> AccountId {
        AccountId::new("engine")
    }

    #[test]
    fn test_mint_and_owner() {
        let mut vault = ItemVault::new();
        vault.mint(&alice(), 3).unwrap();
        assert_eq!(vault.owner_of(3), Some(alice()));
        assert_eq!(vault.items_of(&alice()), vec![3]);
        assert!(vault.mint(&engine(), 3).is_err());
    }

    #[test]
    fn test_authorization_requires_approval() {
        let mut vault = ItemVault::new();
        vault.mint(&alice(), 1).unwrap();

        assert!(vault.is_authorized(&alice(), &alice(), 1));
        assert!(!vault.is_authorized(&alice(), &engine(), 1));

        vault.set_approval_for_all(&alice(), &engine(), true);
        assert!(vault.is_authorized(&alice(), &engine(), 1));

        vault.set_approval_for_all(&alice(), &engine(), false);
        assert!(!vault.is_authorized(&alice(), &engine(), 1));
    }

    #[test]
    fn test_authorization_requires_ownership() {
        let mut vault = ItemVault::new();
        vault.mint(&engine(), 1).unwrap();
        vault.set_approval_for_all(&alice(), &engine(), true);
        assert!(!vault.is_authorized(&alice(), &engine(), 1));
        assert!(!vault.is_authorized(&alice(), &engine(), 99));
    }

    #[test]
    fn test_transfer() {
        let mut vault = ItemVault::new();
        vault.mint(&alice(), 1).unwrap();
        vault.transfer(&alice(), &engine(), 1).unwrap();
        assert_eq!(vault.owner_of(1), Some(engine()));
        assert!(vault.transfer(&alice(), &engine(), 1).is_err());
        assert!(vault.transfer(&alice(), &engine(), 2).is_err());
    }
}
