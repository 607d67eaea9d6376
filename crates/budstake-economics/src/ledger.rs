// crates/budstake-economics/src/ledger.rs
//
// In-memory SEED balance ledger.
//
// Stands in for the reward token contract: the deploy flow mints the whole
// emission pool (3,000,000 SEED) to the engine's account, and claims are
// paid by transferring from that account to the staker.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use budstake_core::{AccountId, RewardLedger, StakingError, Wei};

/// Balance ledger for the SEED reward token.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SeedLedger {
    balances: BTreeMap<AccountId, Wei>,
    total_supply: Wei,
}

impl SeedLedger {
    /// Create a ledger with no balances.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create `amount` new tokens in `to`'s balance.
    ///
    /// # Errors
    /// Returns `StakingError::Overflow` if the total supply would overflow.
    pub fn mint(&mut self, to: &AccountId, amount: Wei) -> Result<(), StakingError> {
        let total_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or_else(|| StakingError::Overflow("total supply".to_string()))?;
        // Cannot overflow: every balance is bounded by the total supply.
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        self.total_supply = total_supply;
        Ok(())
    }

    /// Sum of all balances.
    pub fn total_supply(&self) -> Wei {
        self.total_supply
    }
}

impl RewardLedger for SeedLedger {
    fn balance_of(&self, account: &AccountId) -> Wei {
        self.balances.get(account).copied().unwrap_or(0)
    }

    fn transfer(&mut self, from: &AccountId, to: &AccountId, amount: Wei) -> Result<(), StakingError> {
        let available = self.balance_of(from);
        if amount > available {
            return Err(StakingError::Ledger(format!(
                "insufficient balance: {} holds {} wei, transfer of {} wei requested",
                from, available, amount
            )));
        }
        if amount == 0 || from == to {
            return Ok(());
        }
        self.balances.insert(from.clone(), available - amount);
        *self.balances.entry(to.clone()).or_insert(0) += amount;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::token::WEI_PER_SEED;

    fn engine() -> AccountId {
        AccountId::new("engine")
    }

    fn alice() -> AccountId {
        AccountId::new("alice")
    }

    #[test]
    fn test_new_ledger_has_zero_supply() {
        let ledger = SeedLedger::new();
        assert_eq!(ledger.total_supply(), 0);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }

    #[test]
    fn test_mint() {
        let mut ledger = SeedLedger::new();
        ledger.mint(&engine(), 3_000_000 * WEI_PER_SEED).unwrap();
        assert_eq!(ledger.balance_of(&engine()), 3_000_000 * WEI_PER_SEED);
        assert_eq!(ledger.total_supply(), 3_000_000 * WEI_PER_SEED);
    }

    #[test]
    fn test_transfer_success() {
        let mut ledger = SeedLedger::new();
        ledger.mint(&engine(), 100 * WEI_PER_SEED).unwrap();
        ledger.transfer(&engine(), &alice(), 40 * WEI_PER_SEED).unwrap();
        assert_eq!(ledger.balance_of(&engine()), 60 * WEI_PER_SEED);
        assert_eq!(ledger.balance_of(&alice()), 40 * WEI_PER_SEED);
        assert_eq!(ledger.total_supply(), 100 * WEI_PER_SEED);
    }

    #[test]
    fn test_transfer_exact_balance() {
        let mut ledger = SeedLedger::new();
        ledger.mint(&engine(), 100).unwrap();
        ledger.transfer(&engine(), &alice(), 100).unwrap();
        assert_eq!(ledger.balance_of(&engine()), 0);
    }

    #[test]
    fn test_transfer_insufficient_balance() {
        let mut ledger = SeedLedger::new();
        ledger.mint(&engine(), 50).unwrap();
        let result = ledger.transfer(&engine(), &alice(), 100);
        assert!(matches!(result, Err(StakingError::Ledger(_))));
        // Balance should be unchanged
        assert_eq!(ledger.balance_of(&engine()), 50);
        assert_eq!(ledger.balance_of(&alice()), 0);
    }

    #[test]
    fn test_mint_overflow_rejected() {
        let mut ledger = SeedLedger::new();
        ledger.mint(&engine(), Wei::MAX).unwrap();
        assert!(ledger.mint(&alice(), 1).is_err());
        assert_eq!(ledger.balance_of(&alice()), 0);
    }
}
