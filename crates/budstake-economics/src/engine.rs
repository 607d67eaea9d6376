// crates/budstake-economics/src/engine.rs
//
// Staking engine: the public stake / withdraw / claim / query surface.
//
// Position lifecycle: Unstaked -> Staked -> Unstaked. Claiming never changes
// a position, it only pays out and zeroes the stored reward.
//
// Every mutating call runs on a copy of the accumulator and of the caller's
// account, and commits only once every fallible step (validation, custody
// transfers, ledger payout) has succeeded. A failed call leaves the engine
// exactly as it was.
//
// Engine lifecycle: an engine built with `new` is Active immediately. An
// engine built with `for_migration` starts in the Migrating phase, where only
// the owner's replay operations (see migration.rs) are accepted, until the
// owner activates it.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use budstake_core::{
    AccountId, Clock, ItemCustody, ItemId, RewardLedger, StakeRecord, StakingError, Wei,
    SECONDS_PER_DAY,
};

use crate::emission::ScheduleConfig;
use crate::rewards::{GlobalState, RewardAccumulator, UserAccount};
use crate::staking::StakeRegistry;

/// Accrual interval that reproduces whole-day accounting.
pub const DAILY_ACCRUAL_SECS: u64 = SECONDS_PER_DAY;

/// Engine lifecycle phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnginePhase {
    /// Replaying historical state; public operations are rejected.
    Migrating,
    /// Open for stake, withdraw, and claim.
    Active,
}

impl fmt::Display for EnginePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EnginePhase::Migrating => write!(f, "Migrating"),
            EnginePhase::Active => write!(f, "Active"),
        }
    }
}

/// Tunable engine parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub schedule: ScheduleConfig,

    /// Length of an accrual interval in seconds. 1 = continuous accrual,
    /// 86400 = whole-day accrual.
    #[serde(default = "default_accrual_interval_secs")]
    pub accrual_interval_secs: u64,
}

fn default_accrual_interval_secs() -> u64 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            schedule: ScheduleConfig::default(),
            accrual_interval_secs: default_accrual_interval_secs(),
        }
    }
}

impl EngineConfig {
    /// Default schedule with whole-day accrual.
    pub fn daily() -> Self {
        Self {
            accrual_interval_secs: DAILY_ACCRUAL_SECS,
            ..Self::default()
        }
    }
}

/// Everything the engine owns, in serialisable form.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineState {
    /// Account allowed to run administrative operations.
    pub owner: AccountId,
    /// Account that holds staked items and the reward pool.
    pub engine_account: AccountId,
    pub phase: EnginePhase,
    pub paused: bool,
    pub rewards: RewardAccumulator,
    pub registry: StakeRegistry,
    pub accounts: BTreeMap<AccountId, UserAccount>,
}

/// Result of [`StakingEngine::user_stake_info`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StakeInfo {
    /// Items currently staked by the user, ascending.
    pub item_ids: Vec<ItemId>,
    /// Stored plus not-yet-settled reward as of now, in wei.
    pub pending_reward: Wei,
}

/// The staking engine, generic over its clock and the two external ledgers.
pub struct StakingEngine<C, L, I> {
    pub(crate) state: EngineState,
    pub(crate) clock: C,
    pub(crate) ledger: L,
    pub(crate) custody: I,
}

impl<C: Clock, L: RewardLedger, I: ItemCustody> StakingEngine<C, L, I> {
    /// Create an active engine whose emission schedule starts now.
    ///
    /// # Errors
    /// Returns `StakingError::InvalidSchedule` for a malformed configuration.
    pub fn new(
        config: &EngineConfig,
        owner: AccountId,
        engine_account: AccountId,
        clock: C,
        ledger: L,
        custody: I,
    ) -> Result<Self, StakingError> {
        Self::build(config, owner, engine_account, EnginePhase::Active, clock, ledger, custody)
    }

    /// Create an engine in the Migrating phase, ready for historical replay.
    pub fn for_migration(
        config: &EngineConfig,
        owner: AccountId,
        engine_account: AccountId,
        clock: C,
        ledger: L,
        custody: I,
    ) -> Result<Self, StakingError> {
        Self::build(config, owner, engine_account, EnginePhase::Migrating, clock, ledger, custody)
    }

    fn build(
        config: &EngineConfig,
        owner: AccountId,
        engine_account: AccountId,
        phase: EnginePhase,
        clock: C,
        ledger: L,
        custody: I,
    ) -> Result<Self, StakingError> {
        let schedule = config.schedule.build()?;
        let rewards = RewardAccumulator::new(schedule, config.accrual_interval_secs, clock.now())?;
        tracing::info!(
            "Staking engine created for {} (owner {}, phase {}, accrual interval {}s)",
            engine_account,
            owner,
            phase,
            config.accrual_interval_secs
        );
        Ok(Self {
            state: EngineState {
                owner,
                engine_account,
                phase,
                paused: false,
                rewards,
                registry: StakeRegistry::new(),
                accounts: BTreeMap::new(),
            },
            clock,
            ledger,
            custody,
        })
    }

    /// Rebuild an engine from previously saved state.
    pub fn from_parts(state: EngineState, clock: C, ledger: L, custody: I) -> Self {
        Self {
            state,
            clock,
            ledger,
            custody,
        }
    }

    /// Split the engine back into its state and ledgers.
    pub fn into_parts(self) -> (EngineState, L, I) {
        (self.state, self.ledger, self.custody)
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub fn ledger(&self) -> &L {
        &self.ledger
    }

    pub fn ledger_mut(&mut self) -> &mut L {
        &mut self.ledger
    }

    pub fn custody(&self) -> &I {
        &self.custody
    }

    pub fn custody_mut(&mut self) -> &mut I {
        &mut self.custody
    }

    pub fn owner(&self) -> &AccountId {
        &self.state.owner
    }

    pub fn engine_account(&self) -> &AccountId {
        &self.state.engine_account
    }

    pub fn phase(&self) -> EnginePhase {
        self.state.phase
    }

    pub fn is_paused(&self) -> bool {
        self.state.paused
    }

    // -----------------------------------------------------------------------
    // Public operations
    // -----------------------------------------------------------------------

    /// Deposit `items` from `caller` into engine custody and start accruing.
    ///
    /// # Errors
    /// - `EnginePaused` / `InvalidPhase` if the engine is not open.
    /// - `InvalidStakeState` for an empty or duplicated batch, or an item
    ///   that is already staked.
    /// - `Unauthorized` if `caller` does not own an item or has not approved
    ///   the engine to move it.
    pub fn stake(&mut self, caller: &AccountId, items: &[ItemId]) -> Result<(), StakingError> {
        self.ensure_open()?;
        self.state.registry.check_stake(items)?;
        for &item in items {
            if !self
                .custody
                .is_authorized(caller, &self.state.engine_account, item)
            {
                return Err(StakingError::Unauthorized(format!(
                    "{} cannot deposit item {}: not the owner or engine not approved",
                    caller, item
                )));
            }
        }

        let now = self.clock.now();
        let mut rewards = self.state.rewards.clone();
        let mut account = self.account(caller);
        rewards.stake_units(&mut account, items.len() as u64, now)?;

        let engine_account = self.state.engine_account.clone();
        self.move_items(caller, &engine_account, items)?;
        self.state.registry.insert(caller, items, now)?;
        self.state.rewards = rewards;
        self.store_account(caller, account);

        tracing::info!(
            "{} staked {:?} at {} (total staked {})",
            caller,
            items,
            now,
            self.state.registry.total_staked()
        );
        Ok(())
    }

    /// Return `items` to `caller` and stop their accrual.
    ///
    /// Rewards earned so far stay in the caller's stored balance until
    /// claimed.
    ///
    /// # Errors
    /// - `EnginePaused` / `InvalidPhase` if the engine is not open.
    /// - `InvalidStakeState` if an item is not staked by `caller`.
    pub fn withdraw(&mut self, caller: &AccountId, items: &[ItemId]) -> Result<(), StakingError> {
        self.ensure_open()?;
        self.state.registry.check_withdraw(caller, items)?;
        let staked_at: Vec<_> = items
            .iter()
            .filter_map(|&id| self.state.registry.get(id))
            .map(|record| record.staked_at)
            .collect();

        let now = self.clock.now();
        let mut rewards = self.state.rewards.clone();
        let mut account = self.account(caller);
        rewards.withdraw_units(&mut account, &staked_at, now)?;

        let engine_account = self.state.engine_account.clone();
        self.move_items(&engine_account, caller, items)?;
        self.state.registry.remove(caller, items)?;
        self.state.rewards = rewards;
        self.store_account(caller, account);

        tracing::info!(
            "{} withdrew {:?} at {} (total staked {})",
            caller,
            items,
            now,
            self.state.registry.total_staked()
        );
        Ok(())
    }

    /// Pay `caller` everything it has earned. Returns the amount paid.
    ///
    /// # Errors
    /// - `EnginePaused` / `InvalidPhase` if the engine is not open.
    /// - `InsufficientRewardPool` if the engine's ledger balance cannot cover
    ///   the claim; nothing is paid and the reward stays stored.
    pub fn claim_rewards(&mut self, caller: &AccountId) -> Result<Wei, StakingError> {
        self.ensure_open()?;
        let now = self.clock.now();
        let mut rewards = self.state.rewards.clone();
        let mut account = self.account(caller);
        let amount = rewards.take_reward(&mut account, now)?;

        if amount > 0 {
            let available = self.ledger.balance_of(&self.state.engine_account);
            if amount > available {
                tracing::warn!(
                    "Claim of {} wei by {} exceeds reward pool balance {}",
                    amount,
                    caller,
                    available
                );
                return Err(StakingError::InsufficientRewardPool {
                    requested: amount,
                    available,
                });
            }
            self.ledger
                .transfer(&self.state.engine_account, caller, amount)?;
        }

        self.state.rewards = rewards;
        self.store_account(caller, account);
        tracing::info!("{} claimed {} wei at {}", caller, amount, now);
        Ok(amount)
    }

    // -----------------------------------------------------------------------
    // Queries (never mutate)
    // -----------------------------------------------------------------------

    /// Number of items currently staked, across all users.
    pub fn staked_token_amount(&self) -> u64 {
        self.state.registry.total_staked()
    }

    /// Items staked by `owner` and its pending reward as of now.
    pub fn user_stake_info(&self, owner: &AccountId) -> Result<StakeInfo, StakingError> {
        let account = self.account(owner);
        let pending_reward = self
            .state
            .rewards
            .pending_reward(&account, self.clock.now())?;
        Ok(StakeInfo {
            item_ids: self.state.registry.items_of(owner),
            pending_reward,
        })
    }

    /// Stake records of `owner`, with their stake times.
    pub fn user_stake_records(&self, owner: &AccountId) -> Vec<StakeRecord> {
        self.state
            .registry
            .records_of(owner)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Global accounting state as of now.
    pub fn global_state(&self) -> Result<GlobalState, StakingError> {
        self.state.rewards.synced_state(self.clock.now())
    }

    /// What the reward ledger still holds for future claims.
    pub fn reward_pool_balance(&self) -> Wei {
        self.ledger.balance_of(&self.state.engine_account)
    }

    // -----------------------------------------------------------------------
    // Administration
    // -----------------------------------------------------------------------

    /// Reject stake, withdraw, and claim until `unpause`.
    pub fn pause(&mut self, caller: &AccountId) -> Result<(), StakingError> {
        self.ensure_owner(caller, "pause")?;
        self.state.paused = true;
        tracing::info!("Engine paused by {}", caller);
        Ok(())
    }

    pub fn unpause(&mut self, caller: &AccountId) -> Result<(), StakingError> {
        self.ensure_owner(caller, "unpause")?;
        self.state.paused = false;
        tracing::info!("Engine unpaused by {}", caller);
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Helpers
    // -----------------------------------------------------------------------

    pub(crate) fn ensure_owner(&self, caller: &AccountId, operation: &str) -> Result<(), StakingError> {
        if *caller != self.state.owner {
            tracing::warn!("Rejected {} by non-owner {}", operation, caller);
            return Err(StakingError::Unauthorized(format!(
                "{} requires the engine owner, {} is not",
                operation, caller
            )));
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), StakingError> {
        if self.state.paused {
            return Err(StakingError::EnginePaused);
        }
        if self.state.phase != EnginePhase::Active {
            return Err(StakingError::InvalidPhase(format!(
                "engine is {}, activate it before public use",
                self.state.phase
            )));
        }
        Ok(())
    }

    pub(crate) fn account(&self, owner: &AccountId) -> UserAccount {
        self.state.accounts.get(owner).cloned().unwrap_or_default()
    }

    pub(crate) fn store_account(&mut self, owner: &AccountId, account: UserAccount) {
        if account.is_empty() {
            self.state.accounts.remove(owner);
        } else {
            self.state.accounts.insert(owner.clone(), account);
        }
    }

    /// Transfer every item, undoing the ones already moved if any fails.
    pub(crate) fn move_items(
        &mut self,
        from: &AccountId,
        to: &AccountId,
        items: &[ItemId],
    ) -> Result<(), StakingError> {
        for (done, &item) in items.iter().enumerate() {
            if let Err(e) = self.custody.transfer(from, to, item) {
                for &moved in items[..done].iter().rev() {
                    if let Err(undo) = self.custody.transfer(to, from, moved) {
                        tracing::error!("Failed to return item {} to {}: {}", moved, from, undo);
                    }
                }
                return Err(e);
            }
        }
        Ok(())
    }
}
