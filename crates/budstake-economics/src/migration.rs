// crates/budstake-economics/src/migration.rs
//
// Migration phase: rebuild a running deployment's stake positions in a fresh
// engine before it opens to the public.
//
// Flow (owner only, engine in the Migrating phase):
//   1. set_start_time   align epoch zero with the previous deployment
//   2. replay           add_staked_tokens in chronological batches
//   3. adopt_custody    move the staked items from the old engine account
//   4. activate         verify custody, open for public use
//
// Replayed records go through the same accumulator path as live stakes, each
// at max(staked_at, schedule start), so a migrated position accrues exactly
// what it would have accrued had it been staked live at that time.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use budstake_core::{AccountId, Clock, ItemCustody, ItemId, RewardLedger, StakeRecord, StakingError, Timestamp};

use crate::engine::{EnginePhase, StakingEngine};

/// Records per `add_staked_tokens` call when replaying a snapshot.
pub const DEFAULT_MIGRATION_BATCH: usize = 30;

/// One entry of a migration snapshot file.
///
/// Field names follow the exported `migrateTokens.json` format. Numeric
/// fields accept plain numbers, decimal or `0x` strings, and serialised
/// BigNumber objects (`{"type":"BigNumber","hex":"0x56"}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntry {
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub token_id: ItemId,
    #[serde(deserialize_with = "deserialize_lenient_u64")]
    pub timestamp: Timestamp,
    pub owner: AccountId,
}

impl From<SnapshotEntry> for StakeRecord {
    fn from(entry: SnapshotEntry) -> Self {
        StakeRecord {
            item_id: entry.token_id,
            // Normalise hex addresses that bypassed AccountId::new
            owner: AccountId::new(entry.owner.as_str()),
            staked_at: entry.timestamp,
        }
    }
}

impl From<&StakeRecord> for SnapshotEntry {
    fn from(record: &StakeRecord) -> Self {
        SnapshotEntry {
            token_id: record.item_id,
            timestamp: record.staked_at,
            owner: record.owner.clone(),
        }
    }
}

fn deserialize_lenient_u64<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(u64),
        Text(String),
        BigNumber { hex: String },
    }

    let parsed = match Raw::deserialize(deserializer)? {
        Raw::Number(n) => return Ok(n),
        Raw::Text(s) => parse_numeric(&s),
        Raw::BigNumber { hex } => parse_numeric(&hex),
    };
    parsed.map_err(serde::de::Error::custom)
}

fn parse_numeric(s: &str) -> Result<u64, String> {
    let s = s.trim();
    let result = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16),
        None => s.parse(),
    };
    result.map_err(|e| format!("invalid number {:?}: {}", s, e))
}

/// Parse a snapshot file into stake records, in file order.
///
/// # Errors
/// Returns `StakingError::Serialization` for malformed JSON.
pub fn parse_snapshot(json: &str) -> Result<Vec<StakeRecord>, StakingError> {
    let entries: Vec<SnapshotEntry> = serde_json::from_str(json)?;
    Ok(entries.into_iter().map(StakeRecord::from).collect())
}

/// Sort records chronologically (ties by item id) and split them into
/// batches of at most `batch_size`.
pub fn plan_batches(mut records: Vec<StakeRecord>, batch_size: usize) -> Vec<Vec<StakeRecord>> {
    let batch_size = batch_size.max(1);
    records.sort_by_key(|r| (r.staked_at, r.item_id));
    records.chunks(batch_size).map(<[StakeRecord]>::to_vec).collect()
}

/// Summary of a completed [`StakingEngine::replay`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    pub batches: usize,
    pub records: usize,
    pub stakers: usize,
    pub first_staked_at: Option<Timestamp>,
    pub last_staked_at: Option<Timestamp>,
}

impl<C: Clock, L: RewardLedger, I: ItemCustody> StakingEngine<C, L, I> {
    /// Move epoch zero of the emission schedule to `start`.
    ///
    /// # Errors
    /// - `Unauthorized` for anyone but the owner.
    /// - `InvalidPhase` once the engine is active or anything was replayed.
    /// - `InvalidSchedule` if `start` is in the future.
    pub fn set_start_time(&mut self, caller: &AccountId, start: Timestamp) -> Result<(), StakingError> {
        self.ensure_owner(caller, "set_start_time")?;
        self.ensure_migrating("set_start_time")?;
        let now = self.clock.now();
        if start > now {
            return Err(StakingError::InvalidSchedule(format!(
                "start time {} is after the current time {}",
                start, now
            )));
        }
        self.state.rewards.set_schedule_start(start)?;
        tracing::info!("Schedule start set to {} by {}", start, caller);
        Ok(())
    }

    /// Replay one batch of historical stake records.
    ///
    /// The batch is applied in chronological order. Items are not moved:
    /// custody is handed over separately with
    /// [`adopt_custody`](Self::adopt_custody). The whole batch is rejected if
    /// any record is invalid.
    ///
    /// # Errors
    /// - `Unauthorized` / `InvalidPhase` as for `set_start_time`.
    /// - `InvalidStakeState` for an empty batch, a duplicate or already staked
    ///   item, a record in the future, or a record older than history that
    ///   has already been replayed.
    pub fn add_staked_tokens(&mut self, caller: &AccountId, records: &[StakeRecord]) -> Result<(), StakingError> {
        self.ensure_owner(caller, "add_staked_tokens")?;
        self.ensure_migrating("add_staked_tokens")?;
        let ids: Vec<ItemId> = records.iter().map(|r| r.item_id).collect();
        self.state.registry.check_stake(&ids)?;

        let now = self.clock.now();
        let schedule_start = self.state.rewards.state().schedule_start;
        let replayed_to = self.state.rewards.state().last_synced_at;
        let mut ordered: Vec<&StakeRecord> = records.iter().collect();
        ordered.sort_by_key(|r| (r.staked_at, r.item_id));

        for record in &ordered {
            if record.staked_at > now {
                return Err(StakingError::InvalidStakeState(format!(
                    "item {} has a stake time {} in the future",
                    record.item_id, record.staked_at
                )));
            }
            let effective = record.staked_at.max(schedule_start);
            if effective < replayed_to {
                return Err(StakingError::InvalidStakeState(format!(
                    "item {} staked at {} precedes history already replayed up to {}",
                    record.item_id, record.staked_at, replayed_to
                )));
            }
        }

        let mut rewards = self.state.rewards.clone();
        let mut touched = std::collections::BTreeMap::new();
        for record in &ordered {
            let account = touched
                .entry(record.owner.clone())
                .or_insert_with(|| self.account(&record.owner));
            rewards.stake_units(account, 1, record.staked_at.max(schedule_start))?;
        }

        for record in &ordered {
            self.state
                .registry
                .insert(&record.owner, &[record.item_id], record.staked_at)?;
        }
        self.state.rewards = rewards;
        for (owner, account) in touched {
            self.store_account(&owner, account);
        }

        tracing::info!(
            "Replayed {} stake records (total staked {})",
            records.len(),
            self.state.registry.total_staked()
        );
        Ok(())
    }

    /// Replay a whole snapshot in chronological batches of `batch_size`.
    ///
    /// Each batch is atomic; if one fails, the batches before it stay
    /// applied and the error is returned.
    pub fn replay(
        &mut self,
        caller: &AccountId,
        records: Vec<StakeRecord>,
        batch_size: usize,
    ) -> Result<MigrationReport, StakingError> {
        let stakers: BTreeSet<AccountId> = records.iter().map(|r| r.owner.clone()).collect();
        let mut report = MigrationReport {
            stakers: stakers.len(),
            ..MigrationReport::default()
        };

        for (index, batch) in plan_batches(records, batch_size).into_iter().enumerate() {
            tracing::debug!("Replaying batch {} ({} records)", index, batch.len());
            self.add_staked_tokens(caller, &batch)?;
            report.batches += 1;
            report.records += batch.len();
            if report.first_staked_at.is_none() {
                report.first_staked_at = batch.first().map(|r| r.staked_at);
            }
            report.last_staked_at = batch.last().map(|r| r.staked_at);
        }

        tracing::info!(
            "Migration replay complete: {} records for {} stakers in {} batches",
            report.records,
            report.stakers,
            report.batches
        );
        Ok(report)
    }

    /// Transfer every replayed item not yet held by the engine from
    /// `previous_holder` (typically the old engine account) into custody.
    /// Returns the number of items moved.
    ///
    /// # Errors
    /// Returns `Custody` if an item is not held by `previous_holder`; items
    /// already moved by this call are returned.
    pub fn adopt_custody(&mut self, caller: &AccountId, previous_holder: &AccountId) -> Result<usize, StakingError> {
        self.ensure_owner(caller, "adopt_custody")?;
        self.ensure_migrating("adopt_custody")?;
        let engine_account = self.state.engine_account.clone();
        let items: Vec<ItemId> = self
            .state
            .registry
            .records()
            .filter(|r| self.custody.owner_of(r.item_id).as_ref() != Some(&engine_account))
            .map(|r| r.item_id)
            .collect();
        if items.is_empty() {
            return Ok(0);
        }

        self.move_items(previous_holder, &engine_account, &items)?;
        tracing::info!("Moved {} items from {} into custody", items.len(), previous_holder);
        Ok(items.len())
    }

    /// Leave the Migrating phase and open the engine for public use.
    ///
    /// # Errors
    /// Returns `InvalidStakeState` if any replayed item is not held by the
    /// engine account.
    pub fn activate(&mut self, caller: &AccountId) -> Result<(), StakingError> {
        self.ensure_owner(caller, "activate")?;
        self.ensure_migrating("activate")?;
        let engine_account = &self.state.engine_account;
        if let Some(record) = self
            .state
            .registry
            .records()
            .find(|r| self.custody.owner_of(r.item_id).as_ref() != Some(engine_account))
        {
            return Err(StakingError::InvalidStakeState(format!(
                "item {} of {} is not held by the engine account {}",
                record.item_id, record.owner, engine_account
            )));
        }

        self.state.phase = EnginePhase::Active;
        tracing::info!(
            "Engine activated by {} with {} staked items",
            caller,
            self.state.registry.total_staked()
        );
        Ok(())
    }

    /// Every live record in snapshot form, chronological.
    pub fn export_snapshot(&self) -> Vec<SnapshotEntry> {
        let mut entries: Vec<SnapshotEntry> = self.state.registry.records().map(SnapshotEntry::from).collect();
        entries.sort_by_key(|e| (e.timestamp, e.token_id));
        entries
    }

    fn ensure_migrating(&self, operation: &str) -> Result<(), StakingError> {
        if self.state.phase != EnginePhase::Migrating {
            return Err(StakingError::InvalidPhase(format!(
                "{} is only allowed while migrating, engine is {}",
                operation, self.state.phase
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::ItemVault;
    use crate::engine::EngineConfig;
    use crate::ledger::SeedLedger;
    use budstake_core::{ManualClock, SECONDS_PER_DAY};
    use std::sync::Arc;

    const NOW: u64 = 1_700_000_000;
    const DAY: u64 = SECONDS_PER_DAY;

    fn deployer() -> AccountId {
        AccountId::new("deployer")
    }

    fn old_engine() -> AccountId {
        AccountId::new("old-staking")
    }

    fn new_engine() -> AccountId {
        AccountId::new("new-staking")
    }

    fn record(item_id: ItemId, owner: &str, staked_at: Timestamp) -> StakeRecord {
        StakeRecord {
            item_id,
            owner: AccountId::new(owner),
            staked_at,
        }
    }

    fn migrating_engine() -> StakingEngine<Arc<ManualClock>, SeedLedger, ItemVault> {
        let clock = Arc::new(ManualClock::new(NOW));
        let mut vault = ItemVault::new();
        for item in 1..=5 {
            vault.mint(&old_engine(), item).unwrap();
        }
        StakingEngine::for_migration(
            &EngineConfig::default(),
            deployer(),
            new_engine(),
            clock,
            SeedLedger::new(),
            vault,
        )
        .unwrap()
    }

    #[test]
    fn test_parse_snapshot_accepts_bignumber_objects() {
        let json = r#"[
            {"tokenId": {"type": "BigNumber", "hex": "0x56"}, "timestamp": {"type": "BigNumber", "hex": "0x6380a4e0"}, "owner": "0xDF29B31798a447956E6fcef6CD9428c4ae9caF39"},
            {"tokenId": 87, "timestamp": "1669377248", "owner": "0xabc"}
        ]"#;
        let records = parse_snapshot(json).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].item_id, 86);
        assert_eq!(records[0].staked_at, 0x6380a4e0);
        assert_eq!(records[0].owner.as_str(), "0xdf29b31798a447956e6fcef6cd9428c4ae9caf39");
        assert_eq!(records[1].staked_at, 1_669_377_248);
    }

    #[test]
    fn test_parse_snapshot_rejects_garbage() {
        let result = parse_snapshot(r#"[{"tokenId": "x1", "timestamp": 1, "owner": "a"}]"#);
        assert!(matches!(result, Err(StakingError::Serialization(_))));
    }

    #[test]
    fn test_plan_batches_sorts_and_chunks() {
        let records: Vec<StakeRecord> = (0..65).rev().map(|i| record(i, "a", 1_000 + i)).collect();
        let batches = plan_batches(records, DEFAULT_MIGRATION_BATCH);
        assert_eq!(batches.iter().map(Vec::len).collect::<Vec<_>>(), vec![30, 30, 5]);
        assert_eq!(batches[0][0].item_id, 0);
        assert_eq!(batches[2][4].item_id, 64);
    }

    #[test]
    fn test_full_migration_flow() {
        let mut engine = migrating_engine();
        engine.set_start_time(&deployer(), NOW - 10 * DAY).unwrap();

        let records = vec![
            record(1, "alice", NOW - 9 * DAY),
            record(2, "bob", NOW - 5 * DAY),
            record(3, "alice", NOW - 2 * DAY),
        ];
        let report = engine.replay(&deployer(), records, 2).unwrap();
        assert_eq!(report.batches, 2);
        assert_eq!(report.records, 3);
        assert_eq!(report.stakers, 2);
        assert_eq!(report.first_staked_at, Some(NOW - 9 * DAY));

        // Not yet in custody
        assert!(matches!(
            engine.activate(&deployer()),
            Err(StakingError::InvalidStakeState(_))
        ));
        assert_eq!(engine.adopt_custody(&deployer(), &old_engine()).unwrap(), 3);
        engine.activate(&deployer()).unwrap();

        assert_eq!(engine.phase(), EnginePhase::Active);
        assert_eq!(engine.staked_token_amount(), 3);
        assert_eq!(engine.user_stake_info(&AccountId::new("alice")).unwrap().item_ids, vec![1, 3]);
        assert!(engine.user_stake_info(&AccountId::new("bob")).unwrap().pending_reward > 0);
    }

    #[test]
    fn test_public_operations_rejected_while_migrating() {
        let mut engine = migrating_engine();
        assert!(matches!(
            engine.claim_rewards(&deployer()),
            Err(StakingError::InvalidPhase(_))
        ));
    }

    #[test]
    fn test_migration_operations_require_owner() {
        let mut engine = migrating_engine();
        let stranger = AccountId::new("mallory");
        assert!(matches!(
            engine.set_start_time(&stranger, NOW),
            Err(StakingError::Unauthorized(_))
        ));
        assert!(matches!(
            engine.add_staked_tokens(&stranger, &[record(1, "alice", NOW)]),
            Err(StakingError::Unauthorized(_))
        ));
        assert!(matches!(engine.activate(&stranger), Err(StakingError::Unauthorized(_))));
    }

    #[test]
    fn test_out_of_order_batch_rejected_without_mutation() {
        let mut engine = migrating_engine();
        engine.set_start_time(&deployer(), NOW - 10 * DAY).unwrap();
        engine
            .add_staked_tokens(&deployer(), &[record(1, "alice", NOW - 3 * DAY)])
            .unwrap();

        let result = engine.add_staked_tokens(
            &deployer(),
            &[record(2, "bob", NOW - 2 * DAY), record(3, "bob", NOW - 4 * DAY)],
        );
        assert!(matches!(result, Err(StakingError::InvalidStakeState(_))));
        assert_eq!(engine.staked_token_amount(), 1);
        assert!(engine.user_stake_records(&AccountId::new("bob")).is_empty());
    }

    #[test]
    fn test_future_record_rejected() {
        let mut engine = migrating_engine();
        let result = engine.add_staked_tokens(&deployer(), &[record(1, "alice", NOW + 1)]);
        assert!(matches!(result, Err(StakingError::InvalidStakeState(_))));
    }

    #[test]
    fn test_start_time_in_future_rejected() {
        let mut engine = migrating_engine();
        assert!(matches!(
            engine.set_start_time(&deployer(), NOW + 1),
            Err(StakingError::InvalidSchedule(_))
        ));
    }

    #[test]
    fn test_start_time_locked_after_replay() {
        let mut engine = migrating_engine();
        engine.set_start_time(&deployer(), NOW - DAY).unwrap();
        engine
            .add_staked_tokens(&deployer(), &[record(1, "alice", NOW - DAY)])
            .unwrap();
        assert!(engine.set_start_time(&deployer(), NOW - 2 * DAY).is_err());
    }

    #[test]
    fn test_migration_operations_rejected_once_active() {
        let mut engine = migrating_engine();
        engine.activate(&deployer()).unwrap();
        assert!(matches!(
            engine.add_staked_tokens(&deployer(), &[record(1, "alice", NOW)]),
            Err(StakingError::InvalidPhase(_))
        ));
    }

    #[test]
    fn test_records_before_start_count_from_start() {
        let mut engine = migrating_engine();
        engine.set_start_time(&deployer(), NOW - DAY).unwrap();
        engine
            .add_staked_tokens(&deployer(), &[record(1, "alice", NOW - 30 * DAY)])
            .unwrap();
        engine.adopt_custody(&deployer(), &old_engine()).unwrap();
        engine.activate(&deployer()).unwrap();

        let pending = engine.user_stake_info(&AccountId::new("alice")).unwrap().pending_reward;
        assert_eq!(pending, 1_000_000 * crate::token::WEI_PER_SEED / 180);
    }

    #[test]
    fn test_export_snapshot_is_chronological() {
        let mut engine = migrating_engine();
        engine.set_start_time(&deployer(), NOW - 10 * DAY).unwrap();
        engine
            .add_staked_tokens(
                &deployer(),
                &[record(4, "bob", NOW - 2 * DAY), record(2, "alice", NOW - 5 * DAY)],
            )
            .unwrap();

        let exported = engine.export_snapshot();
        assert_eq!(exported.iter().map(|e| e.token_id).collect::<Vec<_>>(), vec![2, 4]);
        let json = serde_json::to_string(&exported).unwrap();
        assert!(json.contains("\"tokenId\":2"));
        assert_eq!(parse_snapshot(&json).unwrap()[1].owner, AccountId::new("bob"));
    }
}
