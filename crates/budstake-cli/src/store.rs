// crates/budstake-cli/src/store.rs
//
// JSON persistence of the operator's world: engine state, SEED ledger, and
// item vault. Every command loads the world, runs one engine operation, and
// saves it back only if the operation succeeded.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use budstake_core::Clock;
use budstake_economics::{EngineState, ItemVault, SeedLedger, StakingEngine};

/// Errors from loading or saving the world file.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("no state file at {0}; run `budstake init` first")]
    NotInitialized(String),

    #[error("state file {0} already exists; pass --force to overwrite")]
    AlreadyInitialized(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed state file {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Everything the CLI persists between invocations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct World {
    pub engine: EngineState,
    pub ledger: SeedLedger,
    pub vault: ItemVault,
}

impl World {
    pub fn from_engine<C: Clock>(engine: StakingEngine<C, SeedLedger, ItemVault>) -> Self {
        let (engine, ledger, vault) = engine.into_parts();
        Self { engine, ledger, vault }
    }

    pub fn into_engine<C: Clock>(self, clock: C) -> StakingEngine<C, SeedLedger, ItemVault> {
        StakingEngine::from_parts(self.engine, clock, self.ledger, self.vault)
    }

    /// Read the world from `path`.
    pub fn load(path: &str) -> Result<Self, StoreError> {
        if !Path::new(path).exists() {
            return Err(StoreError::NotInitialized(path.to_string()));
        }
        let contents = fs::read_to_string(path).map_err(|source| StoreError::Io {
            path: path.to_string(),
            source,
        })?;
        serde_json::from_str(&contents).map_err(|source| StoreError::Json {
            path: path.to_string(),
            source,
        })
    }

    /// Write the world to `path`, creating parent directories.
    ///
    /// Writes to a sibling temp file first and renames it over the target so
    /// an interrupted save never leaves a truncated state file.
    pub fn save(&self, path: &str) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: path.to_string(),
            source,
        };
        if let Some(parent) = Path::new(path).parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(io_err)?;
            }
        }
        let json = serde_json::to_string_pretty(self).map_err(|source| StoreError::Json {
            path: path.to_string(),
            source,
        })?;
        let tmp = format!("{}.tmp", path);
        fs::write(&tmp, json).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)?;
        tracing::debug!("Saved state to {}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use budstake_core::{AccountId, ManualClock};
    use budstake_economics::{EngineConfig, WEI_PER_SEED};
    use std::sync::Arc;
    use uuid::Uuid;

    fn temp_state_path(label: &str) -> String {
        let dir = std::env::temp_dir();
        let path = dir
            .join(format!("budstake_test_{}_{}", label, Uuid::now_v7()))
            .join("state.json");
        path.to_string_lossy().to_string()
    }

    fn sample_world(clock: Arc<ManualClock>) -> World {
        let staking = AccountId::new("staking");
        let alice = AccountId::new("alice");
        let mut ledger = SeedLedger::new();
        ledger.mint(&staking, 1_000 * WEI_PER_SEED).unwrap();
        let mut vault = ItemVault::new();
        vault.mint(&alice, 7).unwrap();
        vault.set_approval_for_all(&alice, &staking, true);
        let mut engine = StakingEngine::new(
            &EngineConfig::default(),
            AccountId::new("deployer"),
            staking,
            clock,
            ledger,
            vault,
        )
        .unwrap();
        engine.stake(&alice, &[7]).unwrap();
        World::from_engine(engine)
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let clock = Arc::new(ManualClock::new(1_000));
        let path = temp_state_path("roundtrip");
        sample_world(clock.clone()).save(&path).unwrap();

        clock.advance(60);
        let engine = World::load(&path).unwrap().into_engine(clock);
        let info = engine.user_stake_info(&AccountId::new("alice")).unwrap();
        assert_eq!(info.item_ids, vec![7]);
        assert!(info.pending_reward > 0);

        let _ = fs::remove_dir_all(Path::new(&path).parent().unwrap());
    }

    #[test]
    fn test_load_missing_file_is_not_initialized() {
        let path = temp_state_path("missing");
        assert!(matches!(World::load(&path), Err(StoreError::NotInitialized(_))));
    }

    #[test]
    fn test_load_garbage_is_json_error() {
        let path = temp_state_path("garbage");
        fs::create_dir_all(Path::new(&path).parent().unwrap()).unwrap();
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(World::load(&path), Err(StoreError::Json { .. })));

        let _ = fs::remove_dir_all(Path::new(&path).parent().unwrap());
    }
}
