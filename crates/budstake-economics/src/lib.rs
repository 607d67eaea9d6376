// crates/budstake-economics/src/lib.rs
//
// budstake-economics: SEED emission schedule, reward accumulator, stake
// registry, and the staking engine that ties them together.
//
// All monetary values are tracked in wei (the smallest unit of SEED).
// 1 SEED = 1,000,000,000,000,000,000 wei (10^18).

pub mod custody;
pub mod emission;
pub mod engine;
pub mod ledger;
pub mod migration;
pub mod rewards;
pub mod staking;
pub mod token;

// Re-export key types for ergonomic access from downstream crates.
pub use custody::ItemVault;
pub use emission::{
    EmissionSchedule, PeriodInfo, ScheduleConfig, DEFAULT_ALLOTMENTS_SEED,
    DEFAULT_PERIOD_LENGTH_SECS,
};
pub use engine::{
    EngineConfig, EnginePhase, EngineState, StakeInfo, StakingEngine, DAILY_ACCRUAL_SECS,
};
pub use ledger::SeedLedger;
pub use migration::{
    parse_snapshot, plan_batches, MigrationReport, SnapshotEntry, DEFAULT_MIGRATION_BATCH,
};
pub use rewards::{Cohort, GlobalState, RewardAccumulator, UserAccount, ACC_PRECISION};
pub use staking::StakeRegistry;
pub use token::{Seed, SEED_DECIMALS, WEI_PER_SEED};
