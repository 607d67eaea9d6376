// crates/budstake-cli/src/commands/init.rs
//
// `budstake init`: create a fresh state file: an engine, the reward pool
// minted to the engine account, and an empty item vault.

use std::path::Path;

use clap::Args;

use budstake_economics::{ItemVault, SeedLedger, StakingEngine, WEI_PER_SEED};

use super::Context;
use crate::output::{format_seed, format_timestamp};
use crate::store::{StoreError, World};

/// Arguments for `budstake init`.
#[derive(Debug, Args)]
pub struct InitCmd {
    /// Start in the migration phase (replay history before public use).
    #[arg(long)]
    pub migrating: bool,

    /// Overwrite an existing state file.
    #[arg(long)]
    pub force: bool,
}

/// Run the init command.
pub fn run(ctx: &Context, cmd: &InitCmd) -> Result<(), Box<dyn std::error::Error>> {
    let path = ctx.config.state_path();
    if Path::new(&path).exists() && !cmd.force {
        return Err(StoreError::AlreadyInitialized(path).into());
    }

    let engine_account = ctx.config.engine_account();
    let pool = u128::from(ctx.config.pool_funding_seed) * WEI_PER_SEED;
    let mut ledger = SeedLedger::new();
    ledger.mint(&engine_account, pool)?;

    let config = ctx.config.engine_config();
    let owner = ctx.config.owner();
    let engine = if cmd.migrating {
        StakingEngine::for_migration(&config, owner, engine_account, ctx.clock.clone(), ledger, ItemVault::new())?
    } else {
        StakingEngine::new(&config, owner, engine_account, ctx.clock.clone(), ledger, ItemVault::new())?
    };
    let phase = engine.phase();
    let start = engine.state().rewards.state().schedule_start;
    World::from_engine(engine).save(&path)?;

    println!("Initialized budstake state at {}", path);
    println!("  Phase:          {}", phase);
    println!("  Schedule start: {}", format_timestamp(start));
    println!("  Reward pool:    {}", format_seed(pool));
    println!("  Accrual:        every {}s", config.accrual_interval_secs);
    Ok(())
}
