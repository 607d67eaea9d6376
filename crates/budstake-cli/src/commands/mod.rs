// crates/budstake-cli/src/commands/mod.rs
//
// Command module declarations for the budstake CLI, plus the shared
// load-run-save context every command goes through.

pub mod admin;
pub mod init;
pub mod items;
pub mod migrate;
pub mod query;
pub mod staking;

use std::sync::Arc;

use budstake_core::Clock;
use budstake_economics::{ItemVault, SeedLedger, StakingEngine};

use crate::config::CliConfig;
use crate::output::OutputFormat;
use crate::store::World;

/// Engine as the CLI runs it: any clock, in-memory ledgers.
pub type CliEngine = StakingEngine<Arc<dyn Clock>, SeedLedger, ItemVault>;

/// Per-invocation settings shared by all commands.
pub struct Context {
    pub config: CliConfig,
    pub format: OutputFormat,
    pub clock: Arc<dyn Clock>,
}

impl Context {
    /// Load the persisted world as a live engine.
    pub fn open(&self) -> Result<CliEngine, Box<dyn std::error::Error>> {
        let world = World::load(&self.config.state_path())?;
        Ok(world.into_engine(self.clock.clone()))
    }

    /// Persist the engine after a successful operation.
    pub fn commit(&self, engine: CliEngine) -> Result<(), Box<dyn std::error::Error>> {
        World::from_engine(engine).save(&self.config.state_path())?;
        Ok(())
    }

    /// Open, apply `op`, and save only if `op` succeeded.
    pub fn mutate<T>(
        &self,
        op: impl FnOnce(&mut CliEngine) -> Result<T, Box<dyn std::error::Error>>,
    ) -> Result<T, Box<dyn std::error::Error>> {
        let mut engine = self.open()?;
        let result = op(&mut engine)?;
        self.commit(engine)?;
        Ok(result)
    }

    /// Print `value` as JSON, or run `table` to print it for humans.
    pub fn emit<T: serde::Serialize>(&self, value: &T, table: impl FnOnce(&T)) {
        match self.format {
            OutputFormat::Json => println!("{}", crate::output::format_json(value)),
            OutputFormat::Table => table(value),
        }
    }
}
