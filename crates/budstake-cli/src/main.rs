// crates/budstake-cli/src/main.rs
//
// CLI entrypoint for the budstake operator tools.
//
// Every command loads the JSON state file named in the configuration, runs
// one engine operation, and writes the state back only if it succeeded.

mod commands;
mod config;
mod output;
mod store;

use std::sync::Arc;

use clap::{Parser, Subcommand};

use budstake_core::{Clock, ManualClock, SystemClock};
use commands::admin::OwnerCmd;
use commands::init::InitCmd;
use commands::items::{ApproveCmd, MintItemCmd};
use commands::migrate::{ExportCmd, MigrateCmd};
use commands::query::InfoCmd;
use commands::staking::{ClaimCmd, ItemsCmd};
use commands::Context;
use config::CliConfig;
use output::OutputFormat;

/// budstake: NFT staking with a decaying SEED emission schedule.
#[derive(Parser, Debug)]
#[command(
    name = "budstake",
    version = "0.1.0",
    about = "Operator CLI for the budstake staking engine"
)]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(long, global = true, default_value = "~/.budstake/config.toml")]
    config: String,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Table)]
    format: OutputFormat,

    /// Act as if the current time were this unix timestamp.
    #[arg(long, global = true)]
    now: Option<u64>,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
enum Commands {
    /// Create a new state file with a funded reward pool.
    Init(InitCmd),

    /// Create items in the simulated collection.
    MintItem(MintItemCmd),

    /// Approve (or revoke) the engine to move an owner's items.
    Approve(ApproveCmd),

    /// Stake items.
    Stake(ItemsCmd),

    /// Withdraw staked items. Rewards stay claimable.
    Unstake(ItemsCmd),

    /// Claim all earned SEED.
    Claim(ClaimCmd),

    /// Show an account's staked items and pending reward.
    Info(InfoCmd),

    /// Show engine-wide accounting state.
    Status,

    /// Show the emission schedule.
    Schedule,

    /// Reject stake, unstake, and claim until unpaused (owner only).
    Pause(OwnerCmd),

    /// Lift a pause (owner only).
    Unpause(OwnerCmd),

    /// Replay a stake snapshot into a migrating engine (owner only).
    Migrate(MigrateCmd),

    /// Open a migrated engine for public use (owner only).
    Activate(OwnerCmd),

    /// Write every live stake record as a migration snapshot.
    Export(ExportCmd),
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Configuration is loaded before tracing so its log level can apply;
    // the load outcome is logged once the subscriber is up.
    let loaded = CliConfig::load(&cli.config);
    let log_level = match &loaded {
        Ok(cfg) => cfg.log_level.clone(),
        Err(_) => CliConfig::default().log_level,
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = match loaded {
        Ok(cfg) => {
            tracing::debug!("Loaded configuration from {}", cli.config);
            cfg
        }
        Err(e) => {
            tracing::warn!("Could not load config from {}: {}. Using defaults.", cli.config, e);
            CliConfig::default()
        }
    };

    let clock: Arc<dyn Clock> = match cli.now {
        Some(ts) => Arc::new(ManualClock::new(ts)),
        None => Arc::new(SystemClock),
    };
    let ctx = Context {
        config,
        format: cli.format,
        clock,
    };

    let result = match &cli.command {
        Commands::Init(cmd) => commands::init::run(&ctx, cmd),
        Commands::MintItem(cmd) => commands::items::mint(&ctx, cmd),
        Commands::Approve(cmd) => commands::items::approve(&ctx, cmd),
        Commands::Stake(cmd) => commands::staking::stake(&ctx, cmd),
        Commands::Unstake(cmd) => commands::staking::unstake(&ctx, cmd),
        Commands::Claim(cmd) => commands::staking::claim(&ctx, cmd),
        Commands::Info(cmd) => commands::query::info(&ctx, cmd),
        Commands::Status => commands::query::status(&ctx),
        Commands::Schedule => commands::query::schedule(&ctx),
        Commands::Pause(cmd) => commands::admin::pause(&ctx, cmd),
        Commands::Unpause(cmd) => commands::admin::unpause(&ctx, cmd),
        Commands::Migrate(cmd) => commands::migrate::migrate(&ctx, cmd),
        Commands::Activate(cmd) => commands::migrate::activate(&ctx, cmd),
        Commands::Export(cmd) => commands::migrate::export(&ctx, cmd),
    };

    if let Err(e) = &result {
        tracing::error!("Command failed: {}", e);
    }
    result
}
