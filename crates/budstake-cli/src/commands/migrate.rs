// crates/budstake-cli/src/commands/migrate.rs
//
// `budstake {migrate, activate, export}`: move stake positions from a
// previous deployment into an engine created with `init --migrating`.
//
// Typical flow:
//   budstake export --out migrateTokens.json        (against the old state)
//   budstake init --migrating
//   budstake migrate migrateTokens.json --start-time <old start> \
//       --previous-holder <old engine account>
//   budstake activate

use std::fs;

use clap::Args;

use budstake_core::{AccountId, ItemCustody};
use budstake_economics::{parse_snapshot, MigrationReport, DEFAULT_MIGRATION_BATCH};

use super::admin::OwnerCmd;
use super::Context;
use crate::output::{format_json, format_timestamp};

/// Arguments for `budstake migrate`.
#[derive(Debug, Args)]
pub struct MigrateCmd {
    /// Snapshot file: JSON array of {tokenId, timestamp, owner}.
    pub snapshot: String,

    /// Align the schedule start with the previous deployment (unix seconds).
    #[arg(long)]
    pub start_time: Option<u64>,

    /// Account currently holding the staked items; they are moved into
    /// engine custody after the replay.
    #[arg(long)]
    pub previous_holder: Option<String>,

    /// Create snapshot items missing from the vault, owned by the previous
    /// holder (for rebuilding a world from a snapshot alone).
    #[arg(long, requires = "previous_holder")]
    pub mint_missing: bool,

    /// Records per replay batch.
    #[arg(long, default_value_t = DEFAULT_MIGRATION_BATCH)]
    pub batch_size: usize,

    #[command(flatten)]
    pub owner: OwnerCmd,
}

/// Arguments for `budstake export`.
#[derive(Debug, Args)]
pub struct ExportCmd {
    /// Write the snapshot here instead of stdout.
    #[arg(long)]
    pub out: Option<String>,
}

pub fn migrate(ctx: &Context, cmd: &MigrateCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = cmd.owner.caller(ctx);
    let records = parse_snapshot(&fs::read_to_string(&cmd.snapshot)?)?;
    tracing::info!("Loaded {} records from {}", records.len(), cmd.snapshot);
    let holder = cmd.previous_holder.as_deref().map(AccountId::new);

    let (report, adopted) = ctx.mutate(|engine| {
        if let Some(start) = cmd.start_time {
            engine.set_start_time(&caller, start)?;
        }
        if cmd.mint_missing {
            if let Some(holder) = &holder {
                for record in &records {
                    if engine.custody().owner_of(record.item_id).is_none() {
                        engine.custody_mut().mint(holder, record.item_id)?;
                    }
                }
            }
        }
        let report: MigrationReport = engine.replay(&caller, records, cmd.batch_size)?;
        let adopted = match &holder {
            Some(holder) => engine.adopt_custody(&caller, holder)?,
            None => 0,
        };
        Ok((report, adopted))
    })?;

    ctx.emit(&report, |r| {
        println!("Replayed {} records for {} stakers in {} batches", r.records, r.stakers, r.batches);
        if let (Some(first), Some(last)) = (r.first_staked_at, r.last_staked_at) {
            println!("  Stake times: {} .. {}", format_timestamp(first), format_timestamp(last));
        }
        println!("  Items moved into custody: {}", adopted);
        println!("Run `budstake activate` once every staked item is in custody.");
    });
    Ok(())
}

pub fn activate(ctx: &Context, cmd: &OwnerCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = cmd.caller(ctx);
    let staked = ctx.mutate(|engine| {
        engine.activate(&caller)?;
        Ok(engine.staked_token_amount())
    })?;
    println!("Engine active with {} staked items.", staked);
    Ok(())
}

pub fn export(ctx: &Context, cmd: &ExportCmd) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.open()?;
    let snapshot = engine.export_snapshot();
    let json = format_json(&snapshot);
    match &cmd.out {
        Some(path) => {
            fs::write(path, json)?;
            println!("Exported {} stake records to {}", snapshot.len(), path);
        }
        None => println!("{}", json),
    }
    Ok(())
}
