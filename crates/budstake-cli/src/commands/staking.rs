// crates/budstake-cli/src/commands/staking.rs
//
// `budstake {stake, unstake, claim}`: the public staking operations.

use clap::Args;
use serde::Serialize;

use budstake_core::{AccountId, Wei};

use super::Context;
use crate::output::format_seed;

/// Arguments for `budstake stake` and `budstake unstake`.
#[derive(Debug, Args)]
pub struct ItemsCmd {
    /// Acting account.
    #[arg(long)]
    pub from: String,

    /// Item ids, applied as one batch.
    #[arg(required = true)]
    pub items: Vec<u64>,
}

/// Arguments for `budstake claim`.
#[derive(Debug, Args)]
pub struct ClaimCmd {
    /// Acting account.
    #[arg(long)]
    pub from: String,
}

#[derive(Serialize)]
struct ClaimReceipt {
    account: AccountId,
    paid_wei: Wei,
}

pub fn stake(ctx: &Context, cmd: &ItemsCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = AccountId::new(cmd.from.as_str());
    let total = ctx.mutate(|engine| {
        engine.stake(&caller, &cmd.items)?;
        Ok(engine.staked_token_amount())
    })?;
    println!("{} staked {:?} ({} items staked in total)", caller, cmd.items, total);
    Ok(())
}

pub fn unstake(ctx: &Context, cmd: &ItemsCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = AccountId::new(cmd.from.as_str());
    let pending = ctx.mutate(|engine| {
        engine.withdraw(&caller, &cmd.items)?;
        Ok(engine.user_stake_info(&caller)?.pending_reward)
    })?;
    println!("{} withdrew {:?}", caller, cmd.items);
    println!("  Unclaimed reward: {}", format_seed(pending));
    Ok(())
}

pub fn claim(ctx: &Context, cmd: &ClaimCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = AccountId::new(cmd.from.as_str());
    let paid = ctx.mutate(|engine| Ok(engine.claim_rewards(&caller)?))?;
    let receipt = ClaimReceipt {
        account: caller,
        paid_wei: paid,
    };
    ctx.emit(&receipt, |r| {
        println!("{} claimed {}", r.account, format_seed(r.paid_wei));
    });
    Ok(())
}
