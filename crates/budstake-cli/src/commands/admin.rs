// crates/budstake-cli/src/commands/admin.rs
//
// `budstake {pause, unpause}`: owner-only circuit breaker.

use clap::Args;

use budstake_core::AccountId;

use super::Context;

/// Arguments shared by owner-only commands.
#[derive(Debug, Args)]
pub struct OwnerCmd {
    /// Acting account (defaults to the configured owner).
    #[arg(long)]
    pub from: Option<String>,
}

impl OwnerCmd {
    pub fn caller(&self, ctx: &Context) -> AccountId {
        self.from
            .as_deref()
            .map(AccountId::new)
            .unwrap_or_else(|| ctx.config.owner())
    }
}

pub fn pause(ctx: &Context, cmd: &OwnerCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = cmd.caller(ctx);
    ctx.mutate(|engine| Ok(engine.pause(&caller)?))?;
    println!("Engine paused. Stake, unstake, and claim are rejected until unpaused.");
    Ok(())
}

pub fn unpause(ctx: &Context, cmd: &OwnerCmd) -> Result<(), Box<dyn std::error::Error>> {
    let caller = cmd.caller(ctx);
    ctx.mutate(|engine| Ok(engine.unpause(&caller)?))?;
    println!("Engine unpaused.");
    Ok(())
}
