// crates/budstake-cli/src/commands/items.rs
//
// `budstake mint-item` / `budstake approve`: manage the simulated item
// collection the engine takes custody from.

use clap::Args;

use budstake_core::AccountId;

use super::Context;

/// Arguments for `budstake mint-item`.
#[derive(Debug, Args)]
pub struct MintItemCmd {
    /// Recipient account.
    #[arg(long)]
    pub to: String,

    /// Item ids to create.
    #[arg(required = true)]
    pub items: Vec<u64>,
}

/// Arguments for `budstake approve`.
#[derive(Debug, Args)]
pub struct ApproveCmd {
    /// Item owner granting (or revoking) the approval.
    #[arg(long)]
    pub owner: String,

    /// Revoke instead of grant.
    #[arg(long)]
    pub revoke: bool,
}

pub fn mint(ctx: &Context, cmd: &MintItemCmd) -> Result<(), Box<dyn std::error::Error>> {
    let to = AccountId::new(cmd.to.as_str());
    ctx.mutate(|engine| {
        for &item in &cmd.items {
            engine.custody_mut().mint(&to, item)?;
        }
        Ok(())
    })?;
    println!("Minted {:?} to {}", cmd.items, to);
    Ok(())
}

pub fn approve(ctx: &Context, cmd: &ApproveCmd) -> Result<(), Box<dyn std::error::Error>> {
    let owner = AccountId::new(cmd.owner.as_str());
    let operator = ctx.mutate(|engine| {
        let operator = engine.engine_account().clone();
        engine
            .custody_mut()
            .set_approval_for_all(&owner, &operator, !cmd.revoke);
        Ok(operator)
    })?;
    if cmd.revoke {
        println!("{} revoked approval for {}", owner, operator);
    } else {
        println!("{} approved {} to move all of its items", owner, operator);
    }
    Ok(())
}
