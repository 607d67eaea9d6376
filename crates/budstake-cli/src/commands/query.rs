// crates/budstake-cli/src/commands/query.rs
//
// `budstake {info, status, schedule}`: read-only views. Nothing is saved.

use clap::Args;
use serde::Serialize;
use tabled::Tabled;

use budstake_core::{AccountId, Clock, ItemId, StakeRecord, Timestamp, Wei};
use budstake_economics::{EnginePhase, GlobalState, PeriodInfo};

use super::Context;
use crate::output::{format_duration, format_seed, format_table, format_timestamp};

/// Arguments for `budstake info`.
#[derive(Debug, Args)]
pub struct InfoCmd {
    /// Account to inspect.
    pub account: String,
}

#[derive(Serialize)]
struct InfoView {
    account: AccountId,
    items: Vec<StakeRecord>,
    pending_reward_wei: Wei,
}

/// A row in the stake info table.
#[derive(Tabled)]
struct StakeRow {
    #[tabled(rename = "Item")]
    item: ItemId,
    #[tabled(rename = "Staked At")]
    staked_at: String,
}

#[derive(Serialize)]
struct StatusView {
    phase: EnginePhase,
    paused: bool,
    owner: AccountId,
    engine_account: AccountId,
    accrual_interval_secs: u64,
    staked_items: u64,
    reward_pool_balance_wei: Wei,
    now: Timestamp,
    state: GlobalState,
}

/// A row in the key/value status table.
#[derive(Tabled)]
struct FieldRow {
    #[tabled(rename = "Field")]
    field: &'static str,
    #[tabled(rename = "Value")]
    value: String,
}

/// A row in the emission schedule table.
#[derive(Tabled)]
struct PeriodRow {
    #[tabled(rename = "Period")]
    period: usize,
    #[tabled(rename = "From")]
    from: String,
    #[tabled(rename = "To")]
    to: String,
    #[tabled(rename = "Allotment")]
    allotment: String,
    #[tabled(rename = "Per Day")]
    daily_rate: String,
}

pub fn info(ctx: &Context, cmd: &InfoCmd) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.open()?;
    let account = AccountId::new(cmd.account.as_str());
    let info = engine.user_stake_info(&account)?;
    let view = InfoView {
        items: engine.user_stake_records(&account),
        account,
        pending_reward_wei: info.pending_reward,
    };

    ctx.emit(&view, |v| {
        println!("Stake info for {}", v.account);
        println!("  Pending reward: {}", format_seed(v.pending_reward_wei));
        println!();
        if v.items.is_empty() {
            println!("No items staked.");
        } else {
            let rows: Vec<StakeRow> = v
                .items
                .iter()
                .map(|r| StakeRow {
                    item: r.item_id,
                    staked_at: format_timestamp(r.staked_at),
                })
                .collect();
            println!("{}", format_table(&rows));
        }
    });
    Ok(())
}

pub fn status(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.open()?;
    let view = StatusView {
        phase: engine.phase(),
        paused: engine.is_paused(),
        owner: engine.owner().clone(),
        engine_account: engine.engine_account().clone(),
        accrual_interval_secs: engine.state().rewards.accrual_interval(),
        staked_items: engine.staked_token_amount(),
        reward_pool_balance_wei: engine.reward_pool_balance(),
        now: engine.clock().now(),
        state: engine.global_state()?,
    };

    ctx.emit(&view, |v| {
        let s = &v.state;
        let rows = vec![
            field("Phase", v.phase.to_string()),
            field("Paused", v.paused.to_string()),
            field("Owner", v.owner.to_string()),
            field("Engine account", v.engine_account.to_string()),
            field("Now", format_timestamp(v.now)),
            field("Schedule start", format_timestamp(s.schedule_start)),
            field("Accrual interval", format_duration(v.accrual_interval_secs)),
            field("Staked items", v.staked_items.to_string()),
            field("Eligible units", s.eligible_units.to_string()),
            field("Emitted", format_seed(s.total_emitted)),
            field("Forfeited", format_seed(s.total_forfeited)),
            field("Claimed", format_seed(s.total_claimed)),
            field("Not yet emitted", format_seed(s.reward_pool_remaining)),
            field("Pool balance", format_seed(v.reward_pool_balance_wei)),
            field("Accumulator", s.accumulator_value.to_string()),
        ];
        println!("{}", format_table(&rows));
    });
    Ok(())
}

pub fn schedule(ctx: &Context) -> Result<(), Box<dyn std::error::Error>> {
    let engine = ctx.open()?;
    let rewards = &engine.state().rewards;
    let start = rewards.state().schedule_start;
    let periods: Vec<PeriodInfo> = rewards.schedule().period_table();

    ctx.emit(&periods, |periods| {
        let rows: Vec<PeriodRow> = periods
            .iter()
            .map(|p| PeriodRow {
                period: p.index + 1,
                from: format_timestamp(start + p.start_offset),
                to: format_timestamp(start + p.end_offset),
                allotment: format_seed(p.allotment),
                daily_rate: format_seed(p.daily_rate),
            })
            .collect();
        println!("{}", format_table(&rows));
        println!("Total pool: {}", format_seed(rewards.schedule().total_pool()));
    });
    Ok(())
}

fn field(field: &'static str, value: String) -> FieldRow {
    FieldRow { field, value }
}
