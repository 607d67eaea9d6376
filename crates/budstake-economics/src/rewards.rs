// crates/budstake-economics/src/rewards.rs
//
// Reward accumulator: reward-per-staked-unit running total with per-user
// checkpoints ("accumulate per share, checkpoint per holder").
//
// Each user's earnings are computed lazily in O(1) from
//   units * (accumulator_value - checkpoint) / ACC_PRECISION
// so no operation ever iterates over other stakers.
//
// Accrual is quantised into intervals of `accrual_interval` seconds counted
// from the schedule start. A unit earns for an interval only if it was staked
// at or before the interval's start and is still staked at its end; the
// interval's emission is split equally among those units. With a 1 second
// interval every integer timestamp is a boundary and accrual is continuous.
// With a 1 day interval an item staked mid-day starts earning at the next
// midnight of the schedule and an item withdrawn mid-day loses that day.
//
// Units staked strictly inside the in-progress interval form a pending
// cohort. When that interval is folded the cohort becomes eligible and the
// accumulator value at that instant is kept in a reference-counted history
// entry, so each cohort member can settle against it later.
//
// Emission for an interval with no eligible units is forfeited: it is counted
// but never distributed.
//
// Rounding: each fold divides by the eligible count and carries the remainder
// into the next fold; each settlement floors to whole wei, so a user loses
// less than 1 wei per settlement. Paid + owed never exceeds emitted minus
// forfeited.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use budstake_core::{StakingError, Timestamp, Wei};

use crate::emission::EmissionSchedule;

/// Fixed-point scale of the accumulator value.
pub const ACC_PRECISION: u128 = 1_000_000_000_000;

/// Units staked during an interval that has not been folded yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cohort {
    /// Index of the interval the units were staked in.
    pub interval: u64,
    /// Units that become eligible once the interval is folded.
    pub units: u64,
    /// Accounts with queued units in this cohort.
    pub holders: u64,
}

/// Accumulator value recorded when a cohort was promoted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
struct Checkpoint {
    accumulator_value: u128,
    holders: u64,
}

/// Engine-wide accounting state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GlobalState {
    /// Live stake records (eligible + pending units).
    pub total_staked: u64,
    /// Units sharing the emission of the in-progress interval.
    pub eligible_units: u64,
    /// Cumulative reward per unit, scaled by [`ACC_PRECISION`]. Never decreases.
    pub accumulator_value: u128,
    pub last_synced_at: Timestamp,
    /// Epoch zero of the emission schedule.
    pub schedule_start: Timestamp,
    /// Accrual intervals already folded into the accumulator.
    pub synced_intervals: u64,
    /// Pool not yet emitted, in wei.
    pub reward_pool_remaining: Wei,
    pub total_emitted: Wei,
    pub total_forfeited: Wei,
    pub total_claimed: Wei,
    /// Scaled division remainder carried into the next fold.
    pub distribution_carry: u128,
    pub pending_cohort: Option<Cohort>,
}

/// Units of one account waiting for their interval to be folded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueuedUnits {
    pub interval: u64,
    pub units: u64,
}

/// Per-account reward state. Updated only when the account is settled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub eligible_units: u64,
    pub queued: Option<QueuedUnits>,
    /// Earned but not yet claimed, in wei.
    pub stored_reward: Wei,
    /// Accumulator value at the last settlement.
    pub checkpoint: u128,
}

impl UserAccount {
    /// Units staked by this account, eligible or not.
    pub fn staked_units(&self) -> u64 {
        self.eligible_units + self.queued.map_or(0, |q| q.units)
    }

    /// True when the account holds nothing worth keeping.
    pub fn is_empty(&self) -> bool {
        self.staked_units() == 0 && self.stored_reward == 0
    }
}

/// Global accumulator plus the emission schedule that feeds it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RewardAccumulator {
    schedule: EmissionSchedule,
    accrual_interval: u64,
    state: GlobalState,
    history: BTreeMap<u64, Checkpoint>,
}

impl RewardAccumulator {
    /// Create an accumulator whose schedule starts at `schedule_start`.
    ///
    /// # Errors
    /// Returns `StakingError::InvalidSchedule` if `accrual_interval` is zero.
    pub fn new(
        schedule: EmissionSchedule,
        accrual_interval: u64,
        schedule_start: Timestamp,
    ) -> Result<Self, StakingError> {
        if accrual_interval == 0 {
            return Err(StakingError::InvalidSchedule(
                "accrual interval must be positive".to_string(),
            ));
        }
        let state = GlobalState {
            total_staked: 0,
            eligible_units: 0,
            accumulator_value: 0,
            last_synced_at: schedule_start,
            schedule_start,
            synced_intervals: 0,
            reward_pool_remaining: schedule.total_pool(),
            total_emitted: 0,
            total_forfeited: 0,
            total_claimed: 0,
            distribution_carry: 0,
            pending_cohort: None,
        };
        Ok(Self {
            schedule,
            accrual_interval,
            state,
            history: BTreeMap::new(),
        })
    }

    pub fn state(&self) -> &GlobalState {
        &self.state
    }

    pub fn schedule(&self) -> &EmissionSchedule {
        &self.schedule
    }

    pub fn accrual_interval(&self) -> u64 {
        self.accrual_interval
    }

    /// Number of promoted cohorts some holder has not settled against yet.
    pub fn open_checkpoints(&self) -> usize {
        self.history.len()
    }

    /// Move epoch zero. Only valid before anything has been staked.
    ///
    /// # Errors
    /// Returns `StakingError::InvalidPhase` once any unit is staked or any
    /// interval has been folded.
    pub fn set_schedule_start(&mut self, start: Timestamp) -> Result<(), StakingError> {
        if self.state.total_staked > 0 || self.state.synced_intervals > 0 || self.state.total_emitted > 0 {
            return Err(StakingError::InvalidPhase(
                "schedule start can only move before any stake activity".to_string(),
            ));
        }
        self.state.schedule_start = start;
        self.state.last_synced_at = start;
        Ok(())
    }

    /// Accrual intervals fully elapsed at `now`.
    pub fn completed_intervals(&self, now: Timestamp) -> u64 {
        now.saturating_sub(self.state.schedule_start) / self.accrual_interval
    }

    /// Whether `t` falls exactly on an interval start (times before the
    /// schedule start count as the start of interval 0).
    pub fn is_boundary(&self, t: Timestamp) -> bool {
        t <= self.state.schedule_start || (t - self.state.schedule_start) % self.accrual_interval == 0
    }

    /// Whether a unit staked at `staked_at` is still waiting, at `now`, for
    /// its first full interval.
    pub fn is_pending(&self, staked_at: Timestamp, now: Timestamp) -> bool {
        !self.is_boundary(staked_at) && self.completed_intervals(staked_at) == self.completed_intervals(now)
    }

    /// Fold every interval completed by `now` into the accumulator.
    ///
    /// # Errors
    /// Returns `StakingError::ClockRegression` if `now` is before the last
    /// synchronisation, or `StakingError::Overflow` on arithmetic overflow.
    pub fn synchronize(&mut self, now: Timestamp) -> Result<(), StakingError> {
        let last = self.state.last_synced_at;
        if now < last {
            return Err(StakingError::ClockRegression { last, now });
        }

        let target = self.completed_intervals(now);
        while self.state.synced_intervals < target {
            let from = self.state.synced_intervals;
            // Stop at the end of the pending cohort's interval so it joins
            // the eligible set for the intervals after it.
            let to = match self.state.pending_cohort {
                Some(cohort) if cohort.interval >= from && cohort.interval < target => cohort.interval + 1,
                _ => target,
            };
            self.fold(from, to)?;
            self.state.synced_intervals = to;
            self.promote_cohort();
        }

        self.state.last_synced_at = now;
        Ok(())
    }

    /// Bring `account` up to date with the accumulator at `now`.
    pub fn settle(&mut self, account: &mut UserAccount, now: Timestamp) -> Result<(), StakingError> {
        self.synchronize(now)?;

        if let Some(queued) = account.queued {
            if queued.interval < self.state.synced_intervals {
                let promoted_at = self
                    .history
                    .get(&queued.interval)
                    .map(|c| c.accumulator_value)
                    .ok_or_else(|| {
                        StakingError::InvalidStakeState(format!(
                            "no accumulator checkpoint recorded for interval {}",
                            queued.interval
                        ))
                    })?;
                accrue(account, promoted_at)?;
                account.eligible_units = account
                    .eligible_units
                    .checked_add(queued.units)
                    .ok_or_else(|| StakingError::Overflow("account units".to_string()))?;
                account.queued = None;
                self.release_checkpoint(queued.interval);
            }
        }

        accrue(account, self.state.accumulator_value)
    }

    /// Settle, then add `units` freshly staked at `now`.
    ///
    /// The settlement happens before the count changes, so the new units
    /// never earn for time before they were staked.
    pub fn stake_units(
        &mut self,
        account: &mut UserAccount,
        units: u64,
        now: Timestamp,
    ) -> Result<(), StakingError> {
        if units == 0 {
            return Err(StakingError::InvalidStakeState("cannot stake zero units".to_string()));
        }
        self.settle(account, now)?;

        if self.is_boundary(now) {
            account.eligible_units = checked_add_units(account.eligible_units, units)?;
            self.state.eligible_units = checked_add_units(self.state.eligible_units, units)?;
        } else {
            let interval = self.state.synced_intervals;
            let cohort = self.state.pending_cohort.get_or_insert(Cohort {
                interval,
                units: 0,
                holders: 0,
            });
            debug_assert_eq!(cohort.interval, interval);
            cohort.units = checked_add_units(cohort.units, units)?;
            match account.queued.as_mut() {
                Some(queued) => queued.units = checked_add_units(queued.units, units)?,
                None => {
                    account.queued = Some(QueuedUnits { interval, units });
                    cohort.holders += 1;
                }
            }
        }

        self.state.total_staked = checked_add_units(self.state.total_staked, units)?;
        Ok(())
    }

    /// Settle, then remove the units whose stake times are `staked_at`.
    ///
    /// The settlement happens before the count changes, so the departing
    /// units keep their share up to `now` and the smaller count only applies
    /// afterwards.
    pub fn withdraw_units(
        &mut self,
        account: &mut UserAccount,
        staked_at: &[Timestamp],
        now: Timestamp,
    ) -> Result<(), StakingError> {
        self.settle(account, now)?;

        let queued = staked_at.iter().filter(|&&t| self.is_pending(t, now)).count() as u64;
        let eligible = staked_at.len() as u64 - queued;
        let account_queued = account.queued.map_or(0, |q| q.units);
        if eligible > account.eligible_units || queued > account_queued {
            return Err(StakingError::InvalidStakeState(format!(
                "account holds {} eligible and {} pending units, cannot withdraw {} and {}",
                account.eligible_units, account_queued, eligible, queued
            )));
        }

        account.eligible_units -= eligible;
        self.state.eligible_units = self
            .state
            .eligible_units
            .checked_sub(eligible)
            .ok_or_else(|| StakingError::InvalidStakeState("eligible units underflow".to_string()))?;

        if queued > 0 {
            let cohort = self.state.pending_cohort.as_mut().ok_or_else(|| {
                StakingError::InvalidStakeState("pending units without a cohort".to_string())
            })?;
            cohort.units = cohort.units.saturating_sub(queued);
            if let Some(q) = account.queued.as_mut() {
                q.units -= queued;
                if q.units == 0 {
                    account.queued = None;
                    cohort.holders = cohort.holders.saturating_sub(1);
                }
            }
            if cohort.units == 0 {
                self.state.pending_cohort = None;
            }
        }

        self.state.total_staked = self
            .state
            .total_staked
            .checked_sub(staked_at.len() as u64)
            .ok_or_else(|| StakingError::InvalidStakeState("total staked underflow".to_string()))?;
        Ok(())
    }

    /// Settle and hand out everything the account has earned.
    ///
    /// The caller is responsible for paying the returned amount.
    pub fn take_reward(&mut self, account: &mut UserAccount, now: Timestamp) -> Result<Wei, StakingError> {
        self.settle(account, now)?;
        let amount = account.stored_reward;
        account.stored_reward = 0;
        self.state.total_claimed = self
            .state
            .total_claimed
            .checked_add(amount)
            .ok_or_else(|| StakingError::Overflow("total claimed".to_string()))?;
        Ok(amount)
    }

    /// What `account` would hold after settling at `now`, without mutating
    /// anything.
    pub fn pending_reward(&self, account: &UserAccount, now: Timestamp) -> Result<Wei, StakingError> {
        let mut scratch = self.clone();
        let mut account = account.clone();
        scratch.settle(&mut account, now)?;
        Ok(account.stored_reward)
    }

    /// The global state as it would be after synchronising at `now`.
    pub fn synced_state(&self, now: Timestamp) -> Result<GlobalState, StakingError> {
        let mut scratch = self.clone();
        scratch.synchronize(now)?;
        Ok(scratch.state)
    }

    /// Fold intervals `[from, to)` at the current eligible count.
    fn fold(&mut self, from: u64, to: u64) -> Result<(), StakingError> {
        let start = self.state.schedule_start;
        // `to` never exceeds the completed intervals at a real timestamp, so
        // these stay within u64.
        let t0 = start + from * self.accrual_interval;
        let t1 = start + to * self.accrual_interval;
        let emission = self.schedule.amount_emitted(start, t0, t1);
        if emission == 0 {
            return Ok(());
        }

        self.state.total_emitted = self
            .state
            .total_emitted
            .checked_add(emission)
            .ok_or_else(|| StakingError::Overflow("total emitted".to_string()))?;
        self.state.reward_pool_remaining = self.state.reward_pool_remaining.saturating_sub(emission);

        if self.state.eligible_units == 0 {
            self.state.total_forfeited += emission;
            tracing::warn!(
                "Forfeited {} wei emitted over intervals {}..{} with no eligible stake",
                emission,
                from,
                to
            );
            return Ok(());
        }

        let eligible = u128::from(self.state.eligible_units);
        let numerator = emission
            .checked_mul(ACC_PRECISION)
            .and_then(|n| n.checked_add(self.state.distribution_carry))
            .ok_or_else(|| StakingError::Overflow("scaled emission".to_string()))?;
        self.state.accumulator_value = self
            .state
            .accumulator_value
            .checked_add(numerator / eligible)
            .ok_or_else(|| StakingError::Overflow("accumulator value".to_string()))?;
        self.state.distribution_carry = numerator % eligible;

        tracing::debug!(
            "Folded intervals {}..{}: {} wei over {} units, accumulator now {}",
            from,
            to,
            emission,
            eligible,
            self.state.accumulator_value
        );
        Ok(())
    }

    fn promote_cohort(&mut self) {
        let Some(cohort) = self.state.pending_cohort else {
            return;
        };
        if cohort.interval >= self.state.synced_intervals {
            return;
        }
        self.state.eligible_units += cohort.units;
        if cohort.holders > 0 {
            self.history.insert(
                cohort.interval,
                Checkpoint {
                    accumulator_value: self.state.accumulator_value,
                    holders: cohort.holders,
                },
            );
        }
        self.state.pending_cohort = None;
    }

    fn release_checkpoint(&mut self, interval: u64) {
        if let Some(checkpoint) = self.history.get_mut(&interval) {
            checkpoint.holders = checkpoint.holders.saturating_sub(1);
            if checkpoint.holders == 0 {
                self.history.remove(&interval);
            }
        }
    }
}

/// Credit `account` for its eligible units from its checkpoint up to `value`.
fn accrue(account: &mut UserAccount, value: u128) -> Result<(), StakingError> {
    let delta = value.checked_sub(account.checkpoint).ok_or_else(|| {
        StakingError::InvalidStakeState(format!(
            "checkpoint {} is ahead of accumulator {}",
            account.checkpoint, value
        ))
    })?;
    let earned = u128::from(account.eligible_units)
        .checked_mul(delta)
        .ok_or_else(|| StakingError::Overflow("account earnings".to_string()))?
        / ACC_PRECISION;
    account.stored_reward = account
        .stored_reward
        .checked_add(earned)
        .ok_or_else(|| StakingError::Overflow("stored reward".to_string()))?;
    account.checkpoint = value;
    Ok(())
}

fn checked_add_units(a: u64, b: u64) -> Result<u64, StakingError> {
    a.checked_add(b)
        .ok_or_else(|| StakingError::Overflow("staked units".to_string()))
}
