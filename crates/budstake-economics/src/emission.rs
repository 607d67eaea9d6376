// crates/budstake-economics/src/emission.rs
//
// Multi-period decaying emission schedule.
//
// Time since the schedule start is divided into fixed-length periods
// (default 180 days). Each period releases a fixed allotment linearly over
// its length, and each allotment is no larger than the one before it:
//   period 1: 1,000,000 SEED  (~5555.5555 SEED/day)
//   period 2:   800,000 SEED  (~4444.4444 SEED/day)
//   period 3:   600,000 SEED  (~3333.3333 SEED/day)
//   period 4:   600,000 SEED  (~3333.3333 SEED/day)
// After the last period nothing more is emitted, so cumulative emission
// saturates at the pool (3,000,000 SEED by default).
//
// Emission over an interval is the difference of two cumulative values, so
// an interval spanning a period boundary is integrated piecewise and the sum
// over any partition of time equals the pool exactly.

use serde::{Deserialize, Serialize};

use budstake_core::{StakingError, Timestamp, Wei, SECONDS_PER_DAY};

use crate::rewards::ACC_PRECISION;
use crate::token::WEI_PER_SEED;

/// Default length of one emission period: 180 days.
pub const DEFAULT_PERIOD_LENGTH_SECS: u64 = 180 * SECONDS_PER_DAY;

/// Default per-period allotments, in whole SEED.
pub const DEFAULT_ALLOTMENTS_SEED: [u64; 4] = [1_000_000, 800_000, 600_000, 600_000];

/// Operator-facing schedule configuration in whole SEED units, so it can be
/// written in TOML (which has no 128-bit integers).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleConfig {
    /// Length of each period in seconds.
    #[serde(default = "default_period_length_secs")]
    pub period_length_secs: u64,

    /// Allotment of each period in whole SEED, in period order.
    #[serde(default = "default_allotments_seed")]
    pub allotments_seed: Vec<u64>,
}

fn default_period_length_secs() -> u64 {
    DEFAULT_PERIOD_LENGTH_SECS
}

fn default_allotments_seed() -> Vec<u64> {
    DEFAULT_ALLOTMENTS_SEED.to_vec()
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            period_length_secs: default_period_length_secs(),
            allotments_seed: default_allotments_seed(),
        }
    }
}

impl ScheduleConfig {
    /// Validate and convert into an [`EmissionSchedule`].
    pub fn build(&self) -> Result<EmissionSchedule, StakingError> {
        let allotments = self
            .allotments_seed
            .iter()
            .map(|&seed| Wei::from(seed) * WEI_PER_SEED)
            .collect();
        EmissionSchedule::new(self.period_length_secs, allotments)
    }
}

/// Serialized form of [`EmissionSchedule`]; validated on the way in.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct ScheduleParts {
    period_length_secs: u64,
    allotments_wei: Vec<Wei>,
}

/// Summary of one emission period, for operator display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PeriodInfo {
    /// Zero-based period index.
    pub index: usize,
    /// Offset of the period start from the schedule start, in seconds.
    pub start_offset: u64,
    /// Offset of the period end (exclusive), in seconds.
    pub end_offset: u64,
    /// Total released during the period, in wei.
    pub allotment: Wei,
    /// Release per full day inside the period, in wei (floored).
    pub daily_rate: Wei,
}

/// A validated piecewise-linear emission schedule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ScheduleParts", into = "ScheduleParts")]
pub struct EmissionSchedule {
    period_length: u64,
    allotments: Vec<Wei>,
    total_pool: Wei,
}

impl TryFrom<ScheduleParts> for EmissionSchedule {
    type Error = StakingError;

    fn try_from(parts: ScheduleParts) -> Result<Self, Self::Error> {
        EmissionSchedule::new(parts.period_length_secs, parts.allotments_wei)
    }
}

impl From<EmissionSchedule> for ScheduleParts {
    fn from(schedule: EmissionSchedule) -> Self {
        ScheduleParts {
            period_length_secs: schedule.period_length,
            allotments_wei: schedule.allotments,
        }
    }
}

impl Default for EmissionSchedule {
    fn default() -> Self {
        let allotments = DEFAULT_ALLOTMENTS_SEED
            .iter()
            .map(|&seed| Wei::from(seed) * WEI_PER_SEED)
            .collect::<Vec<_>>();
        let total_pool = allotments.iter().sum();
        Self {
            period_length: DEFAULT_PERIOD_LENGTH_SECS,
            allotments,
            total_pool,
        }
    }
}

impl EmissionSchedule {
    /// Build a schedule from a period length (seconds) and per-period
    /// allotments (wei).
    ///
    /// # Errors
    /// Returns `StakingError::InvalidSchedule` if the period length is zero,
    /// there are no periods, the first allotment is zero, an allotment is
    /// larger than its predecessor, or the totals overflow. The pool must
    /// also stay representable once scaled by [`ACC_PRECISION`].
    pub fn new(period_length: u64, allotments: Vec<Wei>) -> Result<Self, StakingError> {
        if period_length == 0 {
            return Err(StakingError::InvalidSchedule(
                "period length must be positive".to_string(),
            ));
        }
        if allotments.is_empty() {
            return Err(StakingError::InvalidSchedule(
                "schedule needs at least one period".to_string(),
            ));
        }
        if allotments[0] == 0 {
            return Err(StakingError::InvalidSchedule(
                "first period allotment must be positive".to_string(),
            ));
        }
        for (i, pair) in allotments.windows(2).enumerate() {
            if pair[1] > pair[0] {
                return Err(StakingError::InvalidSchedule(format!(
                    "period {} allotment {} exceeds period {} allotment {}",
                    i + 1,
                    pair[1],
                    i,
                    pair[0]
                )));
            }
        }
        let periods = u64::try_from(allotments.len())
            .map_err(|_| StakingError::InvalidSchedule("too many periods".to_string()))?;
        if period_length.checked_mul(periods).is_none() {
            return Err(StakingError::InvalidSchedule(
                "schedule length overflows u64 seconds".to_string(),
            ));
        }
        // Linear release multiplies an allotment by up to one period length.
        if allotments[0].checked_mul(Wei::from(period_length)).is_none() {
            return Err(StakingError::InvalidSchedule(
                "allotment too large for the period length".to_string(),
            ));
        }
        let total_pool = allotments
            .iter()
            .try_fold(0 as Wei, |acc, &a| acc.checked_add(a))
            .ok_or_else(|| StakingError::InvalidSchedule("total pool overflows".to_string()))?;
        // The accumulator carries the whole pool scaled by ACC_PRECISION, and
        // settlement multiplies per-unit deltas back up; keep half of u128 free.
        if total_pool
            .checked_mul(ACC_PRECISION)
            .and_then(|scaled| scaled.checked_mul(2))
            .is_none()
        {
            return Err(StakingError::InvalidSchedule(format!(
                "total pool {} wei is too large for fixed-point reward accounting",
                total_pool
            )));
        }

        Ok(Self {
            period_length,
            allotments,
            total_pool,
        })
    }

    pub fn period_length(&self) -> u64 {
        self.period_length
    }

    pub fn allotments(&self) -> &[Wei] {
        &self.allotments
    }

    /// Sum of all allotments: the most this schedule will ever emit.
    pub fn total_pool(&self) -> Wei {
        self.total_pool
    }

    /// Offset (seconds from start) at which emission stops.
    pub fn end_offset(&self) -> u64 {
        // Cannot overflow: checked in `new`.
        self.period_length * self.allotments.len() as u64
    }

    /// Index of the period containing `elapsed`, or `None` once the schedule
    /// has run out.
    pub fn period_index(&self, elapsed: u64) -> Option<usize> {
        let index = usize::try_from(elapsed / self.period_length).ok()?;
        (index < self.allotments.len()).then_some(index)
    }

    /// Release per full day inside period `index`, in wei (floored).
    pub fn daily_rate(&self, index: usize) -> Wei {
        self.allotments.get(index).map_or(0, |&allotment| {
            allotment * Wei::from(SECONDS_PER_DAY.min(self.period_length))
                / Wei::from(self.period_length)
        })
    }

    /// Total emitted from the schedule start until `elapsed` seconds later.
    ///
    /// Non-decreasing in `elapsed`, and equal to `total_pool()` from the end
    /// of the last period on.
    pub fn cumulative_emission(&self, elapsed: u64) -> Wei {
        let full_periods = elapsed / self.period_length;
        let full = match usize::try_from(full_periods) {
            Ok(full) if full < self.allotments.len() => full,
            _ => return self.total_pool,
        };

        let completed: Wei = self.allotments[..full].iter().sum();
        let into_period = Wei::from(elapsed % self.period_length);
        completed + self.allotments[full] * into_period / Wei::from(self.period_length)
    }

    /// Emission over `[t0, t1)` for a schedule that started at
    /// `schedule_start`. Time before the start emits nothing.
    ///
    /// # Panics
    /// Panics if `t1 < t0`.
    pub fn amount_emitted(&self, schedule_start: Timestamp, t0: Timestamp, t1: Timestamp) -> Wei {
        assert!(t1 >= t0, "emission interval must not be reversed: t0={} t1={}", t0, t1);
        let from = t0.saturating_sub(schedule_start);
        let to = t1.saturating_sub(schedule_start);
        self.cumulative_emission(to) - self.cumulative_emission(from)
    }

    /// Per-period summary table.
    pub fn period_table(&self) -> Vec<PeriodInfo> {
        self.allotments
            .iter()
            .enumerate()
            .map(|(index, &allotment)| {
                let start_offset = self.period_length * index as u64;
                PeriodInfo {
                    index,
                    start_offset,
                    end_offset: start_offset + self.period_length,
                    allotment,
                    daily_rate: self.daily_rate(index),
                }
            })
            .collect()
    }
}
