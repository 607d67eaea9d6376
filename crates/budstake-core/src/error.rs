use thiserror::Error;

use crate::types::{Timestamp, Wei};

/// Error taxonomy for the staking engine and its collaborators.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StakingError {
    /// Double stake, withdrawal of an item the caller has not staked,
    /// malformed batch, or an inconsistent migration replay.
    #[error("Invalid stake state: {0}")]
    InvalidStakeState(String),

    /// A claim exceeds what the reward ledger holds for the engine.
    #[error("Insufficient reward pool: requested {requested} wei but only {available} wei available")]
    InsufficientRewardPool { requested: Wei, available: Wei },

    /// Mutating call while the engine is paused.
    #[error("Engine is paused")]
    EnginePaused,

    /// Caller lacks the role or approval required for the operation.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Malformed emission schedule configuration.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Operation not allowed in the engine's current lifecycle phase.
    #[error("Invalid phase: {0}")]
    InvalidPhase(String),

    /// The supplied time is earlier than the last synchronised time.
    #[error("Clock moved backwards: last synchronised at {last}, now {now}")]
    ClockRegression { last: Timestamp, now: Timestamp },

    /// Checked arithmetic overflowed.
    #[error("Arithmetic overflow: {0}")]
    Overflow(String),

    /// Item custody ledger rejected an operation.
    #[error("Custody error: {0}")]
    Custody(String),

    /// Reward ledger rejected an operation.
    #[error("Ledger error: {0}")]
    Ledger(String),

    /// Serialization/deserialization error.
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for StakingError {
    fn from(e: serde_json::Error) -> Self {
        StakingError::Serialization(e.to_string())
    }
}
