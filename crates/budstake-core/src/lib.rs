// crates/budstake-core/src/lib.rs
//
// budstake-core: Core types, error taxonomy, and collaborator traits for the
// budstake NFT staking engine.
//
// This is the leaf crate that the other crates in the workspace depend on.
// It defines account/item identifiers, the stake record, the error enum, and
// the trait interfaces for the clock and the two external ledgers (reward
// token and item custody).

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

// Re-export key types for ergonomic access from downstream crates.
// Usage: `use budstake_core::StakeRecord;`

pub use clock::{ManualClock, SystemClock, SECONDS_PER_DAY};
pub use error::StakingError;
pub use traits::{Clock, ItemCustody, RewardLedger};
pub use types::{AccountId, ItemId, StakeRecord, Timestamp, Wei};
