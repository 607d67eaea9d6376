// crates/budstake-economics/src/token.rs
//
// SEED reward token amount type and unit constants.
//
// SEED uses 18 decimals like the ERC-20 it mirrors. All internal accounting
// is done in integer wei; this type only exists for construction from whole
// token amounts and for display.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Sub};

use budstake_core::Wei;

/// Number of decimals of the SEED token.
pub const SEED_DECIMALS: u32 = 18;

/// Number of wei in one SEED. 1 SEED = 10^18 wei.
pub const WEI_PER_SEED: Wei = 1_000_000_000_000_000_000;

/// A SEED token amount.
///
/// Wraps an amount in wei. All arithmetic is integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
pub struct Seed {
    /// Amount in wei (1 SEED = 10^18 wei).
    pub wei: Wei,
}

impl Seed {
    /// Create an amount from a whole number of SEED.
    ///
    /// # Example
    /// ```
    /// use budstake_economics::token::Seed;
    /// let amount = Seed::from_seed(3);
    /// assert_eq!(amount.wei, 3_000_000_000_000_000_000);
    /// ```
    pub fn from_seed(amount: u64) -> Self {
        Self {
            wei: Wei::from(amount) * WEI_PER_SEED,
        }
    }

    pub fn from_wei(wei: Wei) -> Self {
        Self { wei }
    }

    /// Returns zero SEED.
    pub fn zero() -> Self {
        Self { wei: 0 }
    }

    /// Render with at most `precision` decimals, truncating (never rounding
    /// up) the remainder. `format_units(5_555_555_555_555_555_555_556, 4)`
    /// gives `"5555.5555"`.
    pub fn format_units(&self, precision: u32) -> String {
        let whole = self.wei / WEI_PER_SEED;
        if precision == 0 {
            return whole.to_string();
        }
        let precision = precision.min(SEED_DECIMALS);
        let frac = self.wei % WEI_PER_SEED;
        let truncated = frac / 10u128.pow(SEED_DECIMALS - precision);
        let frac_str = format!("{:0width$}", truncated, width = precision as usize);
        let trimmed = frac_str.trim_end_matches('0');
        if trimmed.is_empty() {
            whole.to_string()
        } else {
            format!("{}.{}", whole, trimmed)
        }
    }
}

impl Add for Seed {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei.saturating_add(rhs.wei),
        }
    }
}

impl Sub for Seed {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            wei: self.wei.saturating_sub(rhs.wei),
        }
    }
}

impl From<Wei> for Seed {
    fn from(wei: Wei) -> Self {
        Seed::from_wei(wei)
    }
}

impl fmt::Display for Seed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} SEED", self.format_units(SEED_DECIMALS))
    }
}
