// crates/budstake-cli/src/config.rs
//
// Operator configuration for the budstake CLI.
// Loaded from a TOML file or populated with sensible defaults.

use serde::Deserialize;
use std::fs;

use budstake_core::AccountId;
use budstake_economics::{EngineConfig, ScheduleConfig};

/// Runtime configuration for the CLI.
#[derive(Debug, Clone, Deserialize)]
pub struct CliConfig {
    /// JSON file holding the engine state, reward ledger, and item vault.
    #[serde(default = "default_state_file")]
    pub state_file: String,

    /// Account that holds staked items and the reward pool.
    #[serde(default = "default_engine_account")]
    pub engine_account: String,

    /// Account allowed to run administrative commands.
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Log level: "trace", "debug", "info", "warn", "error".
    /// `RUST_LOG` takes precedence when set.
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Whole SEED minted to the engine account by `init`.
    #[serde(default = "default_pool_funding_seed")]
    pub pool_funding_seed: u64,

    /// Accrual interval in seconds (1 = continuous, 86400 = whole days).
    #[serde(default = "default_accrual_interval_secs")]
    pub accrual_interval_secs: u64,

    /// Emission schedule.
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

fn default_state_file() -> String {
    "~/.budstake/state.json".to_string()
}

fn default_engine_account() -> String {
    "staking".to_string()
}

fn default_owner() -> String {
    "deployer".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_pool_funding_seed() -> u64 {
    3_000_000
}

fn default_accrual_interval_secs() -> u64 {
    1
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            engine_account: default_engine_account(),
            owner: default_owner(),
            log_level: default_log_level(),
            pool_funding_seed: default_pool_funding_seed(),
            accrual_interval_secs: default_accrual_interval_secs(),
            schedule: ScheduleConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from a TOML file at the given path.
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &str) -> Result<Self, Box<dyn std::error::Error>> {
        let contents = fs::read_to_string(expand_tilde(path))?;
        let config: CliConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            schedule: self.schedule.clone(),
            accrual_interval_secs: self.accrual_interval_secs,
        }
    }

    pub fn owner(&self) -> AccountId {
        AccountId::new(self.owner.as_str())
    }

    pub fn engine_account(&self) -> AccountId {
        AccountId::new(self.engine_account.as_str())
    }

    pub fn state_path(&self) -> String {
        expand_tilde(&self.state_file)
    }
}

/// Expand a leading `~/` to the user's home directory.
pub fn expand_tilde(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest).to_string_lossy().to_string();
        }
    }
    path.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = CliConfig::default();
        assert_eq!(config.pool_funding_seed, 3_000_000);
        assert_eq!(config.accrual_interval_secs, 1);
        assert_eq!(config.engine_config(), EngineConfig::default());
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let config: CliConfig = toml::from_str(
            r#"
            owner = "0xABCDEF"
            accrual_interval_secs = 86400

            [schedule]
            allotments_seed = [500, 250]
            "#,
        )
        .unwrap();

        assert_eq!(config.owner(), AccountId::new("0xabcdef"));
        assert_eq!(config.engine_account, "staking");
        assert_eq!(config.schedule.allotments_seed, vec![500, 250]);
        assert_eq!(
            config.schedule.period_length_secs,
            budstake_economics::DEFAULT_PERIOD_LENGTH_SECS
        );
        assert_eq!(config.engine_config().accrual_interval_secs, 86_400);
    }

    #[test]
    fn test_expand_tilde_leaves_absolute_paths() {
        assert_eq!(expand_tilde("/tmp/state.json"), "/tmp/state.json");
    }
}
