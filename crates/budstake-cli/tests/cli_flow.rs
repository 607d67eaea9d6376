// crates/budstake-cli/tests/cli_flow.rs
//
// End-to-end tests of the `budstake` binary against a throwaway state file.
// Time is pinned with `--now` so reward amounts are exact.

use std::fs;
use std::path::PathBuf;
use std::process::{Command, Output};

use serde::Deserialize;
use uuid::Uuid;

const T0: u64 = 1_700_000_000;
const DAY: u64 = 86_400;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A temp directory holding a config file that points at its own state file.
struct Workspace {
    dir: PathBuf,
}

impl Workspace {
    fn new(label: &str, accrual_interval_secs: u64) -> Self {
        let dir = std::env::temp_dir().join(format!("budstake_cli_{}_{}", label, Uuid::now_v7()));
        fs::create_dir_all(&dir).unwrap();
        let config = format!(
            "state_file = \"{}\"\nowner = \"deployer\"\nengine_account = \"staking\"\nlog_level = \"warn\"\naccrual_interval_secs = {}\n",
            dir.join("state.json").display(),
            accrual_interval_secs
        );
        fs::write(dir.join("config.toml"), config).unwrap();
        Self { dir }
    }

    fn run(&self, now: u64, args: &[&str]) -> Output {
        let config = self.dir.join("config.toml");
        let now = now.to_string();
        Command::new(env!("CARGO_BIN_EXE_budstake"))
            .arg("--config")
            .arg(&config)
            .args(["--now", now.as_str()])
            .args(args)
            .output()
            .unwrap()
    }

    fn ok(&self, now: u64, args: &[&str]) -> String {
        let out = self.run(now, args);
        assert!(
            out.status.success(),
            "budstake {:?} failed: {}",
            args,
            String::from_utf8_lossy(&out.stderr)
        );
        String::from_utf8_lossy(&out.stdout).to_string()
    }

    fn json(&self, now: u64, args: &[&str]) -> serde_json::Value {
        let mut full = vec!["--format", "json"];
        full.extend_from_slice(args);
        serde_json::from_str(&self.ok(now, &full)).unwrap()
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        let _ = fs::remove_dir_all(&self.dir);
    }
}

/// `info --format json` output. Typed so wei amounts above u64 parse exactly.
#[derive(Debug, Deserialize)]
struct InfoOut {
    items: Vec<serde_json::Value>,
    pending_reward_wei: u128,
}

fn info(ws: &Workspace, now: u64, who: &str) -> InfoOut {
    let stdout = ws.ok(now, &["--format", "json", "info", who]);
    serde_json::from_str(&stdout).unwrap()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[test]
fn test_stake_accrue_claim_unstake() {
    let ws = Workspace::new("flow", 1);
    ws.ok(T0, &["init"]);
    ws.ok(T0, &["mint-item", "--to", "alice", "1", "2"]);
    ws.ok(T0, &["approve", "--owner", "alice"]);
    ws.ok(T0, &["stake", "--from", "alice", "1", "2"]);

    let alice = info(&ws, T0 + DAY, "alice");
    assert_eq!(alice.items.len(), 2);
    assert_eq!(alice.pending_reward_wei, 5_555_555_555_555_555_555_555);

    let receipt = ws.json(T0 + DAY, &["claim", "--from", "alice"]);
    assert_eq!(receipt["account"], "alice");

    ws.ok(T0 + DAY, &["unstake", "--from", "alice", "1", "2"]);
    let status = ws.json(T0 + DAY, &["status"]);
    assert_eq!(status["staked_items"], 0);
    assert_eq!(status["phase"], "Active");
}

#[test]
fn test_failed_command_does_not_save() {
    let ws = Workspace::new("atomic", 1);
    ws.ok(T0, &["init"]);
    ws.ok(T0, &["mint-item", "--to", "alice", "1"]);

    // Not approved yet
    let out = ws.run(T0, &["stake", "--from", "alice", "1"]);
    assert!(!out.status.success());

    let status = ws.json(T0, &["status"]);
    assert_eq!(status["staked_items"], 0);
}

#[test]
fn test_pause_blocks_staking() {
    let ws = Workspace::new("pause", 1);
    ws.ok(T0, &["init"]);
    ws.ok(T0, &["mint-item", "--to", "alice", "1"]);
    ws.ok(T0, &["approve", "--owner", "alice"]);

    assert!(!ws.run(T0, &["pause", "--from", "alice"]).status.success());
    ws.ok(T0, &["pause"]);
    assert!(!ws.run(T0, &["stake", "--from", "alice", "1"]).status.success());
    ws.ok(T0, &["unpause"]);
    ws.ok(T0, &["stake", "--from", "alice", "1"]);
}

#[test]
fn test_init_refuses_to_overwrite() {
    let ws = Workspace::new("reinit", 1);
    ws.ok(T0, &["init"]);
    assert!(!ws.run(T0, &["init"]).status.success());
    ws.ok(T0, &["init", "--force"]);
}

#[test]
fn test_export_then_migrate_into_new_state() {
    let old = Workspace::new("old", DAY);
    old.ok(T0, &["init"]);
    old.ok(T0, &["mint-item", "--to", "alice", "1"]);
    old.ok(T0, &["mint-item", "--to", "bob", "2"]);
    old.ok(T0, &["approve", "--owner", "alice"]);
    old.ok(T0, &["approve", "--owner", "bob"]);
    old.ok(T0 + 3_600, &["stake", "--from", "alice", "1"]);
    old.ok(T0 + DAY + 3_600, &["stake", "--from", "bob", "2"]);

    let snapshot = old.dir.join("migrateTokens.json");
    let snapshot = snapshot.to_string_lossy().to_string();
    old.ok(T0 + 5 * DAY, &["export", "--out", snapshot.as_str()]);
    let expected = info(&old, T0 + 5 * DAY, "bob");

    let new = Workspace::new("new", DAY);
    let now = T0 + 5 * DAY;
    new.ok(now, &["init", "--migrating"]);
    assert!(!new.run(now, &["stake", "--from", "alice", "1"]).status.success());

    let start = T0.to_string();
    let report = new.json(
        now,
        &[
            "migrate",
            snapshot.as_str(),
            "--start-time",
            start.as_str(),
            "--previous-holder",
            "staking-v1",
            "--mint-missing",
        ],
    );
    assert_eq!(report["records"], 2);
    assert_eq!(report["stakers"], 2);

    new.ok(now, &["activate"]);
    let migrated = info(&new, now, "bob");
    assert!(migrated.pending_reward_wei > 0);
    assert_eq!(migrated.pending_reward_wei, expected.pending_reward_wei);
    assert_eq!(migrated.items, expected.items);
}
