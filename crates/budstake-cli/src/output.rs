// crates/budstake-cli/src/output.rs
//
// Output formatting utilities for the budstake CLI.
// Supports table and JSON output modes.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::Serialize;
use tabled::{Table, Tabled};

use budstake_core::{Timestamp, Wei};
use budstake_economics::Seed;

/// Output format for CLI commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Pretty-printed table output (default).
    Table,
    /// JSON output for machine consumption.
    Json,
}

/// Format a slice of Tabled items as a table string.
pub fn format_table<T: Tabled>(data: &[T]) -> String {
    Table::new(data).to_string()
}

/// Format a serializable value as a pretty-printed JSON string.
pub fn format_json<T: Serialize>(data: &T) -> String {
    serde_json::to_string_pretty(data).unwrap_or_else(|e| format!("JSON serialization error: {}", e))
}

/// Render a wei amount as SEED with 4 decimals, e.g. "5555.5555 SEED".
pub fn format_seed(wei: Wei) -> String {
    format!("{} SEED", Seed::from_wei(wei).format_units(4))
}

/// Render a unix timestamp as RFC 3339 UTC.
pub fn format_timestamp(ts: Timestamp) -> String {
    i64::try_from(ts)
        .ok()
        .and_then(|secs| DateTime::<Utc>::from_timestamp(secs, 0))
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}

/// Render a duration in seconds as whole days plus remainder.
pub fn format_duration(secs: u64) -> String {
    let days = secs / 86_400;
    let rest = secs % 86_400;
    match (days, rest) {
        (0, r) => format!("{}s", r),
        (d, 0) => format!("{}d", d),
        (d, r) => format!("{}d {}s", d, r),
    }
}
