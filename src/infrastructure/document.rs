// JSON document codec for snapshot files
use crate::domain::snapshot::DashboardSnapshot;
use anyhow::{Context, Result};
use serde_json::Value;

/// Parse raw bytes into an untyped document. Shape checks are left to the validator.
pub fn parse_document(bytes: &[u8]) -> Result<Value> {
    serde_json::from_slice(bytes).context("Snapshot document is not valid JSON")
}

pub fn snapshot_to_document(snapshot: &DashboardSnapshot) -> Result<Value> {
    serde_json::to_value(snapshot).context("Failed to encode snapshot")
}

pub fn encode_pretty(snapshot: &DashboardSnapshot) -> Result<String> {
    serde_json::to_string_pretty(snapshot).context("Failed to encode snapshot")
}
