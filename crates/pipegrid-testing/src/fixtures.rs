//! Fixtures for sample data.
//!
//! Provides utilities to:
//! - Build records from `(field, value)` pairs
//! - Load sample drafts shipped under `samples/`
//! - Stamp writes with a fixed instant

use anyhow::{Context, Result};
use pipegrid_types::{CellRecord, CellStore};
use serde_json::Value;
use std::path::PathBuf;

/// Instant every fixture clock returns: 2025-03-01T08:30:00Z.
pub const FIXED_TIMESTAMP: &str = "2025-03-01T08:30:00.000Z";

/// Clock for controllers under test.
pub fn fixed_clock() -> chrono::DateTime<chrono::Utc> {
    chrono::DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("fixture timestamp is valid RFC 3339")
        .with_timezone(&chrono::Utc)
}

/// Record holding text values, in the given order.
pub fn record(fields: &[(&str, &str)]) -> CellRecord {
    CellRecord::from_fields(fields.iter().copied())
}

/// Store from `(index, fields)` pairs.
pub fn store(cells: &[(usize, &[(&str, &str)])]) -> CellStore {
    cells
        .iter()
        .map(|(index, fields)| (*index, record(fields)))
        .collect()
}

fn samples_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("samples")
}

/// Raw JSON of a sample draft.
pub fn sample_json(name: &str) -> Result<Value> {
    let path = samples_dir().join(name);
    let content = std::fs::read_to_string(&path)
        .with_context(|| format!("Failed to read sample: {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse sample: {}", path.display()))
}

/// Sample draft hydrated into a store.
pub fn sample_store(name: &str) -> Result<CellStore> {
    let raw = sample_json(name)?;
    Ok(CellStore::from_json_value(raw)?)
}
