//! Custom assertions for timeline validation.
//!
//! Provides high-level assertions that make tests more readable:
//! - Projected cell checks (label, bucket, glyphs)
//! - Store content checks

use anyhow::{Context, Result};
use pipegrid_engine::VisibleCell;
use pipegrid_types::{CellIndex, CellStore, CellValue};

fn find_cell(cells: &[VisibleCell], index: CellIndex) -> Result<&VisibleCell> {
    cells
        .iter()
        .find(|c| c.index == index)
        .with_context(|| format!("Cell {} is not on the visible page", index))
}

/// Assert label and density bucket of a projected cell.
pub fn assert_cell(
    cells: &[VisibleCell],
    index: CellIndex,
    label: &str,
    bucket: u8,
) -> Result<()> {
    let cell = find_cell(cells, index)?;
    if cell.label != label {
        anyhow::bail!("Cell {} has label {:?}, expected {:?}", index, cell.label, label);
    }
    if cell.bucket != bucket {
        anyhow::bail!("Cell {} has bucket {}, expected {}", index, cell.bucket, bucket);
    }
    Ok(())
}

/// Assert the summary glyphs of a projected cell, in order.
pub fn assert_glyphs(cells: &[VisibleCell], index: CellIndex, expected: &[&str]) -> Result<()> {
    let cell = find_cell(cells, index)?;
    if cell.icons != expected {
        anyhow::bail!("Cell {} shows {:?}, expected {:?}", index, cell.icons, expected);
    }
    Ok(())
}

/// Assert that `field` of cell `index` holds `expected` text.
pub fn assert_field(store: &CellStore, index: CellIndex, field: &str, expected: &str) -> Result<()> {
    let record = store
        .get(index)
        .with_context(|| format!("Cell {} is absent", index))?;
    match record.get(field) {
        Some(CellValue::Text(value)) if value == expected => Ok(()),
        other => anyhow::bail!(
            "Cell {} field {} is {:?}, expected {:?}",
            index,
            field,
            other,
            expected
        ),
    }
}
