use crate::intensity::IntensityClassifier;
use pipegrid_types::{CellConfig, CellIndex, CellStore};
use serde::{Deserialize, Serialize};

/// Everything a grid needs to draw one cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisibleCell {
    pub index: CellIndex,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    pub bucket: u8,
    pub icons: Vec<String>,
    pub has_data: bool,
    pub selected: bool,
}

/// Build display cells for `indices`. Reads only; safe to call on every render.
pub fn project_cells(
    config: &CellConfig,
    store: &CellStore,
    classifier: &IntensityClassifier,
    indices: &[CellIndex],
    selected: Option<CellIndex>,
) -> Vec<VisibleCell> {
    indices
        .iter()
        .map(|&index| {
            let record = store.get(index);
            let intensity = classifier.classify_cell(record);
            let position = i64::try_from(index).unwrap_or(i64::MAX);

            VisibleCell {
                index,
                label: config.label_for(position),
                icon: config.icon_for(position),
                bucket: intensity.bucket,
                icons: intensity.icons,
                has_data: record.is_some_and(|r| r.has_data()),
                selected: selected == Some(index),
            }
        })
        .collect()
}
