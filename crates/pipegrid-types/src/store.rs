use crate::error::Result;
use crate::record::CellRecord;
use serde::de::Deserializer;
use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Position of a cell on the timeline (0-based).
pub type CellIndex = usize;

/// All cell data of one pipeline, keyed by cell index.
///
/// The store belongs to the caller. Mutations never happen in place: each
/// operation returns a new store with one index replaced, so a caller that
/// compares old and new values always sees the change. Absent and empty
/// cells display the same way, but only present cells are serialized.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CellStore {
    cells: BTreeMap<CellIndex, CellRecord>,
}

impl CellStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, index: CellIndex) -> Option<&CellRecord> {
        self.cells.get(&index)
    }

    pub fn contains(&self, index: CellIndex) -> bool {
        self.cells.contains_key(&index)
    }

    /// New store with `record` placed at `index`.
    pub fn with_record(&self, index: CellIndex, record: CellRecord) -> Self {
        let mut cells = self.cells.clone();
        cells.insert(index, record);
        Self { cells }
    }

    /// New store without any entry at `index`.
    pub fn without_cell(&self, index: CellIndex) -> Self {
        let mut cells = self.cells.clone();
        cells.remove(&index);
        Self { cells }
    }

    /// New store with every `(index, record)` placed, in one copy.
    pub fn with_records(&self, records: impl IntoIterator<Item = (CellIndex, CellRecord)>) -> Self {
        let mut cells = self.cells.clone();
        cells.extend(records);
        Self { cells }
    }

    /// New store without any of `indices`.
    pub fn without_cells(&self, indices: impl IntoIterator<Item = CellIndex>) -> Self {
        let mut cells = self.cells.clone();
        for index in indices {
            cells.remove(&index);
        }
        Self { cells }
    }

    /// Number of present cells (not the logical timeline length).
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn indices(&self) -> impl Iterator<Item = CellIndex> + '_ {
        self.cells.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (CellIndex, &CellRecord)> {
        self.cells.iter().map(|(index, record)| (*index, record))
    }

    /// Number of cells holding at least one non-reserved field.
    pub fn populated_count(&self) -> usize {
        self.cells.values().filter(|record| record.has_data()).count()
    }

    pub fn to_json_value(&self) -> Result<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    pub fn from_json_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl FromIterator<(CellIndex, CellRecord)> for CellStore {
    fn from_iter<I: IntoIterator<Item = (CellIndex, CellRecord)>>(iter: I) -> Self {
        Self {
            cells: iter.into_iter().collect(),
        }
    }
}

impl Serialize for CellStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.cells.len()))?;
        for (index, record) in &self.cells {
            map.serialize_entry(&index.to_string(), record)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for CellStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let raw = serde_json::Value::deserialize(deserializer)?;
        let serde_json::Value::Object(entries) = raw else {
            tracing::warn!("cell store is not an object, reading it as empty");
            return Ok(Self::default());
        };

        let mut cells = BTreeMap::new();
        for (key, value) in entries {
            match key.trim().parse::<CellIndex>() {
                Ok(index) => {
                    cells.insert(index, CellRecord::from(value));
                }
                Err(_) => {
                    tracing::warn!(key = %key, "skipping cell with non-numeric index");
                }
            }
        }
        Ok(Self { cells })
    }
}
