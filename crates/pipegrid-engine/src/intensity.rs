use pipegrid_types::{CellRecord, GlyphTable};
use serde::{Deserialize, Serialize};

/// Highest density bucket.
pub const MAX_BUCKET: u8 = 4;

/// Summary glyphs shown per cell unless configured otherwise.
pub const DEFAULT_ICON_LIMIT: usize = 2;

/// Compact visual encoding of how much data a cell holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Intensity {
    /// Density step, 0 (empty) to 4 (seven or more fields).
    pub bucket: u8,
    /// Glyphs of the first recognised fields, in field order.
    pub icons: Vec<String>,
    /// Number of truthy, non-reserved fields the bucket was derived from.
    pub field_count: usize,
}

impl Intensity {
    pub fn empty() -> Self {
        Self {
            bucket: 0,
            icons: Vec::new(),
            field_count: 0,
        }
    }

    /// Single-glyph density marker used by the dense grid layout.
    pub fn marker(&self) -> char {
        match self.field_count {
            0 => '◯',
            1 => '●',
            2..=3 => '◉',
            _ => '◈',
        }
    }
}

/// Map a field count onto the five density steps.
///
/// Pairs of fields share a step so the grid stays readable with five shades
/// instead of a continuous scale.
pub fn bucket_for(count: usize) -> u8 {
    match count {
        0 => 0,
        1..=2 => 1,
        3..=4 => 2,
        5..=6 => 3,
        _ => MAX_BUCKET,
    }
}

/// Scores cell records for compact rendering.
///
/// Pure: holds only the immutable glyph table and icon limit it was built
/// with, so the same record always classifies the same way.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IntensityClassifier {
    glyphs: GlyphTable,
    icon_limit: usize,
}

impl Default for IntensityClassifier {
    fn default() -> Self {
        Self::new(GlyphTable::default())
    }
}

impl IntensityClassifier {
    pub fn new(glyphs: GlyphTable) -> Self {
        Self {
            glyphs,
            icon_limit: DEFAULT_ICON_LIMIT,
        }
    }

    /// Cap the number of summary glyphs (the narrow mobile strip shows one).
    pub fn with_icon_limit(mut self, limit: usize) -> Self {
        self.icon_limit = limit;
        self
    }

    pub fn glyphs(&self) -> &GlyphTable {
        &self.glyphs
    }

    pub fn icon_limit(&self) -> usize {
        self.icon_limit
    }

    pub fn classify(&self, record: &CellRecord) -> Intensity {
        let field_count = record.truthy_count();
        let icons = record
            .truthy_entries()
            .filter_map(|(name, _)| self.glyphs.glyph(name))
            .take(self.icon_limit)
            .map(str::to_string)
            .collect();

        Intensity {
            bucket: bucket_for(field_count),
            icons,
            field_count,
        }
    }

    /// Absent cells score like empty ones.
    pub fn classify_cell(&self, record: Option<&CellRecord>) -> Intensity {
        record
            .map(|r| self.classify(r))
            .unwrap_or_else(Intensity::empty)
    }
}
