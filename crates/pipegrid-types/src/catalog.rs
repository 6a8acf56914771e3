//! Static reference tables: quick-add field templates per pipeline kind and
//! the field → glyph table used for compact cell summaries.
//!
//! These are plain immutable values handed to whoever needs them, so two
//! timelines in the same review never share hidden state.

use crate::error::Error;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Process a timeline documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelineKind {
    Culture,
    Curing,
    Separation,
    Purification,
}

impl PipelineKind {
    pub const ALL: [PipelineKind; 4] = [
        PipelineKind::Culture,
        PipelineKind::Curing,
        PipelineKind::Separation,
        PipelineKind::Purification,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PipelineKind::Culture => "culture",
            PipelineKind::Curing => "curing",
            PipelineKind::Separation => "separation",
            PipelineKind::Purification => "purification",
        }
    }
}

impl fmt::Display for PipelineKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for PipelineKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PipelineKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| Error::InvalidConfig(format!("unknown pipeline kind: {}", s)))
    }
}

/// One named group of the quick-add template.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldCategory {
    pub name: String,
    pub fields: Vec<String>,
}

impl FieldCategory {
    pub fn new(name: impl Into<String>, fields: &[&str]) -> Self {
        Self {
            name: name.into(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
        }
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.iter().any(|f| f == field)
    }
}

/// Ordered category → field catalog offered when adding data to a cell.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldCatalog {
    categories: Vec<FieldCategory>,
}

impl FieldCatalog {
    pub fn new(categories: Vec<FieldCategory>) -> Self {
        Self { categories }
    }

    /// Built-in template for a pipeline kind.
    pub fn builtin(kind: PipelineKind) -> Self {
        let categories = match kind {
            PipelineKind::Culture => vec![
                FieldCategory::new("Environnement", &["temperature", "humidity", "co2", "light"]),
                FieldCategory::new("Irrigation", &["frequency", "volume", "ph", "ec"]),
                FieldCategory::new("Nutrition", &["fertilizer_type", "dosage", "brand"]),
                FieldCategory::new("Lumière", &["lamp_type", "ppfd", "kelvin", "distance"]),
                FieldCategory::new("Notes", &["observations", "issues", "actions"]),
            ],
            PipelineKind::Curing => vec![
                FieldCategory::new("Température", &["temperature", "humidity", "packaging"]),
                FieldCategory::new("Observations", &["color", "smell", "texture", "notes"]),
            ],
            PipelineKind::Separation => vec![
                FieldCategory::new(
                    "Processus",
                    &["method", "temperature", "mesh_size", "duration"],
                ),
                FieldCategory::new("Résultats", &["yield_percentage", "purity", "quality_score"]),
            ],
            PipelineKind::Purification => vec![
                FieldCategory::new(
                    "Méthode",
                    &["method_type", "temperature", "solvent", "duration"],
                ),
                FieldCategory::new(
                    "Résultats",
                    &["purity_score", "recovery_percentage", "color"],
                ),
            ],
        };
        Self { categories }
    }

    pub fn categories(&self) -> &[FieldCategory] {
        &self.categories
    }

    pub fn category(&self, name: &str) -> Option<&FieldCategory> {
        self.categories.iter().find(|c| c.name == name)
    }

    /// Name of the first category offering `field`.
    pub fn category_of(&self, field: &str) -> Option<&str> {
        self.categories
            .iter()
            .find(|c| c.contains(field))
            .map(|c| c.name.as_str())
    }
}

/// Display label of a field name: `fertilizer_type` → `fertilizer type`.
pub fn field_label(field: &str) -> String {
    field.replace('_', " ")
}

const BUILTIN_GLYPHS: [(&str, &str); 24] = [
    ("temperature", "🌡️"),
    ("humidity", "💧"),
    ("co2", "🫧"),
    ("ventilation", "🌀"),
    ("light", "💡"),
    ("lightType", "💡"),
    ("lightHours", "💡"),
    ("irrigation", "💧"),
    ("waterVolume", "💧"),
    ("fertilizer", "🧪"),
    ("training", "✂️"),
    ("morphology", "📏"),
    ("harvest", "⚖️"),
    ("containerType", "📦"),
    ("packaging", "📦"),
    ("curingType", "🌡️"),
    ("notes", "📝"),
    ("ph", "⚗️"),
    ("ec", "⚡"),
    ("propagationMethod", "🌱"),
    ("substrateType", "🏔️"),
    ("potVolume", "🪴"),
    ("lightPower", "⚡"),
    ("lightDistance", "📏"),
];

/// Field name → summary glyph.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GlyphTable {
    glyphs: IndexMap<String, String>,
}

impl GlyphTable {
    pub fn empty() -> Self {
        Self {
            glyphs: IndexMap::new(),
        }
    }

    pub fn glyph(&self, field: &str) -> Option<&str> {
        self.glyphs.get(field).map(String::as_str)
    }

    /// New table with `overrides` layered over this one.
    pub fn merged<K, V>(&self, overrides: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut glyphs = self.glyphs.clone();
        for (field, glyph) in overrides {
            glyphs.insert(field.into(), glyph.into());
        }
        Self { glyphs }
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }
}

impl Default for GlyphTable {
    fn default() -> Self {
        Self::empty().merged(BUILTIN_GLYPHS)
    }
}
