use crate::error::{Error, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Scheme used to turn a cell index into a human label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IntervalType {
    /// Named process phases (germination, growth, flowering...)
    Phases,
    /// One cell per week, labelled `S1`, `S2`...
    Weeks,
    /// One cell per month, labelled with the French month abbreviation
    Months,
    /// Plain running count, labelled `1`, `2`...
    Linear,
}

impl IntervalType {
    /// Length used when the caller gives neither a cell count nor a duration.
    fn default_length(self) -> usize {
        match self {
            IntervalType::Phases => DEFAULT_PHASES.len(),
            IntervalType::Weeks => 12,
            IntervalType::Months => 6,
            IntervalType::Linear => 90,
        }
    }

    /// Largest timeline the configuration step offers for this scheme.
    fn max_length(self) -> usize {
        match self {
            IntervalType::Phases => DEFAULT_PHASES.len(),
            IntervalType::Weeks => 52,
            IntervalType::Months => 12,
            IntervalType::Linear => 365,
        }
    }

    fn unit_label(self) -> &'static str {
        match self {
            IntervalType::Phases => "phases",
            IntervalType::Weeks => "semaines",
            IntervalType::Months => "mois",
            IntervalType::Linear => "jours",
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IntervalType::Phases => "phases",
            IntervalType::Weeks => "weeks",
            IntervalType::Months => "months",
            IntervalType::Linear => "linear",
        };
        write!(f, "{}", name)
    }
}

/// A named process phase with its display icon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl Phase {
    pub fn new(name: impl Into<String>, icon: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: Some(icon.into()),
        }
    }
}

const DEFAULT_PHASES: [(&str, &str); 12] = [
    ("Graine", "🌰"),
    ("Germination", "🌱"),
    ("Plantule", "🌿"),
    ("Début Croissance", "🌳"),
    ("Milieu Croissance", "🌲"),
    ("Fin Croissance", "🎋"),
    ("Début Stretch", "📈"),
    ("Milieu Stretch", "📈"),
    ("Fin Stretch", "📈"),
    ("Début Floraison", "🌸"),
    ("Milieu Floraison", "🌺"),
    ("Fin Floraison", "💐"),
];

const MONTH_ABBREVIATIONS: [&str; 12] = [
    "Jan", "Fév", "Mar", "Avr", "Mai", "Jun", "Jul", "Aou", "Sep", "Oct", "Nov", "Déc",
];

/// Phase labels are cut to this many characters to fit a grid cell.
const PHASE_LABEL_CHARS: usize = 8;

/// The built-in twelve-phase culture sequence.
pub fn default_phases() -> Vec<Phase> {
    DEFAULT_PHASES
        .iter()
        .map(|(name, icon)| Phase::new(*name, *icon))
        .collect()
}

/// Timeline description as handed over by the "configure your timeline" step.
///
/// Either `total_cells` or `duration` sizes the timeline; with neither, the
/// scheme's default length applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimelineInput {
    pub interval_type: IntervalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cells: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_phases: Option<Vec<Phase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

/// Static description of a timeline: how many cells it has and how each
/// index maps to a label and an icon.
///
/// Lookups are total. Any index, including one past the end or negative,
/// yields a deterministic fallback so a config that shrank after cells were
/// filled never breaks rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CellConfig {
    pub interval_type: IntervalType,
    pub total_cells: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_phases: Option<Vec<Phase>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
}

impl CellConfig {
    pub fn new(interval_type: IntervalType, total_cells: usize) -> Self {
        Self {
            interval_type,
            total_cells,
            custom_phases: None,
            start_date: None,
        }
    }

    pub fn weeks(total_cells: usize) -> Self {
        Self::new(IntervalType::Weeks, total_cells)
    }

    pub fn months(total_cells: usize) -> Self {
        Self::new(IntervalType::Months, total_cells)
    }

    pub fn linear(total_cells: usize) -> Self {
        Self::new(IntervalType::Linear, total_cells)
    }

    /// Phase timeline over the built-in sequence, one cell per phase.
    pub fn phases() -> Self {
        Self::new(IntervalType::Phases, DEFAULT_PHASES.len())
    }

    /// Phase timeline over a custom sequence, one cell per phase.
    pub fn custom_phases(phases: Vec<Phase>) -> Self {
        Self {
            interval_type: IntervalType::Phases,
            total_cells: phases.len(),
            custom_phases: Some(phases),
            start_date: None,
        }
    }

    pub fn with_start_date(mut self, date: NaiveDate) -> Self {
        self.start_date = Some(date);
        self
    }

    /// Resolve and validate a caller-supplied timeline description.
    pub fn from_input(input: TimelineInput) -> Result<Self> {
        let phase_count = input.custom_phases.as_ref().map(Vec::len);
        let default_length = match (input.interval_type, phase_count) {
            (IntervalType::Phases, Some(n)) => n,
            (interval, _) => interval.default_length(),
        };
        let total_cells = input
            .total_cells
            .or(input.duration)
            .unwrap_or(default_length);

        let config = Self {
            interval_type: input.interval_type,
            total_cells,
            custom_phases: input.custom_phases,
            start_date: input.start_date,
        };
        config.validate()?;
        Ok(config)
    }

    /// Largest number of cells this configuration may hold.
    pub fn capacity(&self) -> usize {
        match (self.interval_type, &self.custom_phases) {
            (IntervalType::Phases, Some(phases)) => phases.len(),
            (interval, _) => interval.max_length(),
        }
    }

    pub fn validate(&self) -> Result<()> {
        let capacity = self.capacity();
        if self.total_cells > capacity {
            return Err(Error::InvalidConfig(format!(
                "{} cells requested but a {} timeline holds at most {}",
                self.total_cells, self.interval_type, capacity
            )));
        }
        Ok(())
    }

    /// Human label of a cell. Never fails.
    pub fn label_for(&self, index: i64) -> String {
        match self.interval_type {
            IntervalType::Phases => self
                .phase_at(index, |phase| {
                    let label: String = phase.name.chars().take(PHASE_LABEL_CHARS).collect();
                    (!label.is_empty()).then_some(label)
                })
                .unwrap_or_else(|| format!("P{}", index.saturating_add(1))),
            IntervalType::Weeks => format!("S{}", index.saturating_add(1)),
            IntervalType::Months => {
                MONTH_ABBREVIATIONS[index.rem_euclid(12) as usize].to_string()
            }
            IntervalType::Linear => index.saturating_add(1).to_string(),
        }
    }

    /// Icon of a cell; only phase timelines carry icons.
    pub fn icon_for(&self, index: i64) -> Option<String> {
        match self.interval_type {
            IntervalType::Phases => self.phase_at(index, |phase| {
                phase.icon.clone().filter(|icon| !icon.is_empty())
            }),
            _ => None,
        }
    }

    /// First non-empty answer from the custom phase, then the built-in one.
    fn phase_at<T>(&self, index: i64, pick: impl Fn(&Phase) -> Option<T>) -> Option<T> {
        let index = usize::try_from(index).ok()?;
        let custom = self
            .custom_phases
            .as_ref()
            .and_then(|phases| phases.get(index))
            .and_then(&pick);
        custom.or_else(|| {
            DEFAULT_PHASES
                .get(index)
                .map(|(name, icon)| Phase::new(*name, *icon))
                .and_then(|phase| pick(&phase))
        })
    }

    /// Short description of the whole timeline, e.g. `12 semaines`.
    pub fn summary(&self) -> String {
        format!("{} {}", self.total_cells, self.interval_type.unit_label())
    }
}
