use crate::{Error, Result};
use chrono::NaiveDate;
use pipegrid_engine::{DEFAULT_ICON_LIMIT, PageSize};
use pipegrid_types::{CellConfig, IntervalType, Phase, PipelineKind, TimelineInput};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Environment variable pointing at an alternate settings file.
pub const CONFIG_ENV: &str = "PIPEGRID_CONFIG";

/// Resolve the settings file path based on priority:
/// 1. Explicit path
/// 2. PIPEGRID_CONFIG environment variable
/// 3. Platform config directory (`<config dir>/pipegrid/config.toml`)
pub fn resolve_config_path(explicit_path: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit_path {
        return Ok(path.to_path_buf());
    }

    if let Some(env_path) = std::env::var_os(CONFIG_ENV) {
        return Ok(PathBuf::from(env_path));
    }

    if let Some(config_dir) = dirs::config_dir() {
        return Ok(config_dir.join("pipegrid").join("config.toml"));
    }

    Err(Error::Config(
        "Could not determine settings path: set PIPEGRID_CONFIG or a platform config directory"
            .to_string(),
    ))
}

/// Timeline setup of one pipeline section, as stored under `[pipelines.<kind>]`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSettings {
    pub interval_type: IntervalType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_cells: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<usize>,
    /// Written as a quoted `YYYY-MM-DD` string.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    /// Host-side cap checked before the timeline grows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cells: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_phases: Option<Vec<Phase>>,
}

impl PipelineSettings {
    pub fn new(interval_type: IntervalType) -> Self {
        Self {
            interval_type,
            total_cells: None,
            duration: None,
            start_date: None,
            max_cells: None,
            custom_phases: None,
        }
    }

    pub fn with_total_cells(mut self, total_cells: usize) -> Self {
        self.total_cells = Some(total_cells);
        self
    }

    pub fn with_max_cells(mut self, max_cells: usize) -> Self {
        self.max_cells = Some(max_cells);
        self
    }

    pub fn with_custom_phases(mut self, phases: Vec<Phase>) -> Self {
        self.custom_phases = Some(phases);
        self
    }

    pub fn cell_config(&self) -> Result<CellConfig> {
        let input = TimelineInput {
            interval_type: self.interval_type,
            total_cells: self.total_cells,
            duration: self.duration,
            custom_phases: self.custom_phases.clone(),
            start_date: self.start_date,
        };
        Ok(CellConfig::from_input(input)?)
    }
}

fn default_icon_limit() -> usize {
    DEFAULT_ICON_LIMIT
}

/// Settings file of the timeline editor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub page_size: PageSize,
    #[serde(default = "default_icon_limit")]
    pub icon_limit: usize,
    #[serde(default)]
    pub readonly: bool,
    /// Field → glyph overrides layered over the built-in table.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub glyphs: BTreeMap<String, String>,
    /// Keyed by pipeline kind name (`culture`, `curing`, ...).
    #[serde(default)]
    pub pipelines: BTreeMap<String, PipelineSettings>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            page_size: PageSize::DEFAULT,
            icon_limit: DEFAULT_ICON_LIMIT,
            readonly: false,
            glyphs: BTreeMap::new(),
            pipelines: BTreeMap::new(),
        }
    }
}

impl Settings {
    pub fn load() -> Result<Self> {
        let path = Self::default_path()?;
        Self::load_from(&path)
    }

    /// A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let settings: Settings = toml::from_str(content)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::default_path()?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        std::fs::write(path, self.to_toml_string()?)?;
        Ok(())
    }

    pub fn default_path() -> Result<PathBuf> {
        resolve_config_path(None)
    }

    pub fn pipeline(&self, kind: PipelineKind) -> Option<&PipelineSettings> {
        self.pipelines.get(kind.as_str())
    }

    pub fn set_pipeline(&mut self, kind: PipelineKind, settings: PipelineSettings) {
        self.pipelines.insert(kind.as_str().to_string(), settings);
    }

    /// Configured pipeline sections in kind order.
    pub fn configured(&self) -> Result<Vec<(PipelineKind, &PipelineSettings)>> {
        let mut configured = self
            .pipelines
            .iter()
            .map(|(name, settings)| {
                let kind = name
                    .parse::<PipelineKind>()
                    .map_err(|_| Error::Config(format!("unknown pipeline table [pipelines.{}]", name)))?;
                Ok((kind, settings))
            })
            .collect::<Result<Vec<_>>>()?;
        configured.sort_by_key(|(kind, _)| *kind);
        Ok(configured)
    }

    /// Reject unknown pipeline tables and timelines that cannot be built.
    pub fn validate(&self) -> Result<()> {
        for (_, pipeline) in self.configured()? {
            pipeline.cell_config()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_settings_default() {
        let settings = Settings::default();
        assert_eq!(settings.page_size, PageSize::DEFAULT);
        assert_eq!(settings.icon_limit, 2);
        assert!(!settings.readonly);
        assert!(settings.pipelines.is_empty());
    }

    #[test]
    fn test_settings_save_and_load() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nested").join("config.toml");

        let mut settings = Settings {
            page_size: PageSize::COMPACT,
            ..Settings::default()
        };
        settings.glyphs.insert("trichomes".to_string(), "🔬".to_string());
        settings.set_pipeline(
            PipelineKind::Culture,
            PipelineSettings::new(IntervalType::Weeks)
                .with_total_cells(16)
                .with_max_cells(40),
        );
        settings.set_pipeline(
            PipelineKind::Curing,
            PipelineSettings::new(IntervalType::Phases)
                .with_custom_phases(vec![Phase::new("Séchage", "🌬️"), Phase::new("Bocal", "🫙")]),
        );

        settings.save_to(&path)?;
        assert!(path.exists());

        let loaded = Settings::load_from(&path)?;
        assert_eq!(loaded, settings);
        assert_eq!(
            loaded.pipeline(PipelineKind::Culture).and_then(|p| p.max_cells),
            Some(40)
        );
        Ok(())
    }

    #[test]
    fn test_load_nonexistent_returns_default() -> Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("nonexistent.toml");

        let settings = Settings::load_from(&path)?;
        assert_eq!(settings, Settings::default());
        Ok(())
    }

    #[test]
    fn test_parse_hand_written_file() -> Result<()> {
        let settings = Settings::from_toml_str(
            r#"
page_size = 14
icon_limit = 1

[pipelines.culture]
interval_type = "months"
duration = 4
start_date = "2025-03-01"

[pipelines.purification]
interval_type = "linear"
"#,
        )?;

        assert_eq!(settings.page_size, PageSize::COMPACT);
        assert_eq!(settings.icon_limit, 1);

        let kinds: Vec<PipelineKind> = settings.configured()?.into_iter().map(|(k, _)| k).collect();
        assert_eq!(kinds, vec![PipelineKind::Culture, PipelineKind::Purification]);

        let culture = settings.pipeline(PipelineKind::Culture).unwrap().cell_config()?;
        assert_eq!(culture.total_cells, 4);
        assert_eq!(culture.start_date, NaiveDate::from_ymd_opt(2025, 3, 1));

        let purification = settings
            .pipeline(PipelineKind::Purification)
            .unwrap()
            .cell_config()?;
        assert_eq!(purification.total_cells, 90);
        Ok(())
    }

    #[test]
    fn test_unknown_pipeline_table_rejected() {
        let err = Settings::from_toml_str("[pipelines.drying]\ninterval_type = \"weeks\"\n")
            .unwrap_err();
        assert!(matches!(err, Error::Config(ref msg) if msg.contains("drying")));
    }

    #[test]
    fn test_oversized_timeline_rejected() {
        let err = Settings::from_toml_str(
            "[pipelines.curing]\ninterval_type = \"months\"\ntotal_cells = 24\n",
        )
        .unwrap_err();
        assert!(matches!(err, Error::Types(_)));
    }

    #[test]
    fn test_zero_page_size_rejected() {
        assert!(matches!(
            Settings::from_toml_str("page_size = 0\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_explicit_path_wins() -> Result<()> {
        let explicit = PathBuf::from("/tmp/pipegrid-test/config.toml");
        assert_eq!(resolve_config_path(Some(&explicit))?, explicit);
        Ok(())
    }
}
