use pipegrid_engine::PageSize;
use pipegrid_runtime::{ReviewBoard, Settings};
use pipegrid_testing::fixtures::{fixed_clock, sample_store};
use pipegrid_types::PipelineKind;
use tempfile::TempDir;

const SETTINGS: &str = r#"
page_size = 14
readonly = false

[pipelines.culture]
interval_type = "phases"
max_cells = 12
"#;

#[test]
fn test_settings_file_to_persisted_snapshot() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("config.toml");
    std::fs::write(&path, SETTINGS)?;

    let settings = Settings::load_from(&path)?;
    assert_eq!(settings.page_size, PageSize::COMPACT);

    let mut board = ReviewBoard::from_settings(&settings)?.with_clock(fixed_clock);
    assert!(board.hydrate(PipelineKind::Culture, sample_store("culture_draft.json")?));

    let culture = board
        .controller_mut(PipelineKind::Culture)
        .expect("culture is configured");
    assert_eq!(culture.summary(), "12 phases");
    assert!(!culture.can_add_cells());
    assert!(culture.select_cell(2));
    assert!(culture.commit_field("ph", "6.3").is_some());

    insta::assert_json_snapshot!(board.snapshot(), @r#"
    {
      "culture": {
        "0": {
          "propagationMethod": "graine",
          "substrateType": "terre",
          "timestamp": "2025-02-03T09:12:44.512Z"
        },
        "1": {
          "temperature": "24",
          "humidity": "70",
          "light": "18/6",
          "timestamp": "2025-02-10T19:01:02.000Z"
        },
        "2": {
          "ph": "6.3",
          "timestamp": "2025-03-01T08:30:00.000Z"
        },
        "3": {
          "temperature": "25",
          "humidity": "60",
          "co2": "900",
          "ph": "6.2",
          "ec": "1.4",
          "notes": "premiers pistils",
          "training": "LST",
          "timestamp": "2025-02-24T07:45:00.000Z"
        },
        "4": {
          "timestamp": "2025-03-03T07:45:00.000Z"
        },
        "7": {}
      }
    }
    "#);
    Ok(())
}

#[test]
fn test_saved_settings_rebuild_the_same_board() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("pipegrid").join("config.toml");

    let settings = Settings::from_toml_str(SETTINGS)?;
    settings.save_to(&path)?;

    let board = ReviewBoard::from_settings(&Settings::load_from(&path)?)?;
    let culture = board.controller(PipelineKind::Culture).expect("culture is configured");
    assert_eq!(culture.total_pages(), 1);
    assert_eq!(culture.visible_cells().len(), 12);
    Ok(())
}
