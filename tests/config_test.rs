//! Integration tests for layered Settings loading.
//!
//! These tests use temp project directories only; a global config on the
//! test machine would sit between the defaults and the local file.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use rstest::rstest;
use tempfile::TempDir;

use mindmap::application::services::Provenance;
use mindmap::application::ApplicationError;
use mindmap::config::{local_config_path, Settings};
use mindmap::infrastructure::traits::{HttpClient, HttpError, RealFileSystem};
use mindmap::infrastructure::ServiceContainer;
use mindmap::util::testing;

struct NoHttp;

impl HttpClient for NoHttp {
    fn get(&self, url: &str) -> Result<String, HttpError> {
        Err(HttpError::Transport(format!("offline: {url}")))
    }
}

#[test]
fn given_local_config_when_loading_then_overrides_defaults() {
    testing::init_test_setup();

    // Arrange
    let project = TempDir::new().unwrap();
    let local = r#"
collapse_depth = 3
data_file = "maps/tree.json"

[layout]
rank_separation = 500.0

[zoom]
max = 4.0

[sync]
url = "https://example.com/export"
"#;
    fs::write(local_config_path(project.path()), local).unwrap();

    // Act
    let settings = Settings::load(Some(project.path())).expect("load settings");

    // Assert
    assert_eq!(settings.collapse_depth, 3);
    assert_eq!(settings.layout.rank_separation, 500.0);
    assert_eq!(settings.layout.sibling_separation, 220.0);
    assert_eq!(settings.zoom.max, 4.0);
    assert_eq!(settings.zoom.min, 0.1);
    assert_eq!(settings.sync.url.as_deref(), Some("https://example.com/export"));
    assert_eq!(
        settings.data_path(project.path()),
        project.path().join("maps/tree.json")
    );
}

#[test]
fn given_invalid_local_config_when_loading_then_config_error() {
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), "collapse_depth = \"deep\"").unwrap();

    let result = Settings::load(Some(project.path()));

    assert!(result.is_err());
}

#[rstest]
#[case("[zoom]\nmin = 3.0\nmax = 0.1\n")]
#[case("[zoom]\nmin = 0.0\n")]
#[case("[zoom]\nmax = -1.0\n")]
fn given_unusable_zoom_bounds_when_loading_then_config_error(#[case] local: &str) {
    testing::init_test_setup();

    // Arrange
    let project = TempDir::new().unwrap();
    fs::write(local_config_path(project.path()), local).unwrap();

    // Act
    let result = Settings::load(Some(project.path()));

    // Assert
    assert!(
        matches!(result, Err(ApplicationError::Config { ref message }) if message.contains("zoom")),
        "got {result:?}"
    );
}

#[test]
fn given_settings_when_rendering_toml_then_round_trips_through_local_config() {
    testing::init_test_setup();

    // Arrange
    let project = TempDir::new().unwrap();
    let mut settings = Settings::default();
    settings.collapse_depth = 4;
    settings.animation.enter_ms = 250.0;

    // Act
    fs::write(
        local_config_path(project.path()),
        settings.to_toml().expect("toml"),
    )
    .unwrap();
    let loaded = Settings::load(Some(project.path())).expect("load settings");

    // Assert
    assert_eq!(loaded.collapse_depth, 4);
    assert_eq!(loaded.animation.enter_ms, 250.0);
    assert_eq!(loaded.data_file, PathBuf::from("data.json"));
}

#[test]
fn given_configured_data_file_when_loading_dataset_then_container_reads_it() {
    testing::init_test_setup();

    // Arrange
    let project = TempDir::new().unwrap();
    fs::write(
        local_config_path(project.path()),
        "data_file = \"tree.json\"\n",
    )
    .unwrap();
    fs::write(
        project.path().join("tree.json"),
        r#"[{"id": "r", "label": "Configured"}]"#,
    )
    .unwrap();
    let settings = Settings::load(Some(project.path())).expect("load settings");

    // Act
    let container = ServiceContainer::with_deps(
        settings,
        project.path(),
        Arc::new(RealFileSystem),
        Arc::new(NoHttp),
    );
    let dataset = container.source_chain().load().expect("load");

    // Assert
    assert_eq!(container.data_path(), project.path().join("tree.json"));
    assert_ne!(dataset.provenance, Provenance::Fallback);
    assert_eq!(
        dataset.tree.root_node().map(|r| r.data.name.as_str()),
        Some("Configured")
    );
}
