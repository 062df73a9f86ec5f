//! Tests for the data source cascade

use std::fs;
use std::path::Path;
use std::sync::Arc;

use tempfile::TempDir;

use mindmap::application::services::{
    DataSource, FallbackSource, FileSource, InjectedSource, Provenance, SourceChain,
};
use mindmap::domain::DEFAULT_COLLAPSE_DEPTH;
use mindmap::infrastructure::traits::{FileSystem, RealFileSystem};
use mindmap::util::testing;

const DOCUMENT: &str = r#"{
  "timestamp": "2025-03-01T12:00:00.000Z",
  "nodes": [
    {"id": "1", "parentId": null, "label": "Root"},
    {"id": "2", "parentId": "1", "label": "Child", "url": "https://example.com"}
  ]
}"#;

fn chain(injected: Option<&str>, data_file: &Path) -> SourceChain {
    let fs: Arc<dyn FileSystem> = Arc::new(RealFileSystem);
    SourceChain::new(
        vec![
            Box::new(InjectedSource::new(injected.map(str::to_string))),
            Box::new(FileSource::new(fs, data_file)),
            Box::new(FallbackSource),
        ],
        DEFAULT_COLLAPSE_DEPTH,
    )
}

#[test]
fn given_data_file_when_loading_then_uses_local_file_with_sync_time() {
    testing::init_test_setup();

    // Arrange
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, DOCUMENT).unwrap();

    // Act
    let dataset = chain(None, &data_file).load().expect("load");

    // Assert
    assert_eq!(dataset.provenance, Provenance::LocalFile);
    assert_eq!(dataset.synced_at.as_deref(), Some("2025-03-01T12:00:00.000Z"));
    assert_eq!(dataset.tree.len(), 2);
    assert_eq!(dataset.record_count, 2);
}

#[test]
fn given_bare_array_file_when_loading_then_accepted_without_sync_time() {
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, r#"[{"id": "1", "label": "Only"}]"#).unwrap();

    let dataset = chain(None, &data_file).load().expect("load");

    assert_eq!(dataset.provenance, Provenance::LocalFile);
    assert_eq!(dataset.synced_at, None);
    assert_eq!(dataset.tree.len(), 1);
}

#[test]
fn given_no_data_file_when_loading_then_falls_back_to_builtin_node() {
    testing::init_test_setup();

    let temp = TempDir::new().unwrap();

    let dataset = chain(None, &temp.path().join("data.json"))
        .load()
        .expect("load");

    assert_eq!(dataset.provenance, Provenance::Fallback);
    assert_eq!(dataset.provenance.to_string(), "Fallback (Code)");
    let root = dataset.tree.root_node().expect("root");
    assert_eq!(root.data.name, "Knowledge Explorer");
    assert_eq!(dataset.tree.len(), 1);
}

#[test]
fn given_corrupt_data_file_when_loading_then_falls_back() {
    testing::init_test_setup();

    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, "{ not json").unwrap();

    let dataset = chain(None, &data_file).load().expect("load");

    assert_eq!(dataset.provenance, Provenance::Fallback);
}

#[test]
fn given_data_file_without_usable_records_when_loading_then_falls_back() {
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, r#"{"nodes": [{"label": "no id"}]}"#).unwrap();

    let dataset = chain(None, &data_file).load().expect("load");

    assert_eq!(dataset.provenance, Provenance::Fallback);
}

#[test]
fn given_injected_records_when_loading_then_take_precedence_over_file() {
    testing::init_test_setup();

    // Arrange
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, DOCUMENT).unwrap();
    let injected = r#"[{"id": "a", "label": "Injected root"}, {"id": "b", "parentId": "a", "label": "B"}, {"id": "c", "parentId": "a", "label": "C"}]"#;

    // Act
    let dataset = chain(Some(injected), &data_file).load().expect("load");

    // Assert
    assert_eq!(dataset.provenance, Provenance::Injected);
    assert_eq!(dataset.tree.len(), 3);
    assert_eq!(
        dataset.tree.root_node().map(|r| r.data.name.as_str()),
        Some("Injected root")
    );
}

#[test]
fn given_malformed_injection_when_loading_then_next_source_used() {
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, DOCUMENT).unwrap();

    let dataset = chain(Some("not json"), &data_file).load().expect("load");

    assert_eq!(dataset.provenance, Provenance::LocalFile);
}

#[test]
fn given_empty_chain_when_loading_then_config_error() {
    let chain = SourceChain::new(Vec::new(), DEFAULT_COLLAPSE_DEPTH);
    assert!(chain.load().is_err());
}

#[test]
fn given_file_source_when_file_missing_then_offers_nothing() {
    let temp = TempDir::new().unwrap();
    let source = FileSource::new(Arc::new(RealFileSystem), temp.path().join("absent.json"));

    assert_eq!(source.provenance(), Provenance::LocalFile);
    assert_eq!(source.fetch().expect("fetch"), None);
}
