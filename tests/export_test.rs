//! Tests for the CSV export bridge

use std::path::PathBuf;
use std::sync::Arc;

use tempfile::TempDir;

use mindmap::application::services::{
    DataSource, ExportResponse, ExportService, FileSource, Provenance, SourceChain, UNTITLED_ROW,
};
use mindmap::domain::DEFAULT_COLLAPSE_DEPTH;
use mindmap::infrastructure::traits::RealFileSystem;
use mindmap::util::testing;

fn sample_sheet() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/resources/sample_sheet.csv")
}

fn service() -> ExportService {
    ExportService::new(Arc::new(RealFileSystem))
}

#[test]
fn given_sample_sheet_when_exporting_then_rows_converted() {
    testing::init_test_setup();

    // Act
    let response = service().export(Some(&sample_sheet()));

    // Assert
    let ExportResponse::Converted {
        detected_headers,
        count,
        nodes,
        timestamp,
    } = &response
    else {
        panic!("expected conversion, got {response:?}");
    };
    assert_eq!(detected_headers.len(), 6);
    assert_eq!(*count, 5);
    assert_eq!(nodes.len(), 5);
    assert!(!timestamp.is_empty());

    let ids: Vec<&str> = nodes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["1", "2", "3", "4", "5"]);
    assert_eq!(nodes[0].parent_id, None);
    assert_eq!(nodes[1].parent_id.as_deref(), Some("1"));
    assert_eq!(nodes[2].image_url, "https://placehold.co/100x60");
    assert_eq!(nodes[3].label, UNTITLED_ROW);
    assert_eq!(nodes[4].label, "Q2 Expansion");
    assert_eq!(nodes[4].description, "Regional scaling, phase two");
}

#[test]
fn given_converted_response_when_serializing_then_uses_endpoint_field_names() {
    let response = service().export(Some(&sample_sheet()));

    let json = serde_json::to_value(&response).expect("serialize");

    assert_eq!(json["count"], 5);
    assert!(json["detectedHeaders"].is_array());
    assert_eq!(json["nodes"][1]["parentId"], "1");
    assert_eq!(json["nodes"][0]["parentId"], serde_json::Value::Null);
    assert!(json.get("error").is_none());
}

#[test]
fn given_missing_sheet_when_exporting_then_error_reported_in_response() {
    let temp = TempDir::new().unwrap();

    let missing = service().export(Some(&temp.path().join("absent.csv")));
    let unconfigured = service().export(None);

    assert!(missing.error().is_some());
    assert!(missing.nodes().is_empty());
    assert!(unconfigured
        .error()
        .is_some_and(|e| e.contains("no sheet configured")));
}

#[test]
fn given_converted_sheet_when_written_then_loads_as_local_data() {
    testing::init_test_setup();

    // Arrange
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("maps/data.json");
    let service = service();
    let response = service.export(Some(&sample_sheet()));

    // Act
    let written = service.write(&response, &data_file).expect("write");

    // Assert
    assert_eq!(written, data_file);
    let source = FileSource::new(Arc::new(RealFileSystem), &data_file);
    let data = source.fetch().expect("fetch").expect("data present");
    assert_eq!(data.records.len(), 5);
    assert!(data.timestamp.is_some());

    let fs = Arc::new(RealFileSystem);
    let dataset = SourceChain::new(
        vec![Box::new(FileSource::new(fs, &data_file))],
        DEFAULT_COLLAPSE_DEPTH,
    )
    .load()
    .expect("load");
    assert_eq!(dataset.provenance, Provenance::LocalFile);
    assert_eq!(dataset.tree.len(), 5);
}
