//! Tests for SyncService with a canned HTTP client

use std::fs;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use mindmap::application::services::{SyncService, PLACEHOLDER_MARKER};
use mindmap::application::ApplicationError;
use mindmap::domain::record::RecordPayload;
use mindmap::infrastructure::traits::{HttpClient, HttpError, RealFileSystem};
use mindmap::util::testing;

/// Returns a fixed response and remembers requested URLs.
struct CannedHttp {
    response: Result<String, (u16, String)>,
    requested: Mutex<Vec<String>>,
}

impl CannedHttp {
    fn ok(body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Ok(body.to_string()),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn status(status: u16, body: &str) -> Arc<Self> {
        Arc::new(Self {
            response: Err((status, body.to_string())),
            requested: Mutex::new(Vec::new()),
        })
    }

    fn requests(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

impl HttpClient for CannedHttp {
    fn get(&self, url: &str) -> Result<String, HttpError> {
        self.requested.lock().unwrap().push(url.to_string());
        match &self.response {
            Ok(body) => Ok(body.clone()),
            Err((status, body)) => Err(HttpError::Status {
                status: *status,
                body: body.clone(),
            }),
        }
    }
}

const URL: &str = "https://script.google.com/macros/s/abc123/exec";

#[test]
fn given_envelope_response_when_syncing_then_writes_data_document() {
    testing::init_test_setup();

    // Arrange
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    let http = CannedHttp::ok(
        r#"{"timestamp": "2025-05-05T08:00:00.000Z", "detectedHeaders": ["ID"], "count": 2,
            "nodes": [{"id": "1", "parentId": null, "label": "Root"},
                      {"id": "2", "parentId": "1", "label": "Child"}]}"#,
    );
    let service = SyncService::new(Arc::new(RealFileSystem), http.clone());

    // Act
    let outcome = service.sync(URL, &data_file).expect("sync");

    // Assert
    assert_eq!(outcome.node_count, 2);
    assert_eq!(outcome.timestamp, "2025-05-05T08:00:00.000Z");
    assert!(!outcome.flat_list);
    assert_eq!(http.requests(), vec![URL.to_string()]);

    let written = fs::read_to_string(&data_file).unwrap();
    let (records, timestamp) = RecordPayload::parse(&written).expect("parse").into_parts();
    assert_eq!(records.len(), 2);
    assert_eq!(timestamp.as_deref(), Some("2025-05-05T08:00:00.000Z"));
}

#[test]
fn given_flat_list_response_when_syncing_then_wraps_with_current_time() {
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    let http = CannedHttp::ok(r#"[{"id": "1", "label": "Only"}]"#);
    let service = SyncService::new(Arc::new(RealFileSystem), http);

    let outcome = service.sync(URL, &data_file).expect("sync");

    assert!(outcome.flat_list);
    assert_eq!(outcome.node_count, 1);
    assert!(outcome.timestamp.ends_with('Z'));
    let written: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&data_file).unwrap()).unwrap();
    assert!(written["nodes"].is_array());
    assert_eq!(written["timestamp"], outcome.timestamp.as_str());
}

#[test]
fn given_placeholder_or_empty_url_when_syncing_then_refuses_without_request() {
    testing::init_test_setup();

    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    let http = CannedHttp::ok("[]");
    let service = SyncService::new(Arc::new(RealFileSystem), http.clone());
    let placeholder = format!("https://script.google.com/macros/s/{PLACEHOLDER_MARKER}/exec");

    let placeholder_err = service.sync(&placeholder, &data_file).unwrap_err();
    let empty_err = service.sync("  ", &data_file).unwrap_err();

    assert!(matches!(placeholder_err, ApplicationError::Config { .. }));
    assert!(matches!(empty_err, ApplicationError::Config { .. }));
    assert!(http.requests().is_empty());
    assert!(!data_file.exists());
}

#[test]
fn given_error_envelope_when_syncing_then_aborts_and_keeps_existing_file() {
    testing::init_test_setup();

    // Arrange
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    fs::write(&data_file, "[]").unwrap();
    let http = CannedHttp::ok(r#"{"error": "Sheet 'Data' not found"}"#);
    let service = SyncService::new(Arc::new(RealFileSystem), http);

    // Act
    let err = service.sync(URL, &data_file).unwrap_err();

    // Assert
    assert!(matches!(
        err,
        ApplicationError::Remote { ref message } if message.contains("not found")
    ));
    assert_eq!(fs::read_to_string(&data_file).unwrap(), "[]");
}

#[test]
fn given_http_failure_when_syncing_then_reports_operation_failure() {
    let temp = TempDir::new().unwrap();
    let data_file = temp.path().join("data.json");
    let http = CannedHttp::status(500, "boom");
    let service = SyncService::new(Arc::new(RealFileSystem), http);

    let err = service.sync(URL, &data_file).unwrap_err();

    assert!(matches!(err, ApplicationError::OperationFailed { .. }));
    assert!(err.to_string().contains(URL));
    assert!(!data_file.exists());
}
