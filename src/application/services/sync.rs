//! Sync service: pull the remote export and store it as the local data document.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::application::services::document::{now_timestamp, DataDocument};
use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::{FileSystem, HttpClient};

/// Marker of the unconfigured deployment URL shipped in templates.
pub const PLACEHOLDER_MARKER: &str = "YOUR_APPS_SCRIPT_DEPLOYMENT_ID";

/// Nodes and timestamp extracted from a remote payload.
#[derive(Debug, Clone, PartialEq)]
pub struct RemotePayload {
    pub nodes: Vec<Value>,
    pub timestamp: String,
    /// The remote sent a bare list instead of an envelope
    pub flat_list: bool,
}

impl RemotePayload {
    /// Interpret a response body. Envelopes carrying `error` are rejected.
    pub fn parse(body: &str) -> ApplicationResult<Self> {
        let payload: Value =
            serde_json::from_str(body).map_err(|e| ApplicationError::OperationFailed {
                context: "parse remote payload".to_string(),
                source: Box::new(e),
            })?;

        match payload {
            Value::Object(map) => {
                if let Some(error) = map.get("error") {
                    let message = error
                        .as_str()
                        .map(str::to_string)
                        .unwrap_or_else(|| error.to_string());
                    return Err(ApplicationError::Remote { message });
                }
                let nodes = match map.get("nodes") {
                    Some(Value::Array(nodes)) => nodes.clone(),
                    _ => Vec::new(),
                };
                let timestamp = map
                    .get("timestamp")
                    .and_then(Value::as_str)
                    .map(str::to_string)
                    .unwrap_or_else(now_timestamp);
                Ok(Self {
                    nodes,
                    timestamp,
                    flat_list: false,
                })
            }
            Value::Array(nodes) => Ok(Self {
                nodes,
                timestamp: now_timestamp(),
                flat_list: true,
            }),
            other => Err(ApplicationError::Payload {
                message: format!("expected object or array, got {}", kind(&other)),
            }),
        }
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Result of a successful sync.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncOutcome {
    pub node_count: usize,
    pub timestamp: String,
    pub flat_list: bool,
    pub path: PathBuf,
}

pub struct SyncService {
    fs: Arc<dyn FileSystem>,
    http: Arc<dyn HttpClient>,
}

impl SyncService {
    pub fn new(fs: Arc<dyn FileSystem>, http: Arc<dyn HttpClient>) -> Self {
        Self { fs, http }
    }

    /// Fetch `url` and write `{ timestamp, nodes }` to `data_file`.
    #[instrument(level = "debug", skip(self))]
    pub fn sync(&self, url: &str, data_file: &Path) -> ApplicationResult<SyncOutcome> {
        if url.trim().is_empty() || url.contains(PLACEHOLDER_MARKER) {
            return Err(ApplicationError::Config {
                message: format!(
                    "placeholder or missing export URL: {}. Pass --url or set sync.url",
                    url
                ),
            });
        }

        info!("Syncing with {}", url);
        let body = self
            .http
            .get(url)
            .map_err(|e| ApplicationError::OperationFailed {
                context: format!("fetch {}", url),
                source: Box::new(e),
            })?;
        let payload = RemotePayload::parse(&body)?;
        if payload.flat_list {
            info!("flat list received");
        }

        let outcome = SyncOutcome {
            node_count: payload.nodes.len(),
            timestamp: payload.timestamp.clone(),
            flat_list: payload.flat_list,
            path: data_file.to_path_buf(),
        };
        DataDocument::new(payload.timestamp, payload.nodes).write(self.fs.as_ref(), data_file)?;
        info!(nodes = outcome.node_count, "sync successful");
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_envelope_without_timestamp_when_parsing_then_defaults_to_now() {
        let payload = RemotePayload::parse(r#"{"nodes": [{"id": "1"}]}"#).unwrap();
        assert_eq!(payload.nodes.len(), 1);
        assert!(!payload.timestamp.is_empty());
        assert!(!payload.flat_list);
    }

    #[test]
    fn given_error_envelope_when_parsing_then_aborts() {
        let err = RemotePayload::parse(r#"{"nodes": [], "error": "Sheet is empty"}"#).unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Remote { ref message } if message == "Sheet is empty"
        ));
    }

    #[test]
    fn given_scalar_payload_when_parsing_then_rejected() {
        assert!(matches!(
            RemotePayload::parse("42"),
            Err(ApplicationError::Payload { .. })
        ));
    }
}
