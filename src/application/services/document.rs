//! The local data document `{ timestamp, nodes }`.

use std::path::Path;

use serde::Serialize;
use tracing::info;

use crate::application::error_ext::IoResultExt;
use crate::application::{ApplicationError, ApplicationResult};
use crate::infrastructure::traits::FileSystem;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DataDocument<T> {
    pub timestamp: String,
    pub nodes: Vec<T>,
}

impl<T: Serialize> DataDocument<T> {
    pub fn new(timestamp: impl Into<String>, nodes: Vec<T>) -> Self {
        Self {
            timestamp: timestamp.into(),
            nodes,
        }
    }

    /// Write pretty-printed JSON, creating parent directories as needed.
    pub fn write(&self, fs: &dyn FileSystem, path: &Path) -> ApplicationResult<()> {
        let json =
            serde_json::to_string_pretty(self).map_err(|e| ApplicationError::OperationFailed {
                context: "serialize data document".to_string(),
                source: Box::new(e),
            })?;
        fs.ensure_parent(path)
            .with_path_context("create parent directory", path)?;
        fs.write(path, &json)
            .with_path_context("write data file", path)?;
        info!(nodes = self.nodes.len(), "wrote {}", path.display());
        Ok(())
    }
}

/// Current time in the ISO 8601 form used by the data document.
pub fn now_timestamp() -> String {
    chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}
