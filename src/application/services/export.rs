//! Spreadsheet export bridge
//!
//! Converts a CSV sheet into the record document format. The first row holds
//! the headers; columns are found by name, ignoring case and surrounding
//! whitespace, so column order does not matter.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::application::services::document::{now_timestamp, DataDocument};
use crate::application::ApplicationResult;
use crate::infrastructure::traits::FileSystem;

/// Label given to rows without one.
pub const UNTITLED_ROW: &str = "Untitled";
pub const EMPTY_SHEET: &str = "Sheet is empty";

const COLUMNS: [&str; 6] = ["ID", "ParentID", "Label", "URL", "Description", "ImageURL"];

/// One converted row, every field present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportedNode {
    pub id: String,
    pub parent_id: Option<String>,
    pub label: String,
    pub url: String,
    pub description: String,
    pub image_url: String,
}

/// Response of the bridge, mirroring what the remote export endpoint returns.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ExportResponse {
    Converted {
        timestamp: String,
        #[serde(rename = "detectedHeaders")]
        detected_headers: Vec<String>,
        count: usize,
        nodes: Vec<ExportedNode>,
    },
    Empty {
        nodes: Vec<ExportedNode>,
        error: String,
    },
    Failed {
        error: String,
    },
}

impl ExportResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        ExportResponse::Failed {
            error: error.into(),
        }
    }

    pub fn nodes(&self) -> &[ExportedNode] {
        match self {
            ExportResponse::Converted { nodes, .. } | ExportResponse::Empty { nodes, .. } => nodes,
            ExportResponse::Failed { .. } => &[],
        }
    }

    pub fn error(&self) -> Option<&str> {
        match self {
            ExportResponse::Converted { .. } => None,
            ExportResponse::Empty { error, .. } | ExportResponse::Failed { error } => Some(error),
        }
    }
}

/// Convert CSV text, stamping the result with `timestamp`.
pub fn convert_csv(text: &str, timestamp: &str) -> ExportResponse {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(text.as_bytes());

    let mut rows: Vec<csv::StringRecord> = Vec::new();
    for (idx, result) in reader.records().enumerate() {
        match result {
            Ok(row) => rows.push(row),
            Err(e) => return ExportResponse::failed(format!("row {}: {}", idx + 1, e)),
        }
    }

    let Some((headers, data)) = rows.split_first().filter(|(_, data)| !data.is_empty()) else {
        return ExportResponse::Empty {
            nodes: Vec::new(),
            error: EMPTY_SHEET.to_string(),
        };
    };

    let detected_headers: Vec<String> = headers.iter().map(str::to_string).collect();
    let column = |name: &str| {
        headers
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
    };
    let positions: Vec<Option<usize>> = COLUMNS.iter().map(|c| column(*c)).collect();
    debug!(?detected_headers, ?positions, "header mapping");

    let cell = |row: &csv::StringRecord, col: usize| -> String {
        positions[col]
            .and_then(|i| row.get(i))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let nodes: Vec<ExportedNode> = data
        .iter()
        .map(|row| {
            let parent = cell(row, 1);
            let label = cell(row, 2);
            ExportedNode {
                id: cell(row, 0),
                parent_id: (!parent.is_empty()).then_some(parent),
                label: if label.is_empty() {
                    UNTITLED_ROW.to_string()
                } else {
                    label
                },
                url: cell(row, 3),
                description: cell(row, 4),
                image_url: cell(row, 5),
            }
        })
        .filter(|node| !node.id.is_empty())
        .collect();

    if nodes.len() < data.len() {
        warn!("skipped {} row(s) without id", data.len() - nodes.len());
    }

    ExportResponse::Converted {
        timestamp: timestamp.to_string(),
        detected_headers,
        count: nodes.len(),
        nodes,
    }
}

/// Reads the configured sheet and optionally stores the result as data file.
pub struct ExportService {
    fs: Arc<dyn FileSystem>,
}

impl ExportService {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self { fs }
    }

    /// Convert the sheet at `sheet`. Problems are reported inside the response.
    #[instrument(level = "debug", skip(self))]
    pub fn export(&self, sheet: Option<&Path>) -> ExportResponse {
        let Some(sheet) = sheet else {
            return ExportResponse::failed(
                "no sheet configured: set export.sheet or pass --sheet",
            );
        };
        match self.fs.read_to_string(sheet) {
            Ok(text) => convert_csv(&text, &now_timestamp()),
            Err(e) => ExportResponse::failed(format!("read {}: {}", sheet.display(), e)),
        }
    }

    /// Store converted nodes as `{ timestamp, nodes }`.
    pub fn write(&self, response: &ExportResponse, data_file: &Path) -> ApplicationResult<PathBuf> {
        let timestamp = match response {
            ExportResponse::Converted { timestamp, .. } => timestamp.clone(),
            _ => now_timestamp(),
        };
        DataDocument::new(timestamp, response.nodes().to_vec()).write(self.fs.as_ref(), data_file)?;
        Ok(data_file.to_path_buf())
    }
}
