//! Data sources and the fallback cascade
//!
//! Sources are tried in priority order; the first one yielding records that
//! form a tree wins. Failures are logged and fall through to the next source.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use crate::application::error_ext::{IoResultExt, JsonResultExt};
use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::builder::{BuildReport, TreeBuilder};
use crate::domain::record::{normalize, retain_identified, RawRecord, RecordPayload};
use crate::domain::TreeArena;
use crate::infrastructure::traits::FileSystem;

/// Environment variable holding an injected JSON array of records.
pub const INJECTED_ENV_VAR: &str = "MINDMAP_DATA";

/// Where the displayed data came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub enum Provenance {
    Injected,
    LocalFile,
    Fallback,
}

impl fmt::Display for Provenance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Provenance::Injected => "Sheet (Injected)",
            Provenance::LocalFile => "Local data.json",
            Provenance::Fallback => "Fallback (Code)",
        };
        f.write_str(label)
    }
}

/// Records delivered by one source.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceData {
    pub records: Vec<RawRecord>,
    /// Last sync time, when the source knows it
    pub timestamp: Option<String>,
}

/// Pluggable record provider.
pub trait DataSource {
    fn provenance(&self) -> Provenance;

    /// `Ok(None)` when the source has nothing to offer.
    fn fetch(&self) -> ApplicationResult<Option<SourceData>>;
}

/// Records injected through the environment, as a JSON array.
pub struct InjectedSource {
    payload: Option<String>,
}

impl InjectedSource {
    pub fn new(payload: Option<String>) -> Self {
        Self { payload }
    }

    pub fn from_env() -> Self {
        Self::new(std::env::var(INJECTED_ENV_VAR).ok())
    }
}

impl DataSource for InjectedSource {
    fn provenance(&self) -> Provenance {
        Provenance::Injected
    }

    fn fetch(&self) -> ApplicationResult<Option<SourceData>> {
        let Some(payload) = self.payload.as_deref().filter(|p| !p.trim().is_empty()) else {
            return Ok(None);
        };
        // Only a bare array is accepted from the injection point
        let records: Vec<RawRecord> =
            serde_json::from_str(payload).map_err(|e| ApplicationError::OperationFailed {
                context: format!("parse {}", INJECTED_ENV_VAR),
                source: Box::new(e),
            })?;
        Ok(Some(SourceData {
            records,
            timestamp: None,
        }))
    }
}

/// The local JSON data document.
pub struct FileSource {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl FileSource {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl DataSource for FileSource {
    fn provenance(&self) -> Provenance {
        Provenance::LocalFile
    }

    fn fetch(&self) -> ApplicationResult<Option<SourceData>> {
        if !self.fs.is_file(&self.path) {
            debug!("fetch: no data file at {}", self.path.display());
            return Ok(None);
        }
        let content = self
            .fs
            .read_to_string(&self.path)
            .with_path_context("read data file", &self.path)?;
        let (records, timestamp) = RecordPayload::parse(&content)
            .with_json_context("parse data file", &self.path)?
            .into_parts();
        Ok(Some(SourceData { records, timestamp }))
    }
}

/// Hardcoded single node dataset; always usable.
#[derive(Debug, Default)]
pub struct FallbackSource;

impl FallbackSource {
    pub fn records() -> Vec<RawRecord> {
        vec![RawRecord::new("1", None, "Knowledge Explorer")
            .with_url("https://google.com")
            .with_description(
                "No data.json found. Run `mindmap sync` first to see your spreadsheet content.",
            )
            .with_image_url("https://placehold.co/100x60/3b82f6/white?text=Knowledge")]
    }
}

impl DataSource for FallbackSource {
    fn provenance(&self) -> Provenance {
        Provenance::Fallback
    }

    fn fetch(&self) -> ApplicationResult<Option<SourceData>> {
        Ok(Some(SourceData {
            records: Self::records(),
            timestamp: None,
        }))
    }
}

/// A tree ready for display together with where it came from.
#[derive(Debug)]
pub struct LoadedDataset {
    pub tree: TreeArena,
    pub provenance: Provenance,
    pub synced_at: Option<String>,
    pub report: BuildReport,
    /// Records offered by the winning source (before id filtering)
    pub record_count: usize,
}

/// Ordered list of sources.
pub struct SourceChain {
    sources: Vec<Box<dyn DataSource>>,
    collapse_depth: usize,
}

impl SourceChain {
    pub fn new(sources: Vec<Box<dyn DataSource>>, collapse_depth: usize) -> Self {
        Self {
            sources,
            collapse_depth,
        }
    }

    /// Injected, then local file, then fallback.
    pub fn standard(fs: Arc<dyn FileSystem>, data_file: &Path, collapse_depth: usize) -> Self {
        Self::new(
            vec![
                Box::new(InjectedSource::from_env()),
                Box::new(FileSource::new(fs, data_file)),
                Box::new(FallbackSource),
            ],
            collapse_depth,
        )
    }

    /// Load the first usable dataset.
    #[instrument(level = "debug", skip(self))]
    pub fn load(&self) -> ApplicationResult<LoadedDataset> {
        for source in &self.sources {
            let provenance = source.provenance();
            let data = match source.fetch() {
                Ok(Some(data)) => data,
                Ok(None) => {
                    debug!(%provenance, "source has no data");
                    continue;
                }
                Err(e) => {
                    warn!(%provenance, "source failed, trying next: {}", e);
                    continue;
                }
            };
            let record_count = data.records.len();
            let records = normalize(&retain_identified(data.records));
            let mut builder = TreeBuilder::new().with_collapse_depth(self.collapse_depth);
            match builder.build(&records) {
                Some(tree) => {
                    info!(%provenance, nodes = tree.len(), "dataset loaded");
                    return Ok(LoadedDataset {
                        tree,
                        provenance,
                        synced_at: data.timestamp,
                        report: builder.report().clone(),
                        record_count,
                    });
                }
                None => debug!(%provenance, "records do not form a tree"),
            }
        }
        Err(ApplicationError::Config {
            message: "no data source produced a tree".to_string(),
        })
    }
}

/// Demo dataset used by the `simulate` command and tests.
pub fn sample_records() -> Vec<RawRecord> {
    let rows: [(&str, Option<&str>, &str, &str, &str); 12] = [
        ("1", None, "Enterprise Strategy", "https://example.com/strategy", "Core 2025 Vision"),
        ("2", Some("1"), "Product Roadmap", "", "Feature delivery schedule"),
        ("3", Some("1"), "Market Analysis", "https://example.com/market", "Competitive landscape"),
        ("4", Some("1"), "Infrastructure", "", "Scale and security"),
        ("5", Some("2"), "Q1 Launch", "", "Initial release"),
        ("6", Some("2"), "Q2 Expansion", "", "Regional scaling"),
        ("7", Some("3"), "Competitor Research", "", "Direct competitors analysis"),
        ("8", Some("3"), "Customer Surveys", "", "User feedback loops"),
        ("9", Some("4"), "Cloud Migration", "https://example.com/cloud", "AWS to GCP move"),
        ("10", Some("4"), "Security Audit", "", "External pen test"),
        ("11", Some("5"), "Beta Testing", "", "Internal QA phase"),
        ("12", Some("5"), "Marketing Sync", "", "Brand alignment"),
    ];
    rows.iter()
        .map(|(id, parent, label, url, description)| {
            let mut record = RawRecord::new(*id, *parent, *label).with_description(*description);
            if !url.is_empty() {
                record = record.with_url(*url);
            }
            record
        })
        .collect()
}
