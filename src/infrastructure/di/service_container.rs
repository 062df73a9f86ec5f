//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::application::services::{ExportService, SourceChain, SyncService};
use crate::config::Settings;
use crate::infrastructure::traits::{FileSystem, HttpClient, RealFileSystem, UreqHttpClient};

/// Container holding all application services.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Directory relative paths resolve against
    pub project_dir: PathBuf,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,

    /// HTTP client abstraction
    pub http: Arc<dyn HttpClient>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings, project_dir: &Path) -> Self {
        let http = Arc::new(UreqHttpClient::new(settings.sync.timeout()));
        Self::with_deps(settings, project_dir, Arc::new(RealFileSystem), http)
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(
        settings: Settings,
        project_dir: &Path,
        fs: Arc<dyn FileSystem>,
        http: Arc<dyn HttpClient>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            project_dir: project_dir.to_path_buf(),
            fs,
            http,
        }
    }

    /// Location of the local data document.
    pub fn data_path(&self) -> PathBuf {
        self.settings.data_path(&self.project_dir)
    }

    /// Injected, local file, fallback.
    pub fn source_chain(&self) -> SourceChain {
        SourceChain::standard(
            self.fs.clone(),
            &self.data_path(),
            self.settings.collapse_depth,
        )
    }

    pub fn export_service(&self) -> ExportService {
        ExportService::new(self.fs.clone())
    }

    pub fn sync_service(&self) -> SyncService {
        SyncService::new(self.fs.clone(), self.http.clone())
    }
}
