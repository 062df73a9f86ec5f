//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/mindmap/mindmap.toml`
//! 3. Local config: `<project_dir>/.mindmap.toml`
//! 4. Environment variables: `MINDMAP_*` prefix, `__` between nested keys
//!    (e.g. `MINDMAP_LAYOUT__RANK_SEPARATION=500`)

use std::path::{Path, PathBuf};
use std::time::Duration;

use config::{Config, ConfigError, Environment, File, FileFormat};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::application::camera::{FramingPolicy, ScaleExtent, Viewport};
use crate::application::controller::ViewOptions;
use crate::application::transition::TransitionTiming;
use crate::application::ApplicationError;
use crate::domain::builder::DEFAULT_COLLAPSE_DEPTH;
use crate::domain::card::CardStyle;
use crate::domain::layout::LayoutConfig;
use crate::domain::sizing::BoxMetrics;

/// Remote export endpoint used by `mindmap sync`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SyncConfig {
    /// Deployment URL of the spreadsheet export
    pub url: Option<String>,
    pub timeout_secs: u64,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            url: None,
            timeout_secs: 30,
        }
    }
}

impl SyncConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Spreadsheet bridge used by `mindmap export`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ExportConfig {
    /// CSV sheet to convert
    pub sheet: Option<PathBuf>,
}

/// Unified configuration for mindmap.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Local data document, relative paths resolve against the project dir
    pub data_file: PathBuf,
    /// Depth from which nodes start collapsed
    pub collapse_depth: usize,
    pub layout: LayoutConfig,
    pub sizing: BoxMetrics,
    pub card: CardStyle,
    pub viewport: Viewport,
    pub animation: TransitionTiming,
    pub framing: FramingPolicy,
    pub zoom: ScaleExtent,
    pub sync: SyncConfig,
    pub export: ExportConfig,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("data.json"),
            collapse_depth: DEFAULT_COLLAPSE_DEPTH,
            layout: LayoutConfig::default(),
            sizing: BoxMetrics::default(),
            card: CardStyle::default(),
            viewport: Viewport::default(),
            animation: TransitionTiming::default(),
            framing: FramingPolicy::default(),
            zoom: ScaleExtent::default(),
            sync: SyncConfig::default(),
            export: ExportConfig::default(),
        }
    }
}

/// Get the XDG config directory for mindmap.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", "mindmap").map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("mindmap.toml"))
}

/// Get the path to the local config file in a project directory.
pub fn local_config_path(project_dir: &Path) -> PathBuf {
    project_dir.join(".mindmap.toml")
}

/// Expand `~`, `$VAR` and `${VAR}`; unknown variables are left as written.
fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    match shellexpand::full(raw.as_ref()) {
        Ok(expanded) => PathBuf::from(expanded.as_ref()),
        Err(_) => PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref()),
    }
}

impl Settings {
    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `project_dir` - Optional project directory holding `.mindmap.toml`
    pub fn load(project_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        let defaults = Config::try_from(&Settings::default()).map_err(config_err)?;
        let mut builder = Config::builder().add_source(defaults);

        if let Some(global_path) = global_config_path() {
            if global_path.exists() {
                debug!("load: global config {}", global_path.display());
                builder = builder.add_source(File::from(global_path).format(FileFormat::Toml));
            }
        }

        if let Some(project) = project_dir {
            let local_path = local_config_path(project);
            if local_path.exists() {
                debug!("load: local config {}", local_path.display());
                builder = builder.add_source(File::from(local_path).format(FileFormat::Toml));
            }
        }

        builder = builder.add_source(
            Environment::with_prefix("MINDMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().map_err(config_err)?;
        let mut settings: Self = config.try_deserialize().map_err(config_err)?;
        settings.expand_paths();
        settings.validate()?;
        Ok(settings)
    }

    /// Reject values that would break the camera at runtime.
    fn validate(&self) -> Result<(), ApplicationError> {
        self.zoom
            .validate()
            .map_err(|message| ApplicationError::Config { message })
    }

    /// Expand shell variables and tilde in path-like fields.
    fn expand_paths(&mut self) {
        self.data_file = expand_path(&self.data_file);
        self.export.sheet = self.export.sheet.as_deref().map(expand_path);
    }

    /// Data document location for a project directory.
    pub fn data_path(&self, project_dir: &Path) -> PathBuf {
        project_dir.join(&self.data_file)
    }

    /// Sheet location for a project directory, if configured.
    pub fn sheet_path(&self, project_dir: &Path) -> Option<PathBuf> {
        self.export.sheet.as_ref().map(|s| project_dir.join(s))
    }

    /// Settings relevant to layout and interaction.
    pub fn view_options(&self) -> ViewOptions {
        ViewOptions {
            layout: self.layout.clone(),
            metrics: self.sizing.clone(),
            card: self.card.clone(),
            timing: self.animation.clone(),
            framing: self.framing.clone(),
            scale_extent: self.zoom,
            viewport: self.viewport,
        }
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# mindmap configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/mindmap/mindmap.toml
#   Local:  <project_dir>/.mindmap.toml
#   Env:    MINDMAP_* environment variables, nested keys joined by "__"
#           e.g. MINDMAP_LAYOUT__RANK_SEPARATION=500

# Local data document (relative to the project dir)
# data_file = "data.json"

# Nodes at this depth or deeper start collapsed
# collapse_depth = 2

[layout]
# rank_separation = 400.0
# sibling_separation = 220.0
# min_gap = 16.0

[sizing]
# node_width = 220.0
# base_height = 60.0
# chars_per_line = 28
# max_leaf_lines = 8
# image_height = 70.0

[card]
# root_title_px = 18.0
# branch_title_px = 15.0
# title_px = 13.0

[viewport]
# width = 1280.0
# height = 800.0

[animation]
# enter_ms = 400.0
# update_ms = 400.0
# exit_ms = 300.0

[framing]
# narrow_breakpoint = 640.0
# wide_scale = 0.85

[zoom]
# min = 0.1
# max = 3.0

[sync]
# Deployment URL of the spreadsheet export endpoint
# url = "https://script.google.com/macros/s/YOUR_APPS_SCRIPT_DEPLOYMENT_ID/exec"
# timeout_secs = 30

[export]
# CSV sheet converted by `mindmap export`
# sheet = "sheet.csv"
"#
        .to_string()
    }
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}
