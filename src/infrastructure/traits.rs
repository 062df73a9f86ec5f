//! I/O boundary traits for testability
//!
//! These traits abstract external I/O operations, allowing services
//! to be tested with mock implementations.

use std::io;
use std::path::Path;
use std::time::Duration;

use thiserror::Error;
use tracing::debug;

/// Filesystem abstraction for testability.
pub trait FileSystem: Send + Sync {
    /// Read file contents to string.
    fn read_to_string(&self, path: &Path) -> io::Result<String>;

    /// Write string content to file.
    fn write(&self, path: &Path, content: &str) -> io::Result<()>;

    /// Check if path is a file.
    fn is_file(&self, path: &Path) -> bool;

    /// Create directory and all parent directories.
    fn create_dir_all(&self, path: &Path) -> io::Result<()>;

    /// Create parent directories if needed.
    fn ensure_parent(&self, path: &Path) -> io::Result<()>;
}

#[derive(Error, Debug)]
pub enum HttpError {
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("network error: {0}")]
    Transport(String),
}

/// Blocking HTTP client abstraction.
pub trait HttpClient: Send + Sync {
    /// GET `url` and return the response body of a successful response.
    fn get(&self, url: &str) -> Result<String, HttpError>;
}

// ============================================================
// REAL IMPLEMENTATIONS
// ============================================================

/// Real filesystem implementation.
#[derive(Debug, Default)]
pub struct RealFileSystem;

impl FileSystem for RealFileSystem {
    fn read_to_string(&self, path: &Path) -> io::Result<String> {
        std::fs::read_to_string(path)
    }

    fn write(&self, path: &Path, content: &str) -> io::Result<()> {
        std::fs::write(path, content)
    }

    fn is_file(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn create_dir_all(&self, path: &Path) -> io::Result<()> {
        std::fs::create_dir_all(path)
    }

    fn ensure_parent(&self, path: &Path) -> io::Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                self.create_dir_all(parent)?;
            }
        }
        Ok(())
    }
}

/// `ureq` backed client with a per-request timeout.
pub struct UreqHttpClient {
    agent: ureq::Agent,
}

impl UreqHttpClient {
    pub fn new(timeout: Duration) -> Self {
        let agent = ureq::AgentBuilder::new().timeout(timeout).build();
        Self { agent }
    }
}

impl HttpClient for UreqHttpClient {
    fn get(&self, url: &str) -> Result<String, HttpError> {
        debug!("GET {}", url);
        match self.agent.get(url).call() {
            Ok(resp) => resp
                .into_string()
                .map_err(|e| HttpError::Transport(e.to_string())),
            Err(ureq::Error::Status(status, resp)) => {
                let body: String = resp
                    .into_string()
                    .unwrap_or_default()
                    .chars()
                    .take(200)
                    .collect();
                Err(HttpError::Status { status, body })
            }
            Err(ureq::Error::Transport(e)) => Err(HttpError::Transport(e.to_string())),
        }
    }
}
