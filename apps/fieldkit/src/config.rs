//! # Configuration
//!
//! TOML configuration file with CLI overrides.
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 8080
//!
//! [storage]
//! backend = "redb"          # or "memory"
//! database = "fieldkit.db"
//! data_dir = "fieldkit-data"
//!
//! [plan]
//! csv = "plan.csv"
//! ```
//!
//! Every key is optional. Without `--config`, `fieldkit.toml` in the working
//! directory is read when present.

use clap::ValueEnum;
use fieldkit_core::{FieldError, FileStore, PlanTable, Workspace};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Config file picked up when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "fieldkit.toml";

/// Maximum config file size (1 MB).
const MAX_CONFIG_FILE_SIZE: u64 = 1024 * 1024;

/// Storage backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// Volatile in-memory repository.
    Memory,
    /// redb database file.
    #[default]
    Redb,
}

impl Backend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Redb => "redb",
        }
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub plan: PlanConfig,
}

/// HTTP server configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
}

/// Repository and file storage configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub backend: Backend,
    /// redb database path (ignored by the memory backend).
    pub database: PathBuf,
    /// Root directory for report folders and photos.
    pub data_dir: PathBuf,
}

/// Plan lookup configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlanConfig {
    /// Plan CSV with `node` and `technology` columns.
    pub csv: Option<PathBuf>,
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

const fn default_port() -> u16 {
    8080
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            database: PathBuf::from("fieldkit.db"),
            data_dir: PathBuf::from("fieldkit-data"),
        }
    }
}

impl Config {
    /// Parse a TOML document.
    pub fn from_toml_str(text: &str) -> Result<Self, FieldError> {
        toml::from_str(text)
            .map_err(|e| FieldError::DeserializationError(format!("config: {}", e)))
    }

    /// Load configuration.
    ///
    /// An explicit path must exist. Without one, [`DEFAULT_CONFIG_FILE`] is
    /// used when present and built-in defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, FieldError> {
        let path = match path {
            Some(p) => p.to_path_buf(),
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if !fallback.is_file() {
                    return Ok(Self::default());
                }
                fallback
            }
        };

        let metadata = std::fs::metadata(&path)
            .map_err(|e| FieldError::IoError(format!("config {}: {}", path.display(), e)))?;
        if metadata.len() > MAX_CONFIG_FILE_SIZE {
            return Err(FieldError::InvalidInput(format!(
                "config file {} exceeds {} bytes",
                path.display(),
                MAX_CONFIG_FILE_SIZE
            )));
        }
        let text = std::fs::read_to_string(&path)
            .map_err(|e| FieldError::IoError(format!("config {}: {}", path.display(), e)))?;
        tracing::debug!(path = %path.display(), "Loaded configuration");
        Self::from_toml_str(&text)
    }

    /// Build the workspace this configuration describes.
    pub fn open_workspace(&self) -> Result<Workspace, FieldError> {
        let workspace = match self.storage.backend {
            Backend::Redb => Workspace::with_redb(&self.storage.database)?,
            Backend::Memory => Workspace::new(),
        };
        let plan = match &self.plan.csv {
            Some(path) => PlanTable::from_path(path)?,
            None => PlanTable::new(),
        };
        Ok(workspace
            .with_files(FileStore::new(&self.storage.data_dir))
            .with_plan(plan))
    }
}

// =============================================================================
// TESTS
// =============================================================================
