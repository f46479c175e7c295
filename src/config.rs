//! Server configuration
//!
//! Read from a YAML file when one exists (`MINIHTTP_CONFIG`, or
//! `minihttp.yaml` in the working directory), then adjusted from the
//! environment. Every field has a default, so an empty or missing file is a
//! valid configuration.

use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Deserialize;

use crate::http::mime::MimeTable;

pub const DEFAULT_CONFIG_PATH: &str = "minihttp.yaml";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,
    pub static_files: StaticFilesConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub listen_addr: String,
    /// Exchanges handled concurrently
    pub workers: usize,
    /// Connections allowed to wait for a worker; unbounded when absent
    pub max_queued: Option<usize>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8088".to_string(),
            workers: 50,
            max_queued: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StaticFilesConfig {
    pub root: PathBuf,
    /// Relative to `root`
    pub not_found_page: PathBuf,
    /// YAML `extension: mime` table replacing the built-in one
    pub mime_table: Option<PathBuf>,
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./static"),
            not_found_page: PathBuf::from("root/404.html"),
            mime_table: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub users_dir: PathBuf,
    pub articles_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            users_dir: PathBuf::from("./users"),
            articles_dir: PathBuf::from("./articles"),
        }
    }
}

impl Config {
    /// Loads the file named by `MINIHTTP_CONFIG` (or the default path if it
    /// exists) and applies `LISTEN` / `STATIC_ROOT` overrides.
    pub fn load() -> anyhow::Result<Self> {
        let explicit = std::env::var("MINIHTTP_CONFIG").ok();
        let path = explicit.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);

        let cfg = if explicit.is_some() || Path::new(path).exists() {
            Self::from_file(Path::new(path))?
        } else {
            tracing::debug!("No config file, using defaults");
            Self::default()
        };

        cfg.with_overrides(|key| std::env::var(key).ok()).validated()
    }

    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let cfg = Self::from_yaml(&source)
            .with_context(|| format!("Invalid config {}", path.display()))?;

        tracing::info!(path = %path.display(), "Loaded configuration");
        Ok(cfg)
    }

    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        if source.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(source)?)
    }

    /// Applies environment-style overrides read through `lookup`.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(addr) = lookup("LISTEN") {
            self.server.listen_addr = addr;
        }
        if let Some(root) = lookup("STATIC_ROOT") {
            self.static_files.root = PathBuf::from(root);
        }
        self
    }

    pub fn validated(self) -> anyhow::Result<Self> {
        if self.server.workers == 0 {
            anyhow::bail!("server.workers must be at least 1");
        }
        Ok(self)
    }

    /// The configured MIME table, or the built-in one.
    pub fn mime_table(&self) -> anyhow::Result<MimeTable> {
        match &self.static_files.mime_table {
            Some(path) => MimeTable::load(path),
            None => MimeTable::builtin(),
        }
    }
}
