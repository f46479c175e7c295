//! Extension to Content-Type lookup.
//!
//! The table is loaded once at startup, either from the copy compiled into
//! the binary or from a YAML file named in the configuration, and is read-only
//! afterwards.

use std::collections::HashMap;
use std::path::Path;

use anyhow::Context;

const BUILTIN: &str = include_str!("../../resources/mime.yaml");

#[derive(Debug, Clone, Default)]
pub struct MimeTable {
    types: HashMap<String, String>,
}

impl MimeTable {
    /// The table shipped with the crate.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_yaml(BUILTIN).context("Invalid built-in MIME table")
    }

    /// Parses a flat `extension: mime/type` YAML mapping.
    pub fn from_yaml(source: &str) -> anyhow::Result<Self> {
        let types: HashMap<String, String> = serde_yaml::from_str(source)?;
        Ok(Self { types })
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read MIME table {}", path.display()))?;
        let table = Self::from_yaml(&source)
            .with_context(|| format!("Invalid MIME table {}", path.display()))?;

        tracing::info!(path = %path.display(), entries = table.len(), "Loaded MIME table");
        Ok(table)
    }

    /// Looks up an extension given without its leading dot.
    pub fn get(&self, extension: &str) -> Option<&str> {
        self.types.get(extension).map(String::as_str)
    }

    /// Content type for a file, judged by its extension.
    pub fn for_path(&self, path: &Path) -> Option<&str> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.get(ext))
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl FromIterator<(String, String)> for MimeTable {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self { types: iter.into_iter().collect() }
    }
}
