//! Record persistence for the web application
//!
//! Records are addressed by a string identifier chosen by the handler. The
//! engine never sees this module; handlers receive a store when they are
//! built.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Key-value storage of one record type.
pub trait RecordStore<T>: Send + Sync {
    fn put(&self, id: &str, record: &T) -> anyhow::Result<()>;

    /// Stores `record` only if `id` is unused. Returns `false` when a record
    /// already exists; concurrent creators of one id see exactly one `true`.
    fn create(&self, id: &str, record: &T) -> anyhow::Result<bool>;

    fn get(&self, id: &str) -> anyhow::Result<Option<T>>;

    /// Every readable record, ordered by id.
    fn all(&self) -> anyhow::Result<Vec<T>>;

    fn contains(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.get(id)?.is_some())
    }
}

/// Whether `id` can name a record: non-empty, a single path segment.
pub fn is_valid_id(id: &str) -> bool {
    !id.is_empty()
        && id != "."
        && id != ".."
        && !id.contains(['/', '\\', '\0'])
}

/// One `<id>.yaml` file per record inside a directory.
#[derive(Debug)]
pub struct YamlFileStore<T> {
    dir: PathBuf,
    _record: PhantomData<fn() -> T>,
}

impl<T> YamlFileStore<T> {
    /// Opens `dir`, creating it when missing.
    pub fn open(dir: impl Into<PathBuf>) -> anyhow::Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)
            .with_context(|| format!("Failed to create store directory {}", dir.display()))?;

        Ok(Self {
            dir,
            _record: PhantomData,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn record_path(&self, id: &str) -> anyhow::Result<PathBuf> {
        if !is_valid_id(id) {
            anyhow::bail!("invalid record id {id:?}");
        }
        Ok(self.dir.join(format!("{id}.yaml")))
    }
}

impl<T> RecordStore<T> for YamlFileStore<T>
where
    T: Serialize + DeserializeOwned,
{
    fn put(&self, id: &str, record: &T) -> anyhow::Result<()> {
        let path = self.record_path(id)?;
        let yaml = serde_yaml::to_string(record)?;
        fs::write(&path, yaml)
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(id, path = %path.display(), "Stored record");
        Ok(())
    }

    fn create(&self, id: &str, record: &T) -> anyhow::Result<bool> {
        let path = self.record_path(id)?;
        let yaml = serde_yaml::to_string(record)?;

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to create {}", path.display()));
            }
        };
        file.write_all(yaml.as_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;

        tracing::debug!(id, path = %path.display(), "Created record");
        Ok(true)
    }

    fn get(&self, id: &str) -> anyhow::Result<Option<T>> {
        let path = self.record_path(id)?;
        let source = match fs::read_to_string(&path) {
            Ok(source) => source,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to read {}", path.display()));
            }
        };

        let record = serde_yaml::from_str(&source)
            .with_context(|| format!("Corrupt record {}", path.display()))?;
        Ok(Some(record))
    }

    fn contains(&self, id: &str) -> anyhow::Result<bool> {
        Ok(self.record_path(id)?.is_file())
    }

    fn all(&self) -> anyhow::Result<Vec<T>> {
        let entries = fs::read_dir(&self.dir)
            .with_context(|| format!("Failed to list {}", self.dir.display()))?;

        let mut paths = Vec::new();
        for entry in entries {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "yaml") {
                paths.push(path);
            }
        }
        paths.sort();

        let mut records = Vec::with_capacity(paths.len());
        for path in paths {
            let parsed: anyhow::Result<T> = fs::read_to_string(&path)
                .map_err(anyhow::Error::from)
                .and_then(|source| Ok(serde_yaml::from_str(&source)?));
            match parsed {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable record"),
            }
        }
        Ok(records)
    }
}
