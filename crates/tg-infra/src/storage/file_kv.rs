use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing::{debug, warn};

use tg_core::ports::{KeyValueStorePort, KvStoreError};

type Entries = BTreeMap<String, String>;

/// Key-value storage backed by one JSON object file.
///
/// Every write rewrites the whole file through a temporary sibling and a
/// rename, so readers see either the previous or the new contents.
pub struct FileKeyValueStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_content(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .with_context(|| format!("read store file failed: {}", self.path.display()))?;
        Ok(Some(content).filter(|content| !content.trim().is_empty()))
    }

    fn read_entries(&self) -> Result<Entries> {
        let Some(content) = self.read_content()? else {
            return Ok(Entries::new());
        };
        serde_json::from_str(&content)
            .with_context(|| format!("parse store file failed: {}", self.path.display()))
    }

    /// Entries to write over. An unparsable file is moved to a `.corrupt`
    /// sibling and replaced, so one bad write never blocks later saves.
    fn entries_for_update(&self) -> Result<Entries> {
        let Some(content) = self.read_content()? else {
            return Ok(Entries::new());
        };
        match serde_json::from_str(&content) {
            Ok(entries) => Ok(entries),
            Err(err) => {
                let aside = self.path.with_extension("json.corrupt");
                warn!(
                    path = %self.path.display(),
                    moved_to = %aside.display(),
                    error = %err,
                    "store file unparsable, starting from an empty store"
                );
                fs::rename(&self.path, &aside).with_context(|| {
                    format!(
                        "move corrupt store aside failed: {} -> {}",
                        self.path.display(),
                        aside.display()
                    )
                })?;
                Ok(Entries::new())
            }
        }
    }

    fn write_entries(&self, entries: &Entries) -> Result<()> {
        if let Some(dir) = self.path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("create store dir failed: {}", dir.display()))?;
        }

        let content = serde_json::to_string_pretty(entries).context("serialize store failed")?;
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, content)
            .with_context(|| format!("write temp store failed: {}", tmp_path.display()))?;
        fs::rename(&tmp_path, &self.path).with_context(|| {
            format!(
                "rename temp store to target failed: {} -> {}",
                tmp_path.display(),
                self.path.display()
            )
        })?;

        debug!(path = %self.path.display(), keys = entries.len(), "store file written");
        Ok(())
    }

    fn update(&self, apply: impl FnOnce(&mut Entries)) -> Result<(), KvStoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| KvStoreError::Unavailable("store lock poisoned".into()))?;
        let mut entries = self.entries_for_update().map_err(io_error)?;
        apply(&mut entries);
        self.write_entries(&entries).map_err(io_error)
    }
}

fn io_error(err: anyhow::Error) -> KvStoreError {
    KvStoreError::Io(format!("{err:#}"))
}

impl KeyValueStorePort for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, KvStoreError> {
        let _guard = self
            .lock
            .lock()
            .map_err(|_| KvStoreError::Unavailable("store lock poisoned".into()))?;
        let mut entries = self.read_entries().map_err(io_error)?;
        Ok(entries.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), KvStoreError> {
        self.update(|entries| {
            entries.insert(key.to_string(), value.to_string());
        })
    }

    fn remove(&self, key: &str) -> Result<(), KvStoreError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }
}
