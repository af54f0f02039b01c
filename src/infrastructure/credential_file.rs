// File-backed credential slot
use crate::application::credential_store::CredentialStore;
use anyhow::Context;
use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Key of the secret inside the store file.
const STORAGE_KEY: &str = "password";

/// JSON object on disk, one entry per key. Only [`STORAGE_KEY`] is used.
#[derive(Debug, Clone)]
pub struct FileCredentialStore {
    path: PathBuf,
}

impl FileCredentialStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_entries(&self) -> anyhow::Result<BTreeMap<String, String>> {
        match fs::read(&self.path) {
            Ok(bytes) => serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to parse {}", self.path.display())),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(BTreeMap::new()),
            Err(e) => Err(e).with_context(|| format!("Failed to read {}", self.path.display())),
        }
    }

    fn write_entries(&self, entries: &BTreeMap<String, String>) -> anyhow::Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(entries)?)
            .with_context(|| format!("Failed to write {}", tmp.display()))?;
        fs::rename(&tmp, &self.path)
            .with_context(|| format!("Failed to replace {}", self.path.display()))
    }
}

impl CredentialStore for FileCredentialStore {
    fn load(&self) -> anyhow::Result<Option<String>> {
        let entries = self.read_entries()?;
        Ok(entries
            .get(STORAGE_KEY)
            .filter(|secret| !secret.is_empty())
            .cloned())
    }

    fn save(&self, secret: &str) -> anyhow::Result<()> {
        let mut entries = self.read_entries()?;
        entries.insert(STORAGE_KEY.to_string(), secret.to_string());
        self.write_entries(&entries)
    }

    fn clear(&self) -> anyhow::Result<()> {
        let mut entries = self.read_entries()?;
        if entries.remove(STORAGE_KEY).is_none() {
            return Ok(());
        }
        self.write_entries(&entries)
    }
}
