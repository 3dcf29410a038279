//! Durable per-user background preferences.
//!
//! [`PreferenceStore`] keeps the `userId → backgroundRef` mapping in memory and
//! writes the full document through a [`PreferenceBackend`] on every mutation. The
//! backend is created via [`create_backend`] from configuration.

pub mod store;

pub use store::{BackgroundRef, PreferenceDocument, PreferenceStore};

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Raw storage for the serialized preference document.
///
/// Implementations only move bytes; parsing and fail-open handling live in the store.
pub trait PreferenceBackend: Send + Sync {
    /// Read the stored document, or `None` if nothing has been written yet.
    fn load(&self) -> Result<Option<String>>;

    /// Replace the stored document.
    fn save(&self, contents: &str) -> Result<()>;

    /// Human-readable location, for diagnostics.
    fn describe(&self) -> String;
}

/// JSON file on disk. Writes go to a temp file that is renamed into place.
pub struct FileBackend {
    path: PathBuf,
}

impl FileBackend {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl PreferenceBackend for FileBackend {
    fn load(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        Ok(Some(contents))
    }

    fn save(&self, contents: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create directory {}", parent.display()))?;
        }

        let tmp_path = self.path.with_extension("tmp");
        std::fs::write(&tmp_path, contents)
            .with_context(|| format!("failed to write temp file: {}", tmp_path.display()))?;
        std::fs::rename(&tmp_path, &self.path).context("failed to rename temp file")?;
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// In-process storage. Clones share the same slot, so a test can hand one clone to
/// a store and inspect or reload from another.
#[derive(Clone, Default)]
pub struct MemoryBackend {
    slot: Arc<Mutex<Option<String>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the backend with raw contents, e.g. a corrupt document.
    pub fn with_contents(contents: impl Into<String>) -> Self {
        Self {
            slot: Arc::new(Mutex::new(Some(contents.into()))),
        }
    }

    pub fn contents(&self) -> Option<String> {
        self.slot.lock().ok().and_then(|slot| slot.clone())
    }
}

impl PreferenceBackend for MemoryBackend {
    fn load(&self) -> Result<Option<String>> {
        let slot = self
            .slot
            .lock()
            .map_err(|e| anyhow::anyhow!("preference slot poisoned: {e}"))?;
        Ok(slot.clone())
    }

    fn save(&self, contents: &str) -> Result<()> {
        let mut slot = self
            .slot
            .lock()
            .map_err(|e| anyhow::anyhow!("preference slot poisoned: {e}"))?;
        *slot = Some(contents.to_string());
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".into()
    }
}

/// Create a preference backend from config.
///
/// `"file"` persists to `storage.preferences_path`; `"memory"` keeps nothing across runs.
pub fn create_backend(config: &crate::config::AppConfig) -> Result<Box<dyn PreferenceBackend>> {
    match config.storage.backend.as_str() {
        "file" => Ok(Box::new(FileBackend::new(config.resolved_preferences_path()))),
        "memory" => Ok(Box::new(MemoryBackend::new())),
        other => anyhow::bail!("unknown preference backend: {other}. Supported: file, memory"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn memory_backend_clones_share_slot() {
        let a = MemoryBackend::new();
        let b = a.clone();
        a.save("{}").unwrap();
        assert_eq!(b.load().unwrap().as_deref(), Some("{}"));
    }

    #[test]
    fn unknown_backend_rejected() {
        let mut config = crate::config::AppConfig::default();
        config.storage.backend = "redis".into();
        assert!(create_backend(&config).is_err());
    }
}
