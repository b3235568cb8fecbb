//! Host snapshot persistence

use anyhow::Context as _;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use ti_core::{HostSnapshot, InMemoryHost};

/// JSON file holding a [`HostSnapshot`]
#[derive(Debug, Clone)]
pub struct StateFile {
    path: PathBuf,
}

impl StateFile {
    /// Snapshot at `path`
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location on disk
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the host; a missing file yields an empty host
    ///
    /// # Errors
    /// Returns error if the file exists but cannot be read or parsed
    pub fn load(&self) -> anyhow::Result<Arc<InMemoryHost>> {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "no snapshot, starting empty");
            return Ok(Arc::new(InMemoryHost::new()));
        }
        let raw = std::fs::read_to_string(&self.path)
            .with_context(|| format!("failed to read {}", self.path.display()))?;
        let snapshot: HostSnapshot = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse {}", self.path.display()))?;
        Ok(Arc::new(InMemoryHost::from_snapshot(snapshot)))
    }

    /// Write the host back
    ///
    /// # Errors
    /// Returns error if the file cannot be written
    pub fn save(&self, host: &InMemoryHost) -> anyhow::Result<()> {
        let raw = serde_json::to_string_pretty(&host.snapshot())?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write {}", self.path.display()))?;
        tracing::debug!(path = %self.path.display(), "snapshot saved");
        Ok(())
    }
}
