use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Last known state of one handle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSnapshot {
    pub handle: String,
    pub rating: i64,
    pub rank: String,
    pub max_rating: i64,
    pub max_rank: String,
    pub last_updated: DateTime<Utc>,
}

/// Handle -> snapshot map persisted between runs.
///
/// Not safe for concurrent runs: the file is read at start and rewritten at
/// the end without any locking.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SnapshotStore {
    pub entries: BTreeMap<String, UserSnapshot>,
}

impl SnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load the store. A missing file is an empty store; so is a corrupt one.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let data = match std::fs::read(path) {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "no snapshot file yet");
                return Ok(Self::new());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };

        match Self::from_bytes(&data) {
            Ok(store) => {
                debug!(path = %path.display(), handles = store.len(), "snapshot store loaded");
                Ok(store)
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "snapshot file is corrupted, starting fresh");
                Ok(Self::new())
            }
        }
    }

    /// Write the whole store via a temp file and rename.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("failed to create {}", parent.display()))?;
        }
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, self.to_bytes()?)
            .with_context(|| format!("failed to write {}", tmp.display()))?;
        std::fs::rename(&tmp, path)
            .with_context(|| format!("failed to replace {}", path.display()))?;
        info!(path = %path.display(), handles = self.len(), "snapshot store saved");
        Ok(())
    }

    /// Overwrite entries for the given snapshots, keep everything else.
    pub fn merge(&mut self, snapshots: impl IntoIterator<Item = UserSnapshot>) {
        for snap in snapshots {
            self.entries.insert(snap.handle.clone(), snap);
        }
    }

    pub fn get(&self, handle: &str) -> Option<&UserSnapshot> {
        self.entries.get(handle)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec_pretty(self)?)
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(data)?)
    }
}
