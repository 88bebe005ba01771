//! Versioned JSON snapshots of the live tournament (file-backed and in-memory).

use super::{SnapshotStore, StoreError};
use crate::models::{TournamentSnapshot, SNAPSHOT_VERSION};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Just enough of a snapshot to read its version before trusting the rest.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

pub fn encode_snapshot(snapshot: &TournamentSnapshot) -> Result<String, StoreError> {
    Ok(serde_json::to_string_pretty(snapshot)?)
}

/// Parse a snapshot, refusing any version other than [`SNAPSHOT_VERSION`].
pub fn decode_snapshot(json: &str) -> Result<TournamentSnapshot, StoreError> {
    let probe: VersionProbe = serde_json::from_str(json)?;
    if probe.version != SNAPSHOT_VERSION {
        return Err(StoreError::IncompatibleSnapshot {
            found: probe.version,
            expected: SNAPSHOT_VERSION,
        });
    }
    Ok(serde_json::from_str(json)?)
}

/// Snapshot kept in a single JSON file on local disk.
#[derive(Clone, Debug)]
pub struct JsonFileSnapshotStore {
    path: PathBuf,
}

impl JsonFileSnapshotStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

impl SnapshotStore for JsonFileSnapshotStore {
    fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StoreError> {
        let json = encode_snapshot(snapshot)?;
        // Atomic replace: write beside the target, then rename over it.
        let tmp = self.temp_path();
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }

    fn load(&self) -> Result<Option<TournamentSnapshot>, StoreError> {
        let json = match std::fs::read_to_string(&self.path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        decode_snapshot(&json).map(Some)
    }

    fn clear(&self) -> Result<(), StoreError> {
        match std::fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

/// Snapshot held as a JSON string in memory; same encoding as the file store.
#[derive(Default)]
pub struct MemorySnapshotStore {
    json: Mutex<Option<String>>,
}

impl MemorySnapshotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raw stored JSON, if any.
    pub fn raw(&self) -> Option<String> {
        match self.json.lock() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Overwrite the stored JSON verbatim (e.g. a snapshot from an older build).
    pub fn put_raw(&self, json: impl Into<String>) {
        if let Ok(mut guard) = self.json.lock() {
            *guard = Some(json.into());
        }
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StoreError> {
        let json = encode_snapshot(snapshot)?;
        let mut guard = self
            .json
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        *guard = Some(json);
        Ok(())
    }

    fn load(&self) -> Result<Option<TournamentSnapshot>, StoreError> {
        self.raw().as_deref().map(decode_snapshot).transpose()
    }

    fn clear(&self) -> Result<(), StoreError> {
        let mut guard = self
            .json
            .lock()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        *guard = None;
        Ok(())
    }
}
