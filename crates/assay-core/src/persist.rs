use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use assay_dsa::GroupCounts;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Writes `bytes` to `path` via a sibling temp file, `fsync`, then rename.
///
/// Readers see either the previous contents or the new contents, never a
/// partial file. On unix the parent directory is synced after the rename.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.as_file_mut().write_all(bytes)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|err| err.error)?;

    #[cfg(unix)]
    fs::File::open(parent)?.sync_all()?;

    Ok(())
}

/// Persisted form of one active assignment. Field names match the on-disk
/// document and are stable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredAssignment {
    pub metal: String,
    pub full_name: String,
    pub period: String,
    pub token: String,
}

/// The whole durable ledger state in one document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(default)]
    pub assignments: BTreeMap<String, StoredAssignment>,
    #[serde(default)]
    pub used: BTreeSet<String>,
    #[serde(default)]
    pub counts: GroupCounts,
}

/// Snapshot file on disk.
#[derive(Debug, Clone)]
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// A missing file is an empty ledger.
    pub fn load(&self) -> Result<Snapshot> {
        match fs::read(&self.path) {
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Snapshot::default()),
            Err(err) => Err(err.into()),
        }
    }

    pub fn store(&self, snapshot: &Snapshot) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(snapshot)?;
        write_atomic(&self.path, &bytes)?;
        Ok(())
    }
}
