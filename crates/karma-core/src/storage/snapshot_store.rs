//! # Snapshot-file Transfer Storage
//!
//! Keeps the history in memory and rewrites a canonical snapshot file for
//! every appended batch.
//!
//! The new snapshot goes to a temporary file in the same directory, is
//! synced, and is then renamed over the old one. A batch becomes visible in
//! memory only after that rename succeeded, so a failed write leaves both the
//! file and the in-memory history as they were.

use crate::formats::{MAX_SNAPSHOT_SIZE, ledger_from_bytes, ledger_to_bytes};
use crate::store::{MemoryStore, TransferStore};
use crate::{KarmaError, KarmaTransfer, UserId};
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

fn unavailable_at(path: &Path, e: impl std::fmt::Display) -> KarmaError {
    KarmaError::StorageUnavailable(format!("Snapshot '{}': {}", path.display(), e))
}

/// A transfer store persisted as one snapshot file.
#[derive(Debug)]
pub struct SnapshotStore {
    path: PathBuf,
    memory: MemoryStore,
}

impl SnapshotStore {
    /// Load the snapshot at `path`, or create an empty one when it is missing.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KarmaError> {
        let path = path.as_ref().to_path_buf();
        let memory = if path.exists() {
            MemoryStore::from_transfers(load_snapshot(&path)?)
        } else {
            write_snapshot(&path, &[])?;
            MemoryStore::new()
        };
        Ok(Self { path, memory })
    }

    /// Location of the snapshot file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Read and decode a snapshot file, checking its size first.
pub fn load_snapshot(path: &Path) -> Result<Vec<KarmaTransfer>, KarmaError> {
    let metadata = std::fs::metadata(path).map_err(|e| unavailable_at(path, e))?;
    if metadata.len() > MAX_SNAPSHOT_SIZE as u64 {
        return Err(KarmaError::SerializationError(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            MAX_SNAPSHOT_SIZE
        )));
    }
    let bytes = std::fs::read(path).map_err(|e| unavailable_at(path, e))?;
    ledger_from_bytes(&bytes)
}

/// Replace the file at `path` with a snapshot of `transfers`.
fn write_snapshot(path: &Path, transfers: &[KarmaTransfer]) -> Result<(), KarmaError> {
    let data = ledger_to_bytes(transfers)?;
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut file = NamedTempFile::new_in(dir).map_err(|e| unavailable_at(path, e))?;
    file.write_all(&data).map_err(|e| unavailable_at(path, e))?;
    file.as_file().sync_all().map_err(|e| unavailable_at(path, e))?;
    file.persist(path).map_err(|e| unavailable_at(path, e.error))?;
    Ok(())
}

// =============================================================================
// TRANSFERSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl TransferStore for SnapshotStore {
    fn append_batch(&mut self, transfers: &[KarmaTransfer]) -> Result<(), KarmaError> {
        if transfers.is_empty() {
            return Ok(());
        }

        let mut history = self.memory.transfers().to_vec();
        history.extend_from_slice(transfers);
        write_snapshot(&self.path, &history)?;

        self.memory = MemoryStore::from_transfers(history);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<KarmaTransfer>, KarmaError> {
        self.memory.scan_all()
    }

    fn total_for(&self, receiver: &UserId) -> Result<i64, KarmaError> {
        self.memory.total_for(receiver)
    }

    fn has_received(&self, receiver: &UserId) -> Result<bool, KarmaError> {
        self.memory.has_received(receiver)
    }

    fn transfer_count(&self) -> Result<usize, KarmaError> {
        self.memory.transfer_count()
    }
}
