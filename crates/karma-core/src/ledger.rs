//! # Karma Ledger
//!
//! The write path and the read facade over a transfer store.
//!
//! `Ledger::record` turns one message's deltas into transfers, drops the
//! self-targeted pair and appends the rest as a single atomic batch. Reads go
//! straight to the store (`total_for`) or through an immutable snapshot that
//! the `aggregate` functions consume.
//!
//! ## Storage Backends
//!
//! - `InMemory`: a `MemoryStore` (fast, volatile)
//! - `Persistent`: a `RedbStore` (disk-backed, ACID)
//! - `Snapshot`: a `SnapshotStore` (in memory, every batch written through to
//!   a snapshot file before it becomes visible)

use crate::aggregate::{self, LedgerStats};
use crate::message::KarmaChange;
use crate::storage::{RedbStore, SnapshotStore};
use crate::store::{MemoryStore, TransferStore};
use crate::{Deltas, Direction, KarmaError, KarmaTransfer, Score, UserId};
use chrono::{DateTime, Utc};
use std::path::Path;

/// Storage backend for a Ledger.
#[derive(Debug)]
pub enum StorageBackend {
    /// In-memory store (fast, volatile).
    InMemory(MemoryStore),
    /// Disk-backed store using redb (ACID, persistent).
    Persistent(RedbStore),
    /// Snapshot file mirrored in memory.
    Snapshot(SnapshotStore),
}

impl Default for StorageBackend {
    fn default() -> Self {
        Self::InMemory(MemoryStore::new())
    }
}

impl TransferStore for StorageBackend {
    fn append_batch(&mut self, transfers: &[KarmaTransfer]) -> Result<(), KarmaError> {
        match self {
            Self::InMemory(store) => store.append_batch(transfers),
            Self::Persistent(store) => store.append_batch(transfers),
            Self::Snapshot(store) => store.append_batch(transfers),
        }
    }

    fn scan_all(&self) -> Result<Vec<KarmaTransfer>, KarmaError> {
        match self {
            Self::InMemory(store) => store.scan_all(),
            Self::Persistent(store) => store.scan_all(),
            Self::Snapshot(store) => store.scan_all(),
        }
    }

    fn total_for(&self, receiver: &UserId) -> Result<i64, KarmaError> {
        match self {
            Self::InMemory(store) => store.total_for(receiver),
            Self::Persistent(store) => store.total_for(receiver),
            Self::Snapshot(store) => store.total_for(receiver),
        }
    }

    fn has_received(&self, receiver: &UserId) -> Result<bool, KarmaError> {
        match self {
            Self::InMemory(store) => store.has_received(receiver),
            Self::Persistent(store) => store.has_received(receiver),
            Self::Snapshot(store) => store.has_received(receiver),
        }
    }

    fn transfer_count(&self) -> Result<usize, KarmaError> {
        match self {
            Self::InMemory(store) => store.transfer_count(),
            Self::Persistent(store) => store.transfer_count(),
            Self::Snapshot(store) => store.transfer_count(),
        }
    }
}

/// What a call to `record` actually wrote.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RecordOutcome {
    /// Number of transfers appended.
    pub recorded: usize,
    /// A self-targeted pair was present and dropped.
    pub self_karma_dropped: bool,
}

/// The karma ledger.
///
/// Not `Clone`: a redb handle cannot be duplicated. The application shares a
/// ledger behind a lock instead.
#[derive(Debug, Default)]
pub struct Ledger {
    backend: StorageBackend,
}

impl Ledger {
    /// Create an empty in-memory ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Open or create a persistent redb ledger at the given path.
    pub fn with_redb(path: impl AsRef<Path>) -> Result<Self, KarmaError> {
        let store = RedbStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Persistent(store),
        })
    }

    /// Open or create a ledger kept in a snapshot file at the given path.
    pub fn with_snapshot(path: impl AsRef<Path>) -> Result<Self, KarmaError> {
        let store = SnapshotStore::open(path)?;
        Ok(Self {
            backend: StorageBackend::Snapshot(store),
        })
    }

    /// Check whether writes survive a restart.
    #[must_use]
    pub fn is_persistent(&self) -> bool {
        !matches!(self.backend, StorageBackend::InMemory(_))
    }

    /// Get a reference to the storage backend.
    #[must_use]
    pub fn backend(&self) -> &StorageBackend {
        &self.backend
    }

    // =========================================================================
    // WRITES
    // =========================================================================

    /// Record one message's deltas from `giver`, stamped with the current time.
    ///
    /// The pair targeting the giver is dropped silently. The remaining pairs
    /// are appended in one batch; on failure nothing from this call is kept.
    pub fn record(&mut self, giver: &UserId, deltas: &Deltas) -> Result<RecordOutcome, KarmaError> {
        self.record_at(giver, deltas, Utc::now())
    }

    /// Record with an explicit timestamp.
    pub fn record_at(
        &mut self,
        giver: &UserId,
        deltas: &Deltas,
        timestamp: DateTime<Utc>,
    ) -> Result<RecordOutcome, KarmaError> {
        let transfers: Vec<KarmaTransfer> = deltas
            .iter()
            .filter_map(|(target, &delta)| {
                KarmaTransfer::between(giver.clone(), target.clone(), delta, timestamp)
            })
            .collect();

        self.backend.append_batch(&transfers)?;

        Ok(RecordOutcome {
            recorded: transfers.len(),
            self_karma_dropped: deltas.contains_key(giver),
        })
    }

    /// Record a scanned message.
    pub fn record_change(&mut self, change: &KarmaChange) -> Result<RecordOutcome, KarmaError> {
        self.record(&change.giver, &change.deltas)
    }

    /// Append transfers that already exist elsewhere, e.g. from an imported
    /// snapshot. Timestamps are kept as they are.
    pub fn import(&mut self, transfers: &[KarmaTransfer]) -> Result<usize, KarmaError> {
        self.backend.append_batch(transfers)?;
        Ok(transfers.len())
    }

    // =========================================================================
    // READS
    // =========================================================================

    /// Net karma received by `user`; 0 when they have none.
    pub fn total_for(&self, user: &UserId) -> Result<i64, KarmaError> {
        self.backend.total_for(user)
    }

    /// Whether `user` has received any transfer at all.
    ///
    /// Distinguishes "no karma for x" from "x has 0 points".
    pub fn has_received(&self, user: &UserId) -> Result<bool, KarmaError> {
        self.backend.has_received(user)
    }

    /// Snapshot of every transfer, in insertion order.
    pub fn all_transfers(&self) -> Result<Vec<KarmaTransfer>, KarmaError> {
        self.backend.scan_all()
    }

    /// Number of stored transfers.
    pub fn transfer_count(&self) -> Result<usize, KarmaError> {
        self.backend.transfer_count()
    }

    /// Top or bottom `limit` receivers, ascending by total.
    pub fn leaderboard(&self, direction: Direction, limit: usize) -> Result<Vec<Score>, KarmaError> {
        let snapshot = self.all_transfers()?;
        Ok(aggregate::leaderboard(&snapshot, direction, limit))
    }

    /// The giver with the largest sum of positive deltas.
    pub fn top_giver(&self) -> Result<Option<Score>, KarmaError> {
        Ok(aggregate::top_giver(&self.all_transfers()?))
    }

    /// The giver with the most negative sum of negative deltas.
    pub fn top_taker(&self) -> Result<Option<Score>, KarmaError> {
        Ok(aggregate::top_taker(&self.all_transfers()?))
    }

    /// Transfer / receiver / giver counts.
    pub fn stats(&self) -> Result<LedgerStats, KarmaError> {
        Ok(LedgerStats::from_transfers(&self.all_transfers()?))
    }
}

// =============================================================================
// TESTS
// =============================================================================
