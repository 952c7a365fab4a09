//! # redb-backed Transfer Storage
//!
//! A disk-backed transfer store using the redb embedded database, providing:
//! - ACID transactions (one write transaction per appended batch)
//! - Crash safety (copy-on-write B-trees)
//! - MVCC (readers see a consistent snapshot while a write is in flight)
//!
//! ## Tables
//!
//! - `transfers`: seq(u64) -> postcard-serialized `KarmaTransfer`
//! - `by_receiver`: (receiver, seq) -> delta, for range-summed totals
//! - `metadata`: key -> u64 (`next_seq`)
//!
//! Tables are created once in `RedbStore::open`; the application calls it at
//! startup before any message is handled.

use crate::store::TransferStore;
use crate::{KarmaError, KarmaTransfer, UserId};
use redb::{Database, ReadableDatabase, ReadableTable, ReadableTableMetadata, TableDefinition};
use std::fmt::Display;
use std::path::Path;

/// Table for transfers: seq(u64) -> serialized KarmaTransfer bytes
const TRANSFERS: TableDefinition<u64, &[u8]> = TableDefinition::new("transfers");

/// Index for totals: (receiver, seq) -> delta
const BY_RECEIVER: TableDefinition<(&str, u64), i64> = TableDefinition::new("by_receiver");

/// Table for metadata: key string -> value u64
const METADATA: TableDefinition<&str, u64> = TableDefinition::new("metadata");

const NEXT_SEQ_KEY: &str = "next_seq";

fn unavailable(e: impl Display) -> KarmaError {
    KarmaError::StorageUnavailable(e.to_string())
}

/// A disk-backed transfer store using redb.
pub struct RedbStore {
    /// The redb database handle.
    db: Database,
    /// Sequence number of the next transfer to be written.
    next_seq: u64,
}

impl std::fmt::Debug for RedbStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedbStore")
            .field("next_seq", &self.next_seq)
            .finish_non_exhaustive()
    }
}

impl RedbStore {
    /// Open or create a ledger database at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, KarmaError> {
        let db = Database::create(path.as_ref()).map_err(unavailable)?;

        // Create tables if they don't exist
        {
            let write_txn = db.begin_write().map_err(unavailable)?;
            let _ = write_txn.open_table(TRANSFERS).map_err(unavailable)?;
            let _ = write_txn.open_table(BY_RECEIVER).map_err(unavailable)?;
            let _ = write_txn.open_table(METADATA).map_err(unavailable)?;
            write_txn.commit().map_err(unavailable)?;
        }

        let next_seq = {
            let read_txn = db.begin_read().map_err(unavailable)?;
            let table = read_txn.open_table(METADATA).map_err(unavailable)?;
            table
                .get(NEXT_SEQ_KEY)
                .map_err(unavailable)?
                .map(|v| v.value())
                .unwrap_or(0)
        };

        Ok(Self { db, next_seq })
    }
}

// =============================================================================
// TRANSFERSTORE TRAIT IMPLEMENTATION
// =============================================================================

impl TransferStore for RedbStore {
    fn append_batch(&mut self, transfers: &[KarmaTransfer]) -> Result<(), KarmaError> {
        if transfers.is_empty() {
            return Ok(());
        }

        // Serialize before opening the transaction so an encoding failure
        // never leaves a half-written batch behind.
        let encoded = transfers
            .iter()
            .map(|t| {
                postcard::to_allocvec(t).map_err(|e| KarmaError::SerializationError(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut seq = self.next_seq;
        let write_txn = self.db.begin_write().map_err(unavailable)?;
        {
            let mut transfers_table = write_txn.open_table(TRANSFERS).map_err(unavailable)?;
            let mut index_table = write_txn.open_table(BY_RECEIVER).map_err(unavailable)?;
            let mut meta_table = write_txn.open_table(METADATA).map_err(unavailable)?;

            for (transfer, bytes) in transfers.iter().zip(&encoded) {
                transfers_table
                    .insert(seq, bytes.as_slice())
                    .map_err(unavailable)?;
                index_table
                    .insert((transfer.receiver().as_str(), seq), transfer.delta())
                    .map_err(unavailable)?;
                seq = seq.saturating_add(1);
            }
            meta_table.insert(NEXT_SEQ_KEY, seq).map_err(unavailable)?;
        }
        write_txn.commit().map_err(unavailable)?;

        self.next_seq = seq;
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<KarmaTransfer>, KarmaError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let table = read_txn.open_table(TRANSFERS).map_err(unavailable)?;

        let mut transfers = Vec::new();
        for entry in table.iter().map_err(unavailable)? {
            let (_, value) = entry.map_err(unavailable)?;
            let transfer: KarmaTransfer = postcard::from_bytes(value.value())
                .map_err(|e| KarmaError::SerializationError(e.to_string()))?;
            transfers.push(transfer);
        }
        Ok(transfers)
    }

    fn total_for(&self, receiver: &UserId) -> Result<i64, KarmaError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let index = read_txn.open_table(BY_RECEIVER).map_err(unavailable)?;

        let name = receiver.as_str();
        let mut total = 0i64;
        for entry in index
            .range((name, 0u64)..=(name, u64::MAX))
            .map_err(unavailable)?
        {
            let (_, delta) = entry.map_err(unavailable)?;
            total = total.saturating_add(delta.value());
        }
        Ok(total)
    }

    fn has_received(&self, receiver: &UserId) -> Result<bool, KarmaError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let index = read_txn.open_table(BY_RECEIVER).map_err(unavailable)?;

        let name = receiver.as_str();
        let mut entries = index
            .range((name, 0u64)..=(name, u64::MAX))
            .map_err(unavailable)?;
        Ok(entries.next().transpose().map_err(unavailable)?.is_some())
    }

    fn transfer_count(&self) -> Result<usize, KarmaError> {
        let read_txn = self.db.begin_read().map_err(unavailable)?;
        let table = read_txn.open_table(TRANSFERS).map_err(unavailable)?;
        let count = table.len().map_err(unavailable)?;
        Ok(count as usize)
    }
}
