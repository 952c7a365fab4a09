//! # Transfer Store
//!
//! The persistence seam of the ledger.
//!
//! This module defines the `TransferStore` trait and its in-memory
//! implementation. The file-backed implementations live in `storage`.
//! Stores only ever append; totals are derived on read, never kept as
//! counters.

use crate::{KarmaError, KarmaTransfer, UserId};
use std::slice;

// =============================================================================
// TRANSFERSTORE TRAIT
// =============================================================================

/// Append-only storage for transfers.
///
/// All fallible operations return `Result<T, KarmaError>` so in-memory and
/// persistent stores can be used interchangeably. Persistent stores report
/// every backend failure as `KarmaError::StorageUnavailable`.
pub trait TransferStore {
    /// Append a batch of transfers atomically: either all of them become
    /// visible or none do.
    fn append_batch(&mut self, transfers: &[KarmaTransfer]) -> Result<(), KarmaError>;

    /// Append a single transfer.
    fn append(&mut self, transfer: &KarmaTransfer) -> Result<(), KarmaError> {
        self.append_batch(slice::from_ref(transfer))
    }

    /// Every stored transfer, in insertion order.
    fn scan_all(&self) -> Result<Vec<KarmaTransfer>, KarmaError>;

    /// Sum of deltas received by `receiver`; 0 when there are none.
    fn total_for(&self, receiver: &UserId) -> Result<i64, KarmaError>;

    /// Whether `receiver` appears in any transfer, even one worth 0.
    fn has_received(&self, receiver: &UserId) -> Result<bool, KarmaError>;

    /// Number of stored transfers.
    fn transfer_count(&self) -> Result<usize, KarmaError>;
}

// =============================================================================
// IN-MEMORY STORE
// =============================================================================

/// A `Vec`-backed store.
///
/// Volatile unless written out with `formats::ledger_to_bytes`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemoryStore {
    transfers: Vec<KarmaTransfer>,
}

impl MemoryStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store holding an existing history, e.g. a loaded snapshot.
    #[must_use]
    pub fn from_transfers(transfers: Vec<KarmaTransfer>) -> Self {
        Self { transfers }
    }

    /// Borrow the stored history.
    #[must_use]
    pub fn transfers(&self) -> &[KarmaTransfer] {
        &self.transfers
    }
}

impl TransferStore for MemoryStore {
    fn append_batch(&mut self, transfers: &[KarmaTransfer]) -> Result<(), KarmaError> {
        self.transfers.extend_from_slice(transfers);
        Ok(())
    }

    fn scan_all(&self) -> Result<Vec<KarmaTransfer>, KarmaError> {
        Ok(self.transfers.clone())
    }

    fn total_for(&self, receiver: &UserId) -> Result<i64, KarmaError> {
        Ok(self
            .transfers
            .iter()
            .filter(|t| t.receiver() == receiver)
            .fold(0i64, |acc, t| acc.saturating_add(t.delta())))
    }

    fn has_received(&self, receiver: &UserId) -> Result<bool, KarmaError> {
        Ok(self.transfers.iter().any(|t| t.receiver() == receiver))
    }

    fn transfer_count(&self) -> Result<usize, KarmaError> {
        Ok(self.transfers.len())
    }
}

// =============================================================================
// TESTS
// =============================================================================
