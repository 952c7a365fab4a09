//! # Storage Module
//!
//! Persistent transfer stores.
//!
//! - `RedbStore`: every transfer in an ACID embedded database; a secondary
//!   `(receiver, seq)` index serves per-user lookups without a full scan.
//! - `SnapshotStore`: the history in memory, mirrored to one snapshot file
//!   that is replaced atomically on every write.

mod redb_store;
mod snapshot_store;

pub use redb_store::RedbStore;
pub use snapshot_store::{SnapshotStore, load_snapshot};
