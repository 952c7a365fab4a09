//! # Formats Module
//!
//! Binary snapshot format for ledger histories.
//!
//! This module only converts between transfers and bytes; reading and
//! writing snapshot files lives in `storage::SnapshotStore`.

mod persistence;

pub use persistence::*;
