//! # Ledger Storage Wiring
//!
//! Opens a ledger for the configured backend. Both backends are durable once
//! `record` returns:
//!
//! - `redb`: the database file is opened (tables created on first use).
//! - `file`: the snapshot file is loaded, or created empty, and every write is
//!   mirrored to it before it becomes visible.

use crate::config::{Backend, StorageConfig};
use karma_core::{KarmaError, Ledger};

/// Open the ledger described by `storage`, creating it when missing.
pub fn open_ledger(storage: &StorageConfig) -> Result<Ledger, KarmaError> {
    match storage.backend {
        Backend::Redb => Ledger::with_redb(&storage.database),
        Backend::File => Ledger::with_snapshot(&storage.database),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use karma_core::{Deltas, UserId};

    fn user(name: &str) -> UserId {
        UserId::normalize(name).expect("valid user")
    }

    fn one_point(target: &str) -> Deltas {
        [(user(target), 1)].into_iter().collect()
    }

    #[test]
    fn file_backend_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            database: dir.path().join("karma.snapshot"),
            backend: Backend::File,
        };

        {
            let mut ledger = open_ledger(&storage).expect("open");
            assert!(ledger.is_persistent());
            ledger.record(&user("dave"), &one_point("alice")).expect("record");
        }

        let reopened = open_ledger(&storage).expect("reopen");
        assert_eq!(reopened.total_for(&user("alice")).expect("total"), 1);
    }

    #[test]
    fn redb_backend_survives_reopen() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            database: dir.path().join("karma.redb"),
            backend: Backend::Redb,
        };

        {
            let mut ledger = open_ledger(&storage).expect("open");
            assert!(ledger.is_persistent());
            ledger.record(&user("dave"), &one_point("alice")).expect("record");
        }

        let reopened = open_ledger(&storage).expect("reopen");
        assert_eq!(reopened.total_for(&user("alice")).expect("total"), 1);
    }

    #[test]
    fn garbage_snapshot_is_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage = StorageConfig {
            database: dir.path().join("karma.snapshot"),
            backend: Backend::File,
        };
        std::fs::write(&storage.database, b"not a snapshot").expect("write");
        assert!(matches!(
            open_ledger(&storage),
            Err(KarmaError::SerializationError(_))
        ));
    }
}
