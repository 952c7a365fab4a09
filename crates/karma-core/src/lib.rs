//! # karma-core
//!
//! The karma ledger - THE LOGIC.
//!
//! Reads chat lines for `name++` / `name--` / `(some name)++` tokens, turns
//! them into signed point transfers between the author and each target, keeps
//! every transfer in an append-only store, and derives totals, leaderboards
//! and the most prolific giver and taker from that history.
//!
//! ## Pipeline
//!
//! ```text
//! raw line ─► scanner ─► resolver ─► (giver, {target: delta}) ─► Ledger::record
//!                                                                    │
//!                             aggregate ◄── snapshot ◄───────────────┘
//! ```
//!
//! ## Architectural Constraints
//!
//! - No async, no network dependencies (pure Rust)
//! - Extraction and resolution are pure functions of the input line
//! - The ledger is append-only; totals are always derived, never stored
//! - Chat transport, command routing and reply text belong to the caller
//!
//! ```
//! use karma_core::{IncomingMessage, Ledger, UserId, scan_message};
//!
//! let mut ledger = Ledger::new();
//! let change = scan_message(&IncomingMessage::public("dave", "thanks alice++"))
//!     .expect("karma in message");
//! ledger.record_change(&change).expect("in-memory write");
//!
//! let alice = UserId::parse("Alice").expect("valid id");
//! assert_eq!(ledger.total_for(&alice).expect("read"), 1);
//! ```

// =============================================================================
// MODULES
// =============================================================================

pub mod aggregate;
pub mod formats;
pub mod ledger;
pub mod message;
pub mod primitives;
pub mod resolver;
pub mod scanner;
pub mod storage;
pub mod store;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{Deltas, Direction, KarmaError, KarmaTransfer, Score, UserId};

// =============================================================================
// RE-EXPORTS: Pipeline
// =============================================================================

pub use aggregate::LedgerStats;
pub use ledger::{Ledger, RecordOutcome, StorageBackend};
pub use message::{IncomingMessage, KarmaChange, scan_message};
pub use resolver::{resolve, resolve_line, resolve_token};
pub use scanner::{Tokens, extract};
pub use storage::{RedbStore, SnapshotStore, load_snapshot};
pub use store::{MemoryStore, TransferStore};

// =============================================================================
// RE-EXPORTS: Formats (from formats module)
// =============================================================================

pub use formats::{SnapshotHeader, ledger_from_bytes, ledger_to_bytes};
