//! # Core Type Definitions
//!
//! This module contains all core types for the karma ledger:
//! - User identifiers (`UserId`)
//! - Transfer records (`KarmaTransfer`)
//! - Per-message deltas (`Deltas`)
//! - Aggregate outputs (`Score`, `Direction`)
//! - Error types (`KarmaError`)
//!
//! ## Determinism Guarantees
//!
//! All types in this module:
//! - Use integer arithmetic only (no floating-point)
//! - Implement `Ord` where they are used as `BTreeMap` keys
//! - Use saturating arithmetic for point sums to prevent overflow

use crate::primitives::MAX_IDENTIFIER_LENGTH;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use thiserror::Error;

// =============================================================================
// USER IDENTIFIER
// =============================================================================

/// A normalized user identifier.
///
/// A user is an opaque string, not a verified account: `Alice`, ` alice ` and
/// `ALICE` are the same user. The only way to build one is through
/// [`UserId::normalize`], so every `UserId` is trimmed, lower-cased,
/// non-empty and at most `MAX_IDENTIFIER_LENGTH` bytes.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    /// Normalize raw text into an identifier.
    ///
    /// Returns `None` when nothing is left after trimming, or when the
    /// result exceeds `MAX_IDENTIFIER_LENGTH`.
    #[must_use]
    pub fn normalize(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        if normalized.is_empty() || normalized.len() > MAX_IDENTIFIER_LENGTH {
            return None;
        }
        Some(Self(normalized))
    }

    /// Normalize raw text, failing with `InvalidIdentifier` when it is unusable.
    pub fn parse(raw: &str) -> Result<Self, KarmaError> {
        Self::normalize(raw).ok_or_else(|| KarmaError::InvalidIdentifier(raw.to_string()))
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// =============================================================================
// DELTAS
// =============================================================================

/// Net point change per target for one message.
///
/// Produced by the resolver, consumed by the ledger. A `BTreeMap` keeps the
/// write order of a batch deterministic.
pub type Deltas = BTreeMap<UserId, i64>;

// =============================================================================
// TRANSFER
// =============================================================================

/// One immutable record of a giver changing a receiver's karma.
///
/// Transfers are append-only. There is no setter; a correction is simply
/// another transfer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KarmaTransfer {
    giver: UserId,
    receiver: UserId,
    delta: i64,
    timestamp: DateTime<Utc>,
}

impl KarmaTransfer {
    /// Build a transfer between two distinct users.
    ///
    /// Returns `None` for a self transfer; those are never stored.
    #[must_use]
    pub fn between(
        giver: UserId,
        receiver: UserId,
        delta: i64,
        timestamp: DateTime<Utc>,
    ) -> Option<Self> {
        if giver == receiver {
            return None;
        }
        Some(Self {
            giver,
            receiver,
            delta,
            timestamp,
        })
    }

    #[must_use]
    pub fn giver(&self) -> &UserId {
        &self.giver
    }

    #[must_use]
    pub fn receiver(&self) -> &UserId {
        &self.receiver
    }

    #[must_use]
    pub fn delta(&self) -> i64 {
        self.delta
    }

    /// Wall-clock creation time. Informational only; not guaranteed monotonic.
    #[must_use]
    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

// =============================================================================
// AGGREGATE OUTPUTS
// =============================================================================

/// Which end of the leaderboard to read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Highest totals (last entries of the ascending order).
    Top,
    /// Lowest totals (first entries of the ascending order).
    Bottom,
}

/// A user paired with a point sum.
///
/// Used for leaderboard lines as well as for the top giver / top taker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Score {
    pub user: UserId,
    pub points: i64,
}

impl Score {
    #[must_use]
    pub fn new(user: UserId, points: i64) -> Self {
        Self { user, points }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the karma ledger.
///
/// Text that does not look like karma is never an error, and neither is a
/// self-targeted token or an empty ledger. Those are reported as data.
#[derive(Debug, Error)]
pub enum KarmaError {
    /// The persistence layer could not accept a write or serve a read.
    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    /// A serialization or deserialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A user identifier was empty or too long after normalization.
    #[error("Invalid identifier: {0:?}")]
    InvalidIdentifier(String),

    /// A query carried arguments outside the accepted range.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),

    /// Configuration could not be loaded or was inconsistent.
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

// =============================================================================
// TESTS
// =============================================================================
