//! # Ledger Primitives
//!
//! Hardcoded runtime constants for the karma core.
//!
//! These values are compiled into the binary and are immutable at runtime.
//! The application may narrow them (e.g. a smaller leaderboard limit from
//! configuration) but never widen them.

/// Minimum length of a trailing `+`/`-` run for a token to count as karma.
///
/// - `alice+` is ordinary punctuation.
/// - `alice++` and `alice+++` are both worth exactly one point.
pub const MIN_RUN_LENGTH: usize = 2;

/// Number of entries shown by `--top` / `--bottom` when no limit is given.
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 5;

/// Upper bound for any requested leaderboard limit.
pub const MAX_LEADERBOARD_LIMIT: usize = 100;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum length, in bytes, of a normalized user identifier.
///
/// Resolved targets longer than this are discarded the same way empty
/// targets are, so they never become ledger keys.
pub const MAX_IDENTIFIER_LENGTH: usize = 256;

/// Maximum length, in bytes, of a single inbound chat line.
///
/// Enforced at the API boundary before the scanner runs.
pub const MAX_MESSAGE_LENGTH: usize = 65536;

// =============================================================================
// SNAPSHOT FORMAT
// =============================================================================

/// Magic bytes for the karma snapshot format header.
///
/// - File Header = Magic Bytes ("KRMA") + Version (u8) before payload.
pub const MAGIC_BYTES: &[u8; 4] = b"KRMA";

/// Current snapshot format version.
///
/// Increment this when making breaking changes to the serialization format.
pub const FORMAT_VERSION: u8 = 1;
