//! # Delta Resolver
//!
//! Turns raw tokens into a per-target net point change.
//!
//! - The last character decides the sign: `-` takes a point, `+` gives one.
//! - Every token is worth exactly one point, however long its run is.
//! - One pair of surrounding parentheses is removed.
//! - Targets are normalized like every other [`UserId`]; blank ones are dropped.
//! - Repeats inside one message are summed, so the ledger sees at most one
//!   delta per target per message.

use crate::scanner;
use crate::{Deltas, UserId};

/// Resolve one raw token into its target and signed unit delta.
///
/// Returns `None` when nothing usable is left once the run and the
/// parentheses are stripped.
#[must_use]
pub fn resolve_token(token: &str) -> Option<(UserId, i64)> {
    let symbol = token.chars().last()?;
    let (sign, stripped) = if symbol == '-' {
        (-1, token.trim_end_matches('-'))
    } else {
        (1, token.trim_end_matches('+'))
    };

    let inner = stripped
        .strip_prefix('(')
        .and_then(|rest| rest.strip_suffix(')'))
        .unwrap_or(stripped);

    UserId::normalize(inner).map(|target| (target, sign))
}

/// Resolve a sequence of raw tokens, merging repeats by summation.
pub fn resolve<'a, I>(tokens: I) -> Deltas
where
    I: IntoIterator<Item = &'a str>,
{
    let mut deltas = Deltas::new();
    for (target, sign) in tokens.into_iter().filter_map(resolve_token) {
        let entry = deltas.entry(target).or_insert(0);
        *entry = entry.saturating_add(sign);
    }
    deltas
}

/// Extract and resolve a whole line in one step.
#[must_use]
pub fn resolve_line(line: &str) -> Deltas {
    resolve(scanner::extract(line))
}

// =============================================================================
// TESTS
// =============================================================================
