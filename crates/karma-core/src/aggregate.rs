//! # Aggregator
//!
//! Derived views over an immutable snapshot of transfers.
//!
//! Nothing here is stored: every view is recomputed from the slice it is
//! given, so these functions are safe to run while the ledger keeps
//! accepting writes.
//!
//! ## Ordering
//!
//! Totals are accumulated in a `BTreeMap`, so equal totals come out in
//! ascending identifier order, and the stable sort by total keeps it. The
//! same rule picks between givers that tie for top giver or top taker.

use crate::{Direction, KarmaTransfer, Score, UserId};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Net total per receiver.
#[must_use]
pub fn totals(transfers: &[KarmaTransfer]) -> BTreeMap<UserId, i64> {
    let mut totals = BTreeMap::new();
    for transfer in transfers {
        let total: &mut i64 = totals.entry(transfer.receiver().clone()).or_insert(0);
        *total = total.saturating_add(transfer.delta());
    }
    totals
}

/// Net total for one receiver within the snapshot.
#[must_use]
pub fn total_for(transfers: &[KarmaTransfer], user: &UserId) -> i64 {
    transfers
        .iter()
        .filter(|t| t.receiver() == user)
        .fold(0i64, |acc, t| acc.saturating_add(t.delta()))
}

/// The `limit` highest (`Top`) or lowest (`Bottom`) receivers.
///
/// Entries are always in ascending order of total, for both directions.
/// `limit` is clamped to the number of receivers; an empty ledger yields an
/// empty vector.
#[must_use]
pub fn leaderboard(transfers: &[KarmaTransfer], direction: Direction, limit: usize) -> Vec<Score> {
    let mut ranked: Vec<Score> = totals(transfers)
        .into_iter()
        .map(|(user, points)| Score::new(user, points))
        .collect();
    ranked.sort_by_key(|score| score.points);

    let limit = limit.min(ranked.len());
    match direction {
        Direction::Top => ranked.split_off(ranked.len() - limit),
        Direction::Bottom => {
            ranked.truncate(limit);
            ranked
        }
    }
}

/// The giver whose positive transfers add up to the most.
#[must_use]
pub fn top_giver(transfers: &[KarmaTransfer]) -> Option<Score> {
    let sums = sums_by_giver(transfers, |delta| delta > 0);
    // `max_by_key` keeps the last maximum; reverse so the smallest name wins.
    sums.into_iter()
        .rev()
        .max_by_key(|(_, points)| *points)
        .map(|(user, points)| Score::new(user, points))
}

/// The giver whose negative transfers add up to the most negative sum.
#[must_use]
pub fn top_taker(transfers: &[KarmaTransfer]) -> Option<Score> {
    let sums = sums_by_giver(transfers, |delta| delta < 0);
    // `min_by_key` keeps the first minimum, which is already the smallest name.
    sums.into_iter()
        .min_by_key(|(_, points)| *points)
        .map(|(user, points)| Score::new(user, points))
}

fn sums_by_giver(
    transfers: &[KarmaTransfer],
    qualifies: impl Fn(i64) -> bool,
) -> BTreeMap<UserId, i64> {
    let mut sums = BTreeMap::new();
    for transfer in transfers.iter().filter(|t| qualifies(t.delta())) {
        let sum: &mut i64 = sums.entry(transfer.giver().clone()).or_insert(0);
        *sum = sum.saturating_add(transfer.delta());
    }
    sums
}

// =============================================================================
// LEDGER STATISTICS
// =============================================================================

/// Counts describing a ledger snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LedgerStats {
    pub transfer_count: usize,
    pub receiver_count: usize,
    pub giver_count: usize,
}

impl LedgerStats {
    #[must_use]
    pub fn from_transfers(transfers: &[KarmaTransfer]) -> Self {
        let receivers: BTreeSet<&UserId> = transfers.iter().map(|t| t.receiver()).collect();
        let givers: BTreeSet<&UserId> = transfers.iter().map(|t| t.giver()).collect();
        Self {
            transfer_count: transfers.len(),
            receiver_count: receivers.len(),
            giver_count: givers.len(),
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn user(name: &str) -> UserId {
        UserId::normalize(name).expect("valid user")
    }

    fn transfer(giver: &str, receiver: &str, delta: i64) -> KarmaTransfer {
        KarmaTransfer::between(user(giver), user(receiver), delta, Utc::now()).expect("transfer")
    }

    fn names(scores: &[Score]) -> Vec<(&str, i64)> {
        scores.iter().map(|s| (s.user.as_str(), s.points)).collect()
    }

    /// a→x:+1, b→x:+1, c→y:-1
    fn sample() -> Vec<KarmaTransfer> {
        vec![transfer("a", "x", 1), transfer("b", "x", 1), transfer("c", "y", -1)]
    }

    #[test]
    fn leaderboard_top_is_ascending_with_highest_last() {
        let board = leaderboard(&sample(), Direction::Top, 5);
        assert_eq!(names(&board), vec![("y", -1), ("x", 2)]);
    }

    #[test]
    fn leaderboard_bottom_takes_lowest() {
        let board = leaderboard(&sample(), Direction::Bottom, 1);
        assert_eq!(names(&board), vec![("y", -1)]);
    }

    #[test]
    fn leaderboard_top_limit_takes_highest() {
        let board = leaderboard(&sample(), Direction::Top, 1);
        assert_eq!(names(&board), vec![("x", 2)]);
    }

    #[test]
    fn leaderboard_limit_is_clamped() {
        let transfers = vec![
            transfer("a", "p", 1),
            transfer("a", "q", 2),
            transfer("a", "r", 3),
        ];
        assert_eq!(leaderboard(&transfers, Direction::Top, 5).len(), 3);
        assert_eq!(leaderboard(&transfers, Direction::Bottom, 5).len(), 3);
    }

    #[test]
    fn leaderboard_empty_ledger() {
        assert!(leaderboard(&[], Direction::Top, 5).is_empty());
        assert!(leaderboard(&[], Direction::Bottom, 5).is_empty());
    }

    #[test]
    fn leaderboard_zero_limit() {
        assert!(leaderboard(&sample(), Direction::Top, 0).is_empty());
    }

    #[test]
    fn leaderboard_ties_order_by_name() {
        let transfers = vec![
            transfer("a", "zed", 1),
            transfer("a", "amy", 1),
            transfer("a", "max", 1),
        ];
        let board = leaderboard(&transfers, Direction::Top, 5);
        assert_eq!(names(&board), vec![("amy", 1), ("max", 1), ("zed", 1)]);
    }

    #[test]
    fn leaderboard_is_idempotent() {
        let transfers = sample();
        assert_eq!(
            leaderboard(&transfers, Direction::Top, 5),
            leaderboard(&transfers, Direction::Top, 5)
        );
    }

    #[test]
    fn totals_and_single_total() {
        let transfers = sample();
        assert_eq!(total_for(&transfers, &user("x")), 2);
        assert_eq!(total_for(&transfers, &user("nobody")), 0);
        assert_eq!(totals(&transfers).len(), 2);
    }

    #[test]
    fn giver_and_taker_from_sample() {
        let transfers = sample();
        let giver = top_giver(&transfers).expect("giver");
        assert_eq!((giver.user.as_str(), giver.points), ("a", 1));

        let taker = top_taker(&transfers).expect("taker");
        assert_eq!((taker.user.as_str(), taker.points), ("c", -1));
    }

    #[test]
    fn giver_only_counts_positive_transfers() {
        let transfers = vec![
            transfer("a", "x", 3),
            transfer("a", "y", -5),
            transfer("b", "x", 2),
        ];
        let giver = top_giver(&transfers).expect("giver");
        assert_eq!((giver.user.as_str(), giver.points), ("a", 3));

        let taker = top_taker(&transfers).expect("taker");
        assert_eq!((taker.user.as_str(), taker.points), ("a", -5));
    }

    #[test]
    fn giver_ties_resolve_to_smallest_name() {
        let transfers = vec![transfer("bob", "x", 1), transfer("amy", "x", 1)];
        assert_eq!(top_giver(&transfers).expect("giver").user.as_str(), "amy");

        let transfers = vec![transfer("bob", "x", -1), transfer("amy", "x", -1)];
        assert_eq!(top_taker(&transfers).expect("taker").user.as_str(), "amy");
    }

    #[test]
    fn none_when_nothing_qualifies() {
        let only_positive = vec![transfer("a", "x", 1)];
        assert!(top_taker(&only_positive).is_none());

        let only_negative = vec![transfer("a", "x", -1)];
        assert!(top_giver(&only_negative).is_none());

        let only_zero = vec![transfer("a", "x", 0)];
        assert!(top_giver(&only_zero).is_none());
        assert!(top_taker(&only_zero).is_none());
    }

    #[test]
    fn stats_count_distinct_users() {
        let stats = LedgerStats::from_transfers(&sample());
        assert_eq!(stats.transfer_count, 3);
        assert_eq!(stats.receiver_count, 2);
        assert_eq!(stats.giver_count, 3);
    }
}
