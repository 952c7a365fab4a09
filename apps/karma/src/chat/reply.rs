//! # Reply Formatting
//!
//! The text the bot sends back. One string per chat line.

use karma_core::{Score, UserId};

/// Sent to a user who tried to change their own karma.
pub const SELF_KARMA_NOTICE: &str = "Nice try, no modifying your own karma";

/// `alice has 3 points`, or `No karma for alice` when nobody ever gave
/// them any.
#[must_use]
pub fn user_total(user: &UserId, total: Option<i64>) -> String {
    match total {
        Some(points) => format!("{} has {} points", user, points),
        None => format!("No karma for {}", user),
    }
}

/// One `user: points` line per entry.
#[must_use]
pub fn leaderboard(entries: &[Score]) -> Vec<String> {
    if entries.is_empty() {
        return vec!["No one has any karma yet :-(".to_string()];
    }
    entries
        .iter()
        .map(|score| format!("{}: {}", score.user, score.points))
        .collect()
}

#[must_use]
pub fn top_giver(giver: Option<&Score>) -> String {
    match giver {
        Some(score) => format!("{} has given the most karma ({})", score.user, score.points),
        None => "No positive karma has been given yet :-(".to_string(),
    }
}

#[must_use]
pub fn top_taker(taker: Option<&Score>) -> String {
    match taker {
        Some(score) => format!(
            "{} has given the most negative karma ({})",
            score.user, score.points
        ),
        None => "No negative karma has been given yet".to_string(),
    }
}
