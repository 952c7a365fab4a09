//! # Command Routing
//!
//! Recognises the read-only karma commands:
//!
//! - `karma --top` / `karma --bottom` - leaderboard
//! - `karma --giver` / `karma --taker` - most prolific giver / taker
//! - `karma <user>` - one user's total
//!
//! A public line must carry the configured prefix (`!karma --top`). A line
//! addressed to the bot, or sent privately, may leave it out.

use crate::config::ChatConfig;
use karma_core::{Direction, UserId};

/// A parsed karma command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KarmaQuery {
    /// Top or bottom receivers.
    Leaderboard(Direction),
    /// Who has given the most positive karma.
    TopGiver,
    /// Who has given the most negative karma.
    TopTaker,
    /// Total for one user.
    User(UserId),
}

/// Parse a chat line into a command.
///
/// `addressed` is true when the line was directed at the bot or arrived
/// privately; the prefix is then optional. Returns `None` for anything that
/// is not a well-formed command, including unknown `--flags`.
#[must_use]
pub fn parse(text: &str, addressed: bool, chat: &ChatConfig) -> Option<KarmaQuery> {
    let text = text.trim();
    let body = match text.strip_prefix(chat.command_prefix.as_str()) {
        Some(rest) if !chat.command_prefix.is_empty() => rest,
        _ if addressed => text,
        _ => return None,
    };
    parse_body(body, &chat.command_word)
}

/// Parse a prefix-free command body such as `karma --top`.
fn parse_body(body: &str, command_word: &str) -> Option<KarmaQuery> {
    let rest = body.strip_prefix(command_word)?;

    // The command word must stand on its own: `karmafoo` is not a command.
    if !rest.starts_with(char::is_whitespace) {
        return None;
    }
    let argument = rest.trim();

    match argument {
        "--top" => Some(KarmaQuery::Leaderboard(Direction::Top)),
        "--bottom" => Some(KarmaQuery::Leaderboard(Direction::Bottom)),
        "--giver" => Some(KarmaQuery::TopGiver),
        "--taker" => Some(KarmaQuery::TopTaker),
        _ if argument.starts_with('-') => None,
        _ => UserId::normalize(argument).map(KarmaQuery::User),
    }
}

// =============================================================================
// TESTS
// =============================================================================
