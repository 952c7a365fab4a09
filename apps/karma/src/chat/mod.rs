//! # Chat Collaborator
//!
//! Glues a chat transport to the karma ledger.
//!
//! [`Bot::handle`] takes one inbound line and returns the replies to send:
//!
//! 1. Commands (`!karma --top`, or `karma --top` addressed to the bot) are
//!    answered from the ledger and nothing is recorded.
//! 2. Public, undirected lines run the extraction pipeline. A self-targeted
//!    token earns the author a notice; every other change is recorded.
//!
//! A storage failure while recording is logged and swallowed. The ledger
//! rejects the whole change, so it is lost rather than half kept; the bot
//! keeps running.

pub mod command;
pub mod reply;

pub use command::KarmaQuery;

use crate::config::{ChatConfig, KarmaConfig};
use crate::storage;
use karma_core::primitives::MAX_MESSAGE_LENGTH;
use karma_core::{IncomingMessage, KarmaError, Ledger, scan_message};
use serde::{Deserialize, Serialize};

// =============================================================================
// INBOUND MESSAGE
// =============================================================================

/// One line as delivered by a chat transport.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InboundMessage {
    /// Author of the line.
    pub user: String,
    /// Raw text.
    pub text: String,
    /// Addressed to the bot (`karmabot: ...`).
    #[serde(default)]
    pub directed: bool,
    /// Sent as a private message.
    #[serde(default)]
    pub private: bool,
}

impl InboundMessage {
    /// A public, undirected line.
    pub fn public(user: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            user: user.into(),
            text: text.into(),
            directed: false,
            private: false,
        }
    }

    fn as_incoming(&self) -> IncomingMessage<'_> {
        IncomingMessage {
            text: &self.text,
            giver: &self.user,
            directed: self.directed,
            private: self.private,
        }
    }
}

// =============================================================================
// BOT
// =============================================================================

/// The karma bot: a ledger plus the settings needed to talk about it.
#[derive(Debug)]
pub struct Bot {
    ledger: Ledger,
    chat: ChatConfig,
}

impl Bot {
    /// Wrap an already opened ledger.
    #[must_use]
    pub fn new(ledger: Ledger, config: &KarmaConfig) -> Self {
        Self {
            ledger,
            chat: config.chat.clone(),
        }
    }

    /// Open the configured ledger and wrap it.
    pub fn open(config: &KarmaConfig) -> Result<Self, KarmaError> {
        Ok(Self::new(storage::open_ledger(&config.storage)?, config))
    }

    #[must_use]
    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    #[must_use]
    pub fn chat_config(&self) -> &ChatConfig {
        &self.chat
    }

    /// Handle one inbound line and return the replies, in order.
    pub fn handle(&mut self, message: &InboundMessage) -> Vec<String> {
        if message.text.len() > MAX_MESSAGE_LENGTH {
            tracing::debug!(
                user = %message.user,
                len = message.text.len(),
                "Ignoring oversized message"
            );
            return Vec::new();
        }

        let addressed = message.directed || message.private;
        if let Some(query) = command::parse(&message.text, addressed, &self.chat) {
            return match self.answer(&query) {
                Ok(replies) => replies,
                Err(e) => {
                    tracing::warn!(error = %e, query = ?query, "Karma query failed");
                    Vec::new()
                }
            };
        }

        let Some(change) = scan_message(&message.as_incoming()) else {
            return Vec::new();
        };

        let mut replies = Vec::new();
        if change.self_karma {
            replies.push(reply::SELF_KARMA_NOTICE.to_string());
        }

        match self.ledger.record_change(&change) {
            Ok(outcome) => {
                tracing::debug!(
                    giver = %change.giver,
                    recorded = outcome.recorded,
                    self_karma = outcome.self_karma_dropped,
                    "Karma recorded"
                );
            }
            Err(e) => {
                tracing::warn!(
                    error = %e,
                    giver = %change.giver,
                    targets = change.deltas.len(),
                    "Karma change lost: ledger write failed"
                );
            }
        }

        replies
    }

    /// Answer a parsed command from the current ledger.
    pub fn answer(&self, query: &KarmaQuery) -> Result<Vec<String>, KarmaError> {
        let replies = match query {
            KarmaQuery::Leaderboard(direction) => {
                let board = self
                    .ledger
                    .leaderboard(*direction, self.chat.leaderboard_limit)?;
                reply::leaderboard(&board)
            }
            KarmaQuery::TopGiver => vec![reply::top_giver(self.ledger.top_giver()?.as_ref())],
            KarmaQuery::TopTaker => vec![reply::top_taker(self.ledger.top_taker()?.as_ref())],
            KarmaQuery::User(user) => {
                let total = if self.ledger.has_received(user)? {
                    Some(self.ledger.total_for(user)?)
                } else {
                    None
                };
                vec![reply::user_total(user, total)]
            }
        };
        Ok(replies)
    }
}

// =============================================================================
// TESTS
// =============================================================================
