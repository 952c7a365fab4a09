//! # Message Intake
//!
//! Gating and bundling for one inbound chat line.
//!
//! Whether a message was addressed to the bot, or sent privately, is decided
//! by the transport. This module only honours that decision: karma is read
//! from public, undirected chatter and nowhere else.

use crate::resolver;
use crate::{Deltas, UserId};

/// An inbound chat line as handed over by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage<'a> {
    /// Raw text of the line.
    pub text: &'a str,
    /// Author of the line, before normalization.
    pub giver: &'a str,
    /// The line was addressed to the bot (`bot: ...`).
    pub directed: bool,
    /// The line arrived as a private message.
    pub private: bool,
}

impl<'a> IncomingMessage<'a> {
    /// A public, undirected line.
    #[must_use]
    pub fn public(giver: &'a str, text: &'a str) -> Self {
        Self {
            text,
            giver,
            directed: false,
            private: false,
        }
    }

    /// Whether the line is eligible for karma extraction at all.
    #[must_use]
    pub fn accepts_karma(&self) -> bool {
        !self.directed && !self.private
    }
}

/// The karma a single message asks for, ready to be recorded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KarmaChange {
    /// Normalized author.
    pub giver: UserId,
    /// Merged per-target deltas, self target included.
    pub deltas: Deltas,
    /// The author targeted themselves; the caller should tell them off.
    pub self_karma: bool,
}

impl KarmaChange {
    /// Number of transfers this change will produce once self karma is dropped.
    #[must_use]
    pub fn transfer_count(&self) -> usize {
        self.deltas
            .keys()
            .filter(|target| **target != self.giver)
            .count()
    }
}

/// Run extraction and resolution for one message.
///
/// Returns `None` when the message is directed or private, when its author
/// does not normalize to a usable identifier, or when it carries no tokens.
#[must_use]
pub fn scan_message(message: &IncomingMessage<'_>) -> Option<KarmaChange> {
    if !message.accepts_karma() {
        return None;
    }
    let giver = UserId::normalize(message.giver)?;
    let deltas = resolver::resolve_line(message.text);
    if deltas.is_empty() {
        return None;
    }
    let self_karma = deltas.contains_key(&giver);
    Some(KarmaChange {
        giver,
        deltas,
        self_karma,
    })
}

// =============================================================================
// TESTS
// =============================================================================
