//! # API Request/Response Types
//!
//! This module defines the JSON structures for the HTTP API.

use crate::chat::InboundMessage;
use karma_core::{
    Direction, KarmaError, KarmaTransfer, LedgerStats, Score,
    primitives::{
        DEFAULT_LEADERBOARD_LIMIT, MAX_IDENTIFIER_LENGTH, MAX_LEADERBOARD_LIMIT, MAX_MESSAGE_LENGTH,
    },
};
use serde::{Deserialize, Serialize};

/// Default page size for `GET /transfers`.
pub const DEFAULT_TRANSFER_LIMIT: usize = 50;

/// Largest page `GET /transfers` will return.
pub const MAX_TRANSFER_LIMIT: usize = 1000;

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// STATUS RESPONSE
// =============================================================================

/// Ledger status response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    pub persistent: bool,
    pub transfer_count: usize,
    pub receiver_count: usize,
    pub giver_count: usize,
}

impl StatusResponse {
    pub fn new(persistent: bool, stats: LedgerStats) -> Self {
        Self {
            persistent,
            transfer_count: stats.transfer_count,
            receiver_count: stats.receiver_count,
            giver_count: stats.giver_count,
        }
    }
}

// =============================================================================
// MESSAGE REQUEST/RESPONSE
// =============================================================================

/// A chat line to feed through the bot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageRequest {
    pub user: String,
    pub text: String,
    #[serde(default)]
    pub directed: bool,
    #[serde(default)]
    pub private: bool,
}

impl MessageRequest {
    /// Convert to an inbound message, validating fields.
    ///
    /// Oversized payloads are rejected here, before they reach the scanner.
    pub fn to_message(&self) -> Result<InboundMessage, KarmaError> {
        if self.user.trim().is_empty() {
            return Err(KarmaError::InvalidIdentifier(
                "user must not be empty".to_string(),
            ));
        }
        if self.user.len() > MAX_IDENTIFIER_LENGTH {
            return Err(KarmaError::InvalidIdentifier(format!(
                "User length {} exceeds maximum {} bytes",
                self.user.len(),
                MAX_IDENTIFIER_LENGTH
            )));
        }
        if self.text.len() > MAX_MESSAGE_LENGTH {
            return Err(KarmaError::InvalidQuery(format!(
                "Text length {} exceeds maximum {} bytes",
                self.text.len(),
                MAX_MESSAGE_LENGTH
            )));
        }

        Ok(InboundMessage {
            user: self.user.clone(),
            text: self.text.clone(),
            directed: self.directed,
            private: self.private,
        })
    }
}

/// Replies the bot produced for one message.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub success: bool,
    pub replies: Vec<String>,
    pub error: Option<String>,
}

impl MessageResponse {
    pub fn success(replies: Vec<String>) -> Self {
        Self {
            success: true,
            replies,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            replies: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// QUERY PARAMETERS
// =============================================================================

/// `?limit=` on list endpoints.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct LimitParams {
    pub limit: Option<usize>,
}

impl LimitParams {
    /// Leaderboard size: defaults to 5, at most `MAX_LEADERBOARD_LIMIT`.
    pub fn leaderboard_limit(&self) -> Result<usize, KarmaError> {
        checked_limit(self.limit, DEFAULT_LEADERBOARD_LIMIT, MAX_LEADERBOARD_LIMIT)
    }

    /// Transfer page size: defaults to 50, at most `MAX_TRANSFER_LIMIT`.
    pub fn transfer_limit(&self) -> Result<usize, KarmaError> {
        checked_limit(self.limit, DEFAULT_TRANSFER_LIMIT, MAX_TRANSFER_LIMIT)
    }
}

fn checked_limit(
    requested: Option<usize>,
    default: usize,
    max: usize,
) -> Result<usize, KarmaError> {
    let limit = requested.unwrap_or(default);
    if limit > max {
        return Err(KarmaError::InvalidQuery(format!(
            "limit {} exceeds maximum {}",
            limit, max
        )));
    }
    Ok(limit)
}

// =============================================================================
// KARMA RESPONSES
// =============================================================================

/// Leaderboard response. Entries are ascending by points for both directions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LeaderboardResponse {
    pub success: bool,
    pub direction: Direction,
    pub entries: Vec<Score>,
    pub error: Option<String>,
}

impl LeaderboardResponse {
    pub fn success(direction: Direction, entries: Vec<Score>) -> Self {
        Self {
            success: true,
            direction,
            entries,
            error: None,
        }
    }

    pub fn error(direction: Direction, msg: impl Into<String>) -> Self {
        Self {
            success: false,
            direction,
            entries: vec![],
            error: Some(msg.into()),
        }
    }
}

/// Top giver / top taker response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoreResponse {
    pub success: bool,
    pub found: bool,
    pub score: Option<Score>,
    pub error: Option<String>,
}

impl ScoreResponse {
    pub fn with_score(score: Option<Score>) -> Self {
        Self {
            success: true,
            found: score.is_some(),
            score,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            found: false,
            score: None,
            error: Some(msg.into()),
        }
    }
}

/// One user's karma.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserKarmaResponse {
    pub success: bool,
    /// Normalized identifier that was looked up.
    pub user: Option<String>,
    /// False when nobody has ever given this user karma.
    pub found: bool,
    pub points: i64,
    pub error: Option<String>,
}

impl UserKarmaResponse {
    pub fn success(user: String, found: bool, points: i64) -> Self {
        Self {
            success: true,
            user: Some(user),
            found,
            points,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            user: None,
            found: false,
            points: 0,
            error: Some(msg.into()),
        }
    }
}

/// Most recent transfers, oldest first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransfersResponse {
    pub success: bool,
    /// Number of transfers in the whole ledger.
    pub total: usize,
    pub transfers: Vec<KarmaTransfer>,
    pub error: Option<String>,
}

impl TransfersResponse {
    pub fn success(total: usize, transfers: Vec<KarmaTransfer>) -> Self {
        Self {
            success: true,
            total,
            transfers,
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            total: 0,
            transfers: vec![],
            error: Some(msg.into()),
        }
    }
}

// =============================================================================
// EXPORT RESPONSE
// =============================================================================

/// Export response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportResponse {
    pub success: bool,
    pub data: Option<String>, // Base64 encoded
    /// BLAKE3 of the snapshot bytes, hex encoded.
    pub checksum: Option<String>,
    pub error: Option<String>,
}

impl ExportResponse {
    pub fn success(data: Vec<u8>, checksum: String) -> Self {
        Self {
            success: true,
            data: Some(base64::Engine::encode(
                &base64::engine::general_purpose::STANDARD,
                &data,
            )),
            checksum: Some(checksum),
            error: None,
        }
    }

    pub fn error(msg: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            checksum: None,
            error: Some(msg.into()),
        }
    }
}
