//! # API Endpoint Handlers
//!
//! This module implements the actual HTTP endpoint handlers.
//!
//! Reads take the shared lock for reading; only `POST /message` writes.

use super::{
    AppState,
    types::{
        ExportResponse, HealthResponse, LeaderboardResponse, LimitParams, MessageRequest,
        MessageResponse, ScoreResponse, StatusResponse, TransfersResponse, UserKarmaResponse,
    },
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use karma_core::{Direction, KarmaError, UserId, formats::snapshot_hash, ledger_to_bytes};

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// STATUS HANDLER
// =============================================================================

/// Get ledger status.
pub async fn status_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bot = state.bot.read().await;
    let ledger = bot.ledger();

    match ledger.stats() {
        Ok(stats) => Ok((
            StatusCode::OK,
            Json(StatusResponse::new(ledger.is_persistent(), stats)),
        )),
        Err(e) => {
            tracing::warn!(error = %e, "Status read failed");
            Err((StatusCode::SERVICE_UNAVAILABLE, "Storage unavailable"))
        }
    }
}

// =============================================================================
// MESSAGE HANDLER
// =============================================================================

/// Feed one chat line through the bot and return its replies.
pub async fn message_handler(
    State(state): State<AppState>,
    Json(request): Json<MessageRequest>,
) -> impl IntoResponse {
    let message = match request.to_message() {
        Ok(m) => m,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(MessageResponse::error(format!("Invalid message: {}", e))),
            );
        }
    };

    let mut bot = state.bot.write().await;
    let replies = bot.handle(&message);
    (StatusCode::OK, Json(MessageResponse::success(replies)))
}

// =============================================================================
// KARMA HANDLERS
// =============================================================================

/// Highest receivers.
pub async fn top_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    leaderboard(&state, Direction::Top, params).await
}

/// Lowest receivers.
pub async fn bottom_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    leaderboard(&state, Direction::Bottom, params).await
}

async fn leaderboard(
    state: &AppState,
    direction: Direction,
    params: LimitParams,
) -> (StatusCode, Json<LeaderboardResponse>) {
    let limit = match params.leaderboard_limit() {
        Ok(limit) => limit,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(LeaderboardResponse::error(direction, e.to_string())),
            );
        }
    };

    let bot = state.bot.read().await;
    match bot.ledger().leaderboard(direction, limit) {
        Ok(entries) => (
            StatusCode::OK,
            Json(LeaderboardResponse::success(direction, entries)),
        ),
        Err(e) => (
            error_status(&e),
            Json(LeaderboardResponse::error(direction, e.to_string())),
        ),
    }
}

/// Who has given the most positive karma.
pub async fn giver_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bot = state.bot.read().await;
    score_response(bot.ledger().top_giver())
}

/// Who has given the most negative karma.
pub async fn taker_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bot = state.bot.read().await;
    score_response(bot.ledger().top_taker())
}

fn score_response(
    result: Result<Option<karma_core::Score>, KarmaError>,
) -> (StatusCode, Json<ScoreResponse>) {
    match result {
        Ok(score) => (StatusCode::OK, Json(ScoreResponse::with_score(score))),
        Err(e) => (error_status(&e), Json(ScoreResponse::error(e.to_string()))),
    }
}

/// One user's total. The path segment is normalized like any other name.
pub async fn user_handler(
    State(state): State<AppState>,
    Path(user): Path<String>,
) -> impl IntoResponse {
    let user = match UserId::parse(&user) {
        Ok(u) => u,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(UserKarmaResponse::error(e.to_string())),
            );
        }
    };

    let bot = state.bot.read().await;
    let ledger = bot.ledger();
    let lookup = ledger
        .has_received(&user)
        .and_then(|found| Ok((found, ledger.total_for(&user)?)));

    match lookup {
        Ok((found, points)) => (
            StatusCode::OK,
            Json(UserKarmaResponse::success(user.to_string(), found, points)),
        ),
        Err(e) => (
            error_status(&e),
            Json(UserKarmaResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// TRANSFERS HANDLER
// =============================================================================

/// The most recent transfers, oldest first.
pub async fn transfers_handler(
    State(state): State<AppState>,
    Query(params): Query<LimitParams>,
) -> impl IntoResponse {
    let limit = match params.transfer_limit() {
        Ok(limit) => limit,
        Err(e) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(TransfersResponse::error(e.to_string())),
            );
        }
    };

    let bot = state.bot.read().await;
    match bot.ledger().all_transfers() {
        Ok(mut transfers) => {
            let total = transfers.len();
            let recent = transfers.split_off(total.saturating_sub(limit));
            (
                StatusCode::OK,
                Json(TransfersResponse::success(total, recent)),
            )
        }
        Err(e) => (
            error_status(&e),
            Json(TransfersResponse::error(e.to_string())),
        ),
    }
}

// =============================================================================
// EXPORT HANDLER
// =============================================================================

/// Export the full history as a canonical snapshot.
pub async fn export_handler(State(state): State<AppState>) -> impl IntoResponse {
    let bot = state.bot.read().await;

    let data = match bot
        .ledger()
        .all_transfers()
        .and_then(|transfers| ledger_to_bytes(&transfers))
    {
        Ok(data) => data,
        Err(e) => {
            return (
                error_status(&e),
                Json(ExportResponse::error(format!("Export failed: {}", e))),
            );
        }
    };

    let checksum = snapshot_hash(&data);
    (
        StatusCode::OK,
        Json(ExportResponse::success(data, checksum)),
    )
}

/// Storage failures are the server's problem; anything else is the caller's.
fn error_status(error: &KarmaError) -> StatusCode {
    match error {
        KarmaError::InvalidIdentifier(_) | KarmaError::InvalidQuery(_) => StatusCode::BAD_REQUEST,
        KarmaError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}
