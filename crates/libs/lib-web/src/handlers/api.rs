//! # API Handlers
//!
//! Read-only JSON endpoints under `/api/`. Each request only reads the room
//! directory and the message counter; nothing is shared between requests.
//!
//! ## Endpoints
//!
//! - `GET /api/health` - liveness plus the number of online users
//! - `GET /api/stats` - online users, per-room member counts, relayed message total
//! - `GET /api/messages?room=<name>` - recent chat lines of a room (default `general`)
//!
//! Anything else under `/api/` is `404 Not Found`.

use std::sync::Arc;

use axum::extract::{Query, State};
use axum::routing::get;
use axum::{Json, Router};
use lib_core::AppError;
use lib_utils::time::now_iso;
use shared::dto::api::{ApiHealth, MessagesResponse, StatsResponse, CORS_ENABLED};

use crate::chat::{ChatAppState, RelayStats};

/// Room used by `/api/messages` when none is given.
pub const DEFAULT_ROOM: &str = "general";

/// Routes mounted under `/api`.
pub fn routes() -> Router<Arc<ChatAppState>> {
    Router::new()
        .route("/health", get(api_health))
        .route("/stats", get(api_stats))
        .route("/messages", get(api_messages))
        .fallback(api_not_found)
        .method_not_allowed_fallback(api_not_found)
}

/// **Route**: `GET /api/health`
pub async fn api_health(State(state): State<Arc<ChatAppState>>) -> Json<ApiHealth> {
    let stats = RelayStats::collect(&state).await;
    Json(ApiHealth {
        status: "ok".to_string(),
        timestamp: now_iso(),
        online_users: stats.online_users,
        cors: CORS_ENABLED.to_string(),
    })
}

/// **Route**: `GET /api/stats`
///
/// ```json
/// {"onlineUsers":3,"rooms":{"general":2,"tech":1},"totalMessages":0,"timestamp":"...","cors":"enabled"}
/// ```
pub async fn api_stats(State(state): State<Arc<ChatAppState>>) -> Json<StatsResponse> {
    let stats = RelayStats::collect(&state).await;
    Json(stats.into_response(now_iso()))
}

/// **Route**: `GET /api/messages?room=<name>`
///
/// Only the first `room` pair counts; a missing or empty value means `general`.
pub async fn api_messages(
    State(state): State<Arc<ChatAppState>>,
    Query(params): Query<Vec<(String, String)>>,
) -> Json<MessagesResponse> {
    let room = requested_room(params);
    let messages = state.directory.history(&room).await;

    Json(MessagesResponse {
        room,
        messages,
        timestamp: now_iso(),
    })
}

fn requested_room(params: Vec<(String, String)>) -> String {
    params
        .into_iter()
        .find(|(key, _)| key == "room")
        .map(|(_, value)| value)
        .filter(|room| !room.is_empty())
        .unwrap_or_else(|| DEFAULT_ROOM.to_string())
}

/// Fallback for unknown `/api/` paths and methods.
pub async fn api_not_found() -> AppError {
    AppError::NotFound
}
