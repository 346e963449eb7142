//! # WebSocket Handler
//!
//! Upgrade endpoint for the chat relay.
//!
//! ## Endpoints
//!
//! - `GET /ws` - WebSocket connection carrying chat envelopes
//!
//! A request without `Upgrade: websocket` (compared case-insensitively), or one
//! the handshake cannot complete, gets `426 Expected websocket` and no session is
//! created.

use std::sync::Arc;

use axum::extract::ws::rejection::WebSocketUpgradeRejection;
use axum::extract::{State, WebSocketUpgrade};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use lib_core::AppError;
use tracing::{info, warn};

use crate::chat::{run_session, ChatAppState};

/// WebSocket handler for the chat relay.
///
/// **Route**: `GET /ws`
///
/// # Example
///
/// ```javascript
/// const ws = new WebSocket('ws://localhost:8787/ws');
/// ws.onopen = () => ws.send(JSON.stringify({
///   type: 'join', user: { username: 'alice' }, room: 'general'
/// }));
/// ws.onmessage = (event) => console.log(JSON.parse(event.data));
/// ```
pub async fn chat_websocket(
    State(state): State<Arc<ChatAppState>>,
    headers: HeaderMap,
    ws: Result<WebSocketUpgrade, WebSocketUpgradeRejection>,
) -> Result<Response, AppError> {
    let client_ip = client_ip(&headers);

    if !requests_websocket(&headers) {
        warn!(
            client_ip = ?client_ip,
            upgrade = ?headers.get(header::UPGRADE),
            "[WS] UPGRADE_MISSING ip={:?} - expected websocket",
            client_ip
        );
        return Err(AppError::UpgradeRequired);
    }

    let ws = ws.map_err(|rejection| {
        warn!(
            client_ip = ?client_ip,
            rejection = %rejection,
            "[WS] UPGRADE_REJECTED ip={:?} reason={}",
            client_ip,
            rejection
        );
        AppError::UpgradeRequired
    })?;

    info!(
        client_ip = ?client_ip,
        "[WS] UPGRADE_START ip={:?}",
        client_ip
    );

    Ok(ws
        .on_failed_upgrade(|e| warn!(error = %e, "[WS] UPGRADE_FAILED error={}", e))
        .on_upgrade(move |socket| run_session(socket, state, client_ip)))
}

/// `true` if the `Upgrade` header names the websocket protocol.
fn requests_websocket(headers: &HeaderMap) -> bool {
    headers
        .get(header::UPGRADE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.trim().eq_ignore_ascii_case("websocket"))
}

/// Client address as reported by a fronting proxy, if any.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .or_else(|| headers.get("x-real-ip"))
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.split(',').next())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}
