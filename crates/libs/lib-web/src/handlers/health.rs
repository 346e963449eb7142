//! # Service Handlers
//!
//! Liveness probe and the plain-text banner served for every path the router
//! does not otherwise know.

use std::sync::Arc;

use axum::extract::State;
use axum::Json;
use lib_utils::time::now_iso;
use shared::dto::api::{ServiceHealth, CORS_ENABLED};

use crate::chat::ChatAppState;

/// Body of the fallback response.
pub const BANNER: &str = "ChatHub WebSocket Server";

/// **Route**: `GET /health`
pub async fn service_health(State(state): State<Arc<ChatAppState>>) -> Json<ServiceHealth> {
    Json(ServiceHealth {
        status: "ok".to_string(),
        timestamp: now_iso(),
        service: state.config.service_name.clone(),
        cors: CORS_ENABLED.to_string(),
    })
}

/// Fallback: `200 text/plain` banner.
pub async fn banner() -> &'static str {
    BANNER
}
