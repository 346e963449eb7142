//! # REST Response Bodies
//!
//! Bodies for `/health` and the `/api/*` endpoints. All are camelCase on the wire.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::envelope::ChatMessage;

/// Value of the `cors` field advertised by the health and stats endpoints.
pub const CORS_ENABLED: &str = "enabled";

/// `GET /health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ServiceHealth {
    pub status: String,
    pub timestamp: String,
    pub service: String,
    pub cors: String,
}

/// `GET /api/health`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ApiHealth {
    pub status: String,
    pub timestamp: String,
    pub online_users: usize,
    pub cors: String,
}

/// `GET /api/stats`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StatsResponse {
    pub online_users: usize,
    /// Live rooms only; a room disappears once its last member leaves.
    pub rooms: BTreeMap<String, usize>,
    pub total_messages: u64,
    pub timestamp: String,
    pub cors: String,
}

/// `GET /api/messages?room=<name>`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessagesResponse {
    pub room: String,
    /// Most recent chat lines of the room, oldest first.
    pub messages: Vec<ChatMessage>,
    pub timestamp: String,
}

/// Error body for 5xx responses.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
}
