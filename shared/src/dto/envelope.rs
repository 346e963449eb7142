//! # Socket Envelopes
//!
//! JSON frames exchanged on the `/ws` socket. Every frame carries a `type`
//! discriminator.
//!
//! Inbound (client → relay): `join`, `message`, `typing`.
//! Outbound (relay → client): `connected`, `system`, `message`, `typing`.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Identity a client attaches to its frames.
///
/// Only `username` is interpreted by the relay. Any other field (avatar, colour, ...)
/// is kept and relayed untouched.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatUser {
    pub username: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ChatUser {
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            extra: Map::new(),
        }
    }
}

/// Frames a client may send.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ClientEnvelope {
    /// Enter a room.
    Join { user: ChatUser, room: String },

    /// Post a chat line. `id` is chosen by the client and echoed back verbatim.
    Message {
        #[serde(default, skip_serializing_if = "Value::is_null")]
        id: Value,
        user: ChatUser,
        text: String,
        room: String,
    },

    /// Typing indicator.
    Typing { user: ChatUser, room: String },

    /// Any `type` the relay does not know about.
    #[serde(other)]
    Unknown,
}

impl ClientEnvelope {
    /// Wire name of the envelope type, for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            ClientEnvelope::Join { .. } => "join",
            ClientEnvelope::Message { .. } => "message",
            ClientEnvelope::Typing { .. } => "typing",
            ClientEnvelope::Unknown => "unknown",
        }
    }

    /// Room the envelope targets, if any.
    pub fn room(&self) -> Option<&str> {
        match self {
            ClientEnvelope::Join { room, .. }
            | ClientEnvelope::Message { room, .. }
            | ClientEnvelope::Typing { room, .. } => Some(room),
            ClientEnvelope::Unknown => None,
        }
    }

    /// Sender identity, if any.
    pub fn user(&self) -> Option<&ChatUser> {
        match self {
            ClientEnvelope::Join { user, .. }
            | ClientEnvelope::Message { user, .. }
            | ClientEnvelope::Typing { user, .. } => Some(user),
            ClientEnvelope::Unknown => None,
        }
    }
}

/// A chat line as relayed to room members, stamped with the relay's clock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub id: Value,
    pub user: ChatUser,
    pub text: String,
    pub room: String,
    pub timestamp: String,
}

/// Frames the relay sends.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ServerEnvelope {
    /// First frame on every socket; tells the client its session id.
    Connected {
        #[serde(rename = "clientId")]
        client_id: String,
        timestamp: String,
    },

    /// Relay-generated notice scoped to a room (e.g. "alice joined the room").
    System {
        message: String,
        room: String,
        timestamp: String,
    },

    /// Relayed chat line.
    Message(ChatMessage),

    /// Relayed typing indicator.
    Typing { username: String, room: String },
}
