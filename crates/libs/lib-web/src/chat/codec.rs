//! # Envelope Codec
//!
//! Turns socket text frames into [`ClientEnvelope`]s and [`ServerEnvelope`]s into
//! frames. Decoding validates the fields the relay acts on; a frame that fails
//! here is dropped by the session that received it.

use axum::extract::ws::Utf8Bytes;
use lib_utils::validation::{validate_max_length, validate_not_empty};
use shared::dto::envelope::{ClientEnvelope, ServerEnvelope};
use thiserror::Error;

/// Longest room name the relay accepts.
pub const MAX_ROOM_NAME_LEN: usize = 128;

/// Longest username the relay accepts.
pub const MAX_USERNAME_LEN: usize = 64;

#[derive(Debug, Error)]
pub enum CodecError {
    /// Not JSON, or JSON that does not match any envelope shape.
    #[error("malformed frame: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Well-formed envelope with unusable field values.
    #[error("invalid envelope: {0}")]
    Invalid(String),
}

/// Decode and validate one inbound text frame.
///
/// Unknown `type` values decode to [`ClientEnvelope::Unknown`] and are not errors.
pub fn decode(text: &str) -> Result<ClientEnvelope, CodecError> {
    let envelope: ClientEnvelope = serde_json::from_str(text)?;
    validate(&envelope)?;
    Ok(envelope)
}

/// Serialize an outbound envelope into a text frame payload.
pub fn encode(envelope: &ServerEnvelope) -> Result<Utf8Bytes, CodecError> {
    Ok(Utf8Bytes::from(serde_json::to_string(envelope)?))
}

fn validate(envelope: &ClientEnvelope) -> Result<(), CodecError> {
    if let Some(room) = envelope.room() {
        validate_not_empty(room, "room").map_err(CodecError::Invalid)?;
        validate_max_length(room, MAX_ROOM_NAME_LEN, "room").map_err(CodecError::Invalid)?;
    }

    if let Some(user) = envelope.user() {
        validate_not_empty(&user.username, "username").map_err(CodecError::Invalid)?;
        validate_max_length(&user.username, MAX_USERNAME_LEN, "username")
            .map_err(CodecError::Invalid)?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared::dto::envelope::ChatUser;

    #[test]
    fn test_decode_valid_typing() {
        let envelope = decode(r#"{"type":"typing","user":{"username":"alice"},"room":"general"}"#)
            .expect("typing frame should decode");

        assert_eq!(
            envelope,
            ClientEnvelope::Typing {
                user: ChatUser::new("alice"),
                room: "general".to_string(),
            }
        );
    }

    #[test]
    fn test_decode_not_json() {
        let err = decode("{not json").unwrap_err();
        assert!(matches!(err, CodecError::Malformed(_)));
    }

    #[test]
    fn test_decode_rejects_blank_room() {
        let err = decode(r#"{"type":"join","user":{"username":"alice"},"room":"  "}"#).unwrap_err();
        assert!(matches!(err, CodecError::Invalid(_)));
    }

    #[test]
    fn test_decode_rejects_blank_username() {
        let err = decode(r#"{"type":"join","user":{"username":""},"room":"general"}"#).unwrap_err();
        assert!(matches!(err, CodecError::Invalid(_)));
    }

    #[test]
    fn test_decode_rejects_long_room() {
        let frame = format!(
            r#"{{"type":"join","user":{{"username":"alice"}},"room":"{}"}}"#,
            "r".repeat(MAX_ROOM_NAME_LEN + 1)
        );
        assert!(matches!(decode(&frame), Err(CodecError::Invalid(_))));
    }

    #[test]
    fn test_decode_length_limits_are_inclusive() {
        let at_limit = format!(
            r#"{{"type":"typing","user":{{"username":"{}"}},"room":"{}"}}"#,
            "u".repeat(MAX_USERNAME_LEN),
            "r".repeat(MAX_ROOM_NAME_LEN)
        );
        assert!(decode(&at_limit).is_ok());

        let long_username = format!(
            r#"{{"type":"typing","user":{{"username":"{}"}},"room":"general"}}"#,
            "u".repeat(MAX_USERNAME_LEN + 1)
        );
        assert!(matches!(decode(&long_username), Err(CodecError::Invalid(_))));
    }

    #[test]
    fn test_decode_unknown_type_is_not_an_error() {
        let envelope = decode(r#"{"type":"leave","room":"general"}"#).unwrap();
        assert_eq!(envelope, ClientEnvelope::Unknown);
    }

    #[test]
    fn test_encode_system() {
        let envelope = ServerEnvelope::System {
            message: "alice joined the room".to_string(),
            room: "general".to_string(),
            timestamp: "2024-01-01T00:00:00.000Z".to_string(),
        };

        let frame = encode(&envelope).unwrap();

        assert_eq!(
            frame.as_str(),
            r#"{"type":"system","message":"alice joined the room","room":"general","timestamp":"2024-01-01T00:00:00.000Z"}"#
        );
    }
}
