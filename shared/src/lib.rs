//! # Shared Wire Types
//!
//! This library defines the contract between browser clients and the chat relay.
//! Every frame on the socket and every REST body is a `serde` type declared here,
//! so the relay and any Rust client agree on the JSON shape.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects
//!   - **[`dto::envelope`]**: WebSocket envelopes (`join`, `message`, `typing`, `connected`, `system`)
//!   - **[`dto::api`]**: REST response bodies (`/health`, `/api/*`)
//!
//! ## Wire Format
//!
//! - Envelopes are internally tagged by a `type` field with lowercase values.
//! - Field names are **camelCase** on the wire (`clientId`, `onlineUsers`, `totalMessages`).
//! - Timestamps are ISO-8601 UTC strings produced by the relay; clients never supply them.
//!
//! ## Usage
//!
//! ```rust
//! use shared::dto::envelope::ClientEnvelope;
//!
//! let frame = r#"{"type":"join","user":{"username":"alice"},"room":"general"}"#;
//! let envelope: ClientEnvelope = serde_json::from_str(frame).unwrap();
//! assert_eq!(envelope.room(), Some("general"));
//! ```

pub mod dto;

pub use dto::*;
