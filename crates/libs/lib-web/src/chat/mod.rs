//! # Chat Module
//!
//! The real-time relay: sessions connect over `/ws`, join named rooms, and every
//! `join`, `message` and `typing` envelope is fanned out to the room's members.
//!
//! - [`codec`]: decode/validate inbound frames, encode outbound envelopes
//! - [`directory`]: room membership and fan-out (the only shared mutable state)
//! - [`session`]: per-connection lifecycle and envelope dispatch
//! - [`history`]: bounded per-room buffer of recent chat lines
//! - [`stats`]: derived view for the stats endpoints
//! - [`state`]: process-wide state handed to the router

pub mod codec;
pub mod directory;
pub mod history;
pub mod session;
pub mod state;
pub mod stats;

pub use directory::{BroadcastReport, RoomDirectory};
pub use session::{run_session, SessionId};
pub use state::ChatAppState;
pub use stats::RelayStats;
