//! # Data Transfer Objects (DTOs)
//!
//! ## Module Organization
//!
//! - [`envelope`] - Socket frames exchanged with chat clients
//! - [`api`] - JSON bodies returned by the HTTP endpoints
//!
//! ## Example JSON Communication
//!
//! ```text
//! client -> relay   {"type":"message","id":"m-1","user":{"username":"alice"},"text":"hi","room":"general"}
//! relay  -> room    {"type":"message","id":"m-1","user":{"username":"alice"},"text":"hi","room":"general","timestamp":"2024-01-01T00:00:00.000Z"}
//! ```

pub mod api;
pub mod envelope;

pub use api::*;
pub use envelope::*;
