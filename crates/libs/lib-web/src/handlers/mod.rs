//! # HTTP Request Handlers
//!
//! Axum handlers for the relay's HTTP surface.
//!
//! ## Handler Modules
//!
//! - **[`websocket`]**: socket upgrade
//!   - `GET /ws` - switch to the chat protocol (101), or 426 without `Upgrade: websocket`
//!
//! - **[`api`]**: read-only JSON endpoints
//!   - `GET /api/health` - liveness with online user count
//!   - `GET /api/stats` - rooms, online users, message total
//!   - `GET /api/messages?room=<name>` - recent messages of a room
//!
//! - **[`health`]**: service endpoints
//!   - `GET /health` - liveness probe
//!   - fallback - plain-text banner
//!
//! ## Error Handling
//!
//! Handlers return `Json<T>` or `Result<T, AppError>`; [`lib_core::AppError`]
//! renders 426/404 as plain text and 5xx as `{error, message}`. CORS headers are
//! added by [`crate::middleware::mw_cors`], never by a handler.

pub mod api;
pub mod health;
pub mod websocket;
