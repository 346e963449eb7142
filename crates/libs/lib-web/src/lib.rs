//! # Web Library
//!
//! HTTP handlers, middleware, routes, and the WebSocket chat relay.

pub mod chat;
pub mod handlers;
pub mod middleware;
pub mod server;

pub use server::{create_router, init_tracing, start_server};
