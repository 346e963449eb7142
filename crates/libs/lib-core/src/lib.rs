//! # Core Library
//!
//! Configuration and the application-wide error type for the chat relay.

pub mod config;
pub mod error;

// Re-export commonly used types
pub use config::Config;
pub use error::{AppError, Result};
