//! # Chat State Management
//!
//! Process-wide relay state. One instance is created at startup and handed to the
//! router as `Arc<ChatAppState>`; the session handler and the API handlers reach the
//! room directory through it, never through a global.

use std::sync::atomic::{AtomicU64, Ordering};

use lib_core::Config;

use super::directory::RoomDirectory;

/// Application state for the chat relay
pub struct ChatAppState {
    pub config: Config,
    pub directory: RoomDirectory,
    total_messages: AtomicU64,
}

impl ChatAppState {
    pub fn new(config: Config) -> Self {
        let directory = RoomDirectory::new(config.history_capacity);
        Self {
            config,
            directory,
            total_messages: AtomicU64::new(0),
        }
    }

    /// Chat messages relayed since startup.
    pub fn total_messages(&self) -> u64 {
        self.total_messages.load(Ordering::Relaxed)
    }

    /// Count one relayed chat message.
    pub(crate) fn record_message(&self) -> u64 {
        self.total_messages.fetch_add(1, Ordering::Relaxed) + 1
    }
}

impl Default for ChatAppState {
    fn default() -> Self {
        Self::new(Config::default())
    }
}
