//! # Relay Statistics
//!
//! Read-only view derived from the room directory and the message counter.

use std::collections::BTreeMap;

use shared::dto::api::{StatsResponse, CORS_ENABLED};

use super::state::ChatAppState;

/// Point-in-time relay statistics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelayStats {
    /// Distinct sessions present in at least one room.
    pub online_users: usize,
    /// Live room name → member count.
    pub rooms: BTreeMap<String, usize>,
    /// Chat messages relayed since startup.
    pub total_messages: u64,
}

impl RelayStats {
    pub async fn collect(state: &ChatAppState) -> Self {
        let snapshot = state.directory.snapshot().await;
        Self {
            online_users: snapshot.online_users,
            rooms: snapshot.rooms,
            total_messages: state.total_messages(),
        }
    }

    pub fn into_response(self, timestamp: String) -> StatsResponse {
        StatsResponse {
            online_users: self.online_users,
            rooms: self.rooms,
            total_messages: self.total_messages,
            timestamp,
            cors: CORS_ENABLED.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::session::SessionId;
    use tokio::sync::mpsc;

    #[tokio::test]
    async fn test_stats_two_general_one_tech() {
        // Arrange
        let state = ChatAppState::default();
        let mut inboxes = Vec::new();
        for room in ["general", "general", "tech"] {
            let id = SessionId::new();
            let (outbox, inbox) = mpsc::unbounded_channel();
            state.directory.register(id, outbox).await;
            state.directory.join(room, id).await;
            inboxes.push(inbox);
        }

        // Act
        let stats = RelayStats::collect(&state).await;

        // Assert
        assert_eq!(stats.online_users, 3);
        assert_eq!(
            stats.rooms,
            BTreeMap::from([("general".to_string(), 2), ("tech".to_string(), 1)])
        );
        assert_eq!(stats.total_messages, 0);
    }

    #[tokio::test]
    async fn test_stats_counts_messages() {
        let state = ChatAppState::default();
        state.record_message();
        state.record_message();

        let response = RelayStats::collect(&state)
            .await
            .into_response("2024-01-01T00:00:00.000Z".to_string());

        assert_eq!(response.total_messages, 2);
        assert_eq!(response.online_users, 0);
        assert!(response.rooms.is_empty());
        assert_eq!(response.cors, "enabled");
    }
}
