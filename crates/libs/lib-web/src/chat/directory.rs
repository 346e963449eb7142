//! # Room Directory
//!
//! The only shared mutable state of the relay: which sessions are connected, which
//! rooms exist, and who is in each room. Both sides of the membership relation live
//! behind one lock, so a session's joined rooms and the rooms' member sets can never
//! disagree once an operation returns.
//!
//! Fan-out never waits on a socket. Each session owns an unbounded outbox drained by
//! its writer task; broadcasting only enqueues. An outbox whose writer is gone is a
//! dead member and is pruned on the spot, which also closes that session's loop.

use std::collections::{BTreeMap, HashMap, HashSet};

use axum::extract::ws::Utf8Bytes;
use chrono::{DateTime, Utc};
use lib_utils::time::now_utc;
use shared::dto::envelope::{ChatMessage, ServerEnvelope};
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, warn};

use super::codec::{self, CodecError};
use super::history::MessageHistory;
use super::session::SessionId;

/// Sending half of a session's outbound queue.
pub type Outbox = mpsc::UnboundedSender<Utf8Bytes>;

/// Result of one fan-out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BroadcastReport {
    /// Members the frame was queued for.
    pub delivered: usize,
    /// Members found dead and removed.
    pub pruned: usize,
}

/// What was left behind when a session was removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub rooms: Vec<String>,
    pub last_seen: DateTime<Utc>,
}

/// Consistent view used by the stats endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DirectorySnapshot {
    /// Sessions that are in at least one room, each counted once.
    pub online_users: usize,
    pub rooms: BTreeMap<String, usize>,
}

struct SessionEntry {
    outbox: Outbox,
    joined_rooms: HashSet<String>,
    last_seen: DateTime<Utc>,
}

struct Room {
    members: HashSet<SessionId>,
    history: MessageHistory,
}

#[derive(Default)]
struct Directory {
    sessions: HashMap<SessionId, SessionEntry>,
    rooms: HashMap<String, Room>,
}

impl Directory {
    fn remove_session(&mut self, id: SessionId) -> Option<Departure> {
        let entry = self.sessions.remove(&id)?;
        let mut rooms: Vec<String> = entry.joined_rooms.into_iter().collect();
        rooms.sort();
        for room in &rooms {
            self.detach(room, id);
        }
        Some(Departure {
            rooms,
            last_seen: entry.last_seen,
        })
    }

    /// Remove `id` from the room's member set, dropping the room once empty.
    fn detach(&mut self, room: &str, id: SessionId) -> bool {
        let Some(entry) = self.rooms.get_mut(room) else {
            return false;
        };
        let removed = entry.members.remove(&id);
        if entry.members.is_empty() {
            self.rooms.remove(room);
            debug!(room = %room, "[ROOM] REMOVED room={} (empty)", room);
        }
        removed
    }

    fn fan_out(&mut self, room: &str, frame: &Utf8Bytes, exclude: Option<SessionId>) -> BroadcastReport {
        let mut report = BroadcastReport::default();
        let Some(entry) = self.rooms.get(room) else {
            return report;
        };

        let mut dead = Vec::new();
        for member in &entry.members {
            if exclude == Some(*member) {
                continue;
            }
            match self.sessions.get(member) {
                Some(session) if session.outbox.send(frame.clone()).is_ok() => report.delivered += 1,
                _ => dead.push(*member),
            }
        }

        for id in dead {
            warn!(
                session_id = %id,
                room = %room,
                "[ROOM] PRUNE session_id={} room={} - outbox closed",
                id,
                room
            );
            if self.remove_session(id).is_none() {
                self.detach(room, id);
            }
            report.pruned += 1;
        }

        report
    }
}

/// Room membership and fan-out for every live session.
pub struct RoomDirectory {
    inner: RwLock<Directory>,
    history_capacity: usize,
}

impl RoomDirectory {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            inner: RwLock::new(Directory::default()),
            history_capacity,
        }
    }

    /// Make a freshly opened session reachable. It belongs to no room yet.
    pub async fn register(&self, id: SessionId, outbox: Outbox) {
        let mut dir = self.inner.write().await;
        dir.sessions.insert(
            id,
            SessionEntry {
                outbox,
                joined_rooms: HashSet::new(),
                last_seen: now_utc(),
            },
        );
    }

    /// Refresh `last_seen`. Returns `false` if the session is no longer registered.
    pub async fn touch(&self, id: SessionId) -> bool {
        let mut dir = self.inner.write().await;
        match dir.sessions.get_mut(&id) {
            Some(entry) => {
                entry.last_seen = now_utc();
                true
            }
            None => false,
        }
    }

    /// Add the session to `room`, creating the room if needed. Idempotent.
    ///
    /// Returns `false` (and changes nothing) if the session is not registered.
    pub async fn join(&self, room: &str, id: SessionId) -> bool {
        let mut dir = self.inner.write().await;
        let Some(session) = dir.sessions.get_mut(&id) else {
            return false;
        };
        session.joined_rooms.insert(room.to_string());

        let capacity = self.history_capacity;
        dir.rooms
            .entry(room.to_string())
            .or_insert_with(|| {
                debug!(room = %room, "[ROOM] CREATED room={}", room);
                Room {
                    members: HashSet::new(),
                    history: MessageHistory::new(capacity),
                }
            })
            .members
            .insert(id);
        true
    }

    /// Remove the session from `room`, dropping the room once empty. Idempotent.
    ///
    /// Returns whether the session was a member.
    pub async fn leave(&self, room: &str, id: SessionId) -> bool {
        let mut dir = self.inner.write().await;
        if let Some(session) = dir.sessions.get_mut(&id) {
            session.joined_rooms.remove(room);
        }
        dir.detach(room, id)
    }

    /// Remove the session from every room and forget it. Idempotent.
    pub async fn disconnect(&self, id: SessionId) -> Option<Departure> {
        self.inner.write().await.remove_session(id)
    }

    /// Queue an envelope for a single session.
    ///
    /// Returns `Ok(false)` if the session is gone; a closed outbox prunes it.
    pub async fn send_to(&self, id: SessionId, envelope: &ServerEnvelope) -> Result<bool, CodecError> {
        let frame = codec::encode(envelope)?;
        let mut dir = self.inner.write().await;
        let delivered = match dir.sessions.get(&id) {
            Some(session) => session.outbox.send(frame).is_ok(),
            None => return Ok(false),
        };
        if !delivered {
            warn!(session_id = %id, "[ROOM] PRUNE session_id={} - outbox closed", id);
            dir.remove_session(id);
        }
        Ok(delivered)
    }

    /// Serialize `envelope` once and queue it for every member of `room` except `exclude`.
    pub async fn broadcast(
        &self,
        room: &str,
        envelope: &ServerEnvelope,
        exclude: Option<SessionId>,
    ) -> Result<BroadcastReport, CodecError> {
        let frame = codec::encode(envelope)?;
        Ok(self.inner.write().await.fan_out(room, &frame, exclude))
    }

    /// Record a chat line in the room's history and fan it out to every member.
    ///
    /// History order matches delivery order because both happen under one lock.
    pub async fn broadcast_chat(&self, message: ChatMessage) -> Result<BroadcastReport, CodecError> {
        let frame = codec::encode(&ServerEnvelope::Message(message.clone()))?;
        let room = message.room.clone();

        let mut dir = self.inner.write().await;
        if let Some(entry) = dir.rooms.get_mut(&room) {
            entry.history.push(message);
        }
        Ok(dir.fan_out(&room, &frame, None))
    }

    /// Number of members in `room` (0 if it does not exist).
    pub async fn member_count(&self, room: &str) -> usize {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .map_or(0, |entry| entry.members.len())
    }

    /// Names of all live rooms, sorted.
    pub async fn room_names(&self) -> Vec<String> {
        let dir = self.inner.read().await;
        let mut names: Vec<String> = dir.rooms.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `id` is currently a member of `room`.
    pub async fn is_member(&self, room: &str, id: SessionId) -> bool {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .is_some_and(|entry| entry.members.contains(&id))
    }

    /// Rooms the session has joined, or `None` if it is not registered.
    pub async fn joined_rooms(&self, id: SessionId) -> Option<HashSet<String>> {
        self.inner
            .read()
            .await
            .sessions
            .get(&id)
            .map(|entry| entry.joined_rooms.clone())
    }

    pub async fn last_seen(&self, id: SessionId) -> Option<DateTime<Utc>> {
        self.inner.read().await.sessions.get(&id).map(|entry| entry.last_seen)
    }

    /// Number of open sessions, including those that have not joined a room.
    pub async fn connected_sessions(&self) -> usize {
        self.inner.read().await.sessions.len()
    }

    /// Recent chat lines of `room`, oldest first. Empty if the room does not exist.
    pub async fn history(&self, room: &str) -> Vec<ChatMessage> {
        self.inner
            .read()
            .await
            .rooms
            .get(room)
            .map(|entry| entry.history.snapshot())
            .unwrap_or_default()
    }

    /// Online users and per-room member counts, taken under one read lock.
    pub async fn snapshot(&self) -> DirectorySnapshot {
        let dir = self.inner.read().await;
        DirectorySnapshot {
            online_users: dir
                .sessions
                .values()
                .filter(|entry| !entry.joined_rooms.is_empty())
                .count(),
            rooms: dir
                .rooms
                .iter()
                .map(|(name, entry)| (name.clone(), entry.members.len()))
                .collect(),
        }
    }
}
