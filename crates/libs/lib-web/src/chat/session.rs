//! # Chat Session Handler
//!
//! Drives one upgraded WebSocket from open to close.
//!
//! ## Lifecycle
//!
//! ```text
//! Connecting --(upgrade accepted)--> Open --(close / error / idle / evicted)--> Closed
//! ```
//!
//! - **Open**: a fresh [`SessionId`] is registered with the room directory together with
//!   the session's outbox, and a `connected` envelope is queued for this socket only.
//! - **Frames**: text frames are decoded and dispatched; undecodable frames are logged
//!   and dropped while the socket stays open.
//! - **Closed**: the session is removed from every room it joined before the task ends.
//!
//! Two tasks serve each socket: a reader that dispatches inbound frames and a writer that
//! drains the outbox (and sends heartbeat pings). Whichever finishes first ends the session.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::body::Bytes;
use axum::extract::ws::{Message, Utf8Bytes, WebSocket};
use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use lib_utils::time::{format_time, now_iso};
use shared::dto::envelope::{ChatMessage, ClientEnvelope, ServerEnvelope};
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::{Interval, MissedTickBehavior};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::codec;
use super::state::ChatAppState;

/// Server-assigned identity of one WebSocket connection. Never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// Why a session ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseReason {
    /// Client sent a close frame.
    ClientClosed,
    /// Transport ended without a close frame.
    StreamEnded,
    /// Reading from the socket failed.
    TransportError(String),
    /// No frame arrived within the configured idle timeout.
    IdleTimeout,
    /// Writing to the socket failed.
    SendFailed(String),
    /// The directory dropped the session's outbox.
    Evicted,
}

#[derive(Default)]
struct SessionCounters {
    sent: AtomicU64,
    received: AtomicU64,
    dropped: AtomicU64,
}

/// Run a session over an upgraded socket until it closes.
pub async fn run_session(socket: WebSocket, state: Arc<ChatAppState>, client_ip: Option<String>) {
    let session = SessionId::new();
    let started = Instant::now();
    let counters = Arc::new(SessionCounters::default());

    let (sink, stream) = socket.split();
    let (outbox, inbox) = mpsc::unbounded_channel();
    state.directory.register(session, outbox).await;

    info!(
        session_id = %session,
        client_ip = ?client_ip,
        "[WS] CONNECTED session_id={} ip={:?}",
        session,
        client_ip
    );

    let hello = ServerEnvelope::Connected {
        client_id: session.to_string(),
        timestamp: now_iso(),
    };
    match state.directory.send_to(session, &hello).await {
        Ok(true) => {}
        Ok(false) => warn!(session_id = %session, "[WS] HELLO_DROPPED session_id={}", session),
        Err(e) => error!(session_id = %session, error = %e, "[WS] HELLO_ENCODE_ERROR session_id={} error={}", session, e),
    }

    let heartbeat = state.config.heartbeat_interval;
    let idle_timeout = state.config.idle_timeout;

    let mut send_task = tokio::spawn(write_loop(sink, inbox, heartbeat, session, Arc::clone(&counters)));
    let mut recv_task = tokio::spawn(read_loop(
        stream,
        Arc::clone(&state),
        session,
        idle_timeout,
        Arc::clone(&counters),
    ));

    let reason = tokio::select! {
        result = &mut send_task => {
            recv_task.abort();
            result.unwrap_or_else(|e| CloseReason::SendFailed(format!("writer task failed: {e}")))
        }
        result = &mut recv_task => {
            send_task.abort();
            result.unwrap_or_else(|e| CloseReason::TransportError(format!("reader task failed: {e}")))
        }
    };

    let departure = state.directory.disconnect(session).await;
    let rooms = departure.as_ref().map(|d| d.rooms.clone()).unwrap_or_default();
    let last_seen = departure.as_ref().map(|d| format_time(d.last_seen));
    let duration = started.elapsed();

    info!(
        session_id = %session,
        reason = ?reason,
        rooms = ?rooms,
        last_seen = ?last_seen,
        duration_ms = duration.as_millis(),
        frames_sent = counters.sent.load(Ordering::Relaxed),
        frames_received = counters.received.load(Ordering::Relaxed),
        frames_dropped = counters.dropped.load(Ordering::Relaxed),
        "[WS] DISCONNECTED session_id={} reason={:?} rooms={:?} duration={:.2}s",
        session,
        reason,
        rooms,
        duration.as_secs_f64()
    );
}

async fn read_loop(
    mut stream: SplitStream<WebSocket>,
    state: Arc<ChatAppState>,
    session: SessionId,
    idle_timeout: Option<Duration>,
    counters: Arc<SessionCounters>,
) -> CloseReason {
    loop {
        let next = match idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, stream.next()).await {
                Ok(next) => next,
                Err(_) => return CloseReason::IdleTimeout,
            },
            None => stream.next().await,
        };

        let Some(frame) = next else {
            return CloseReason::StreamEnded;
        };

        match frame {
            Ok(Message::Text(text)) => {
                counters.received.fetch_add(1, Ordering::Relaxed);
                if !handle_text(&state, session, text.as_str()).await {
                    counters.dropped.fetch_add(1, Ordering::Relaxed);
                }
            }
            Ok(Message::Binary(data)) => {
                counters.received.fetch_add(1, Ordering::Relaxed);
                counters.dropped.fetch_add(1, Ordering::Relaxed);
                state.directory.touch(session).await;
                debug!(
                    session_id = %session,
                    size = data.len(),
                    "[WS] BINARY_IGNORED session_id={} size={}",
                    session,
                    data.len()
                );
            }
            Ok(Message::Ping(_)) | Ok(Message::Pong(_)) => {
                state.directory.touch(session).await;
            }
            Ok(Message::Close(frame)) => {
                debug!(
                    session_id = %session,
                    code = ?frame.as_ref().map(|f| f.code),
                    "[WS] CLOSE_RECEIVED session_id={}",
                    session
                );
                return CloseReason::ClientClosed;
            }
            Err(e) => return CloseReason::TransportError(e.to_string()),
        }
    }
}

async fn write_loop(
    mut sink: SplitSink<WebSocket, Message>,
    mut inbox: UnboundedReceiver<Utf8Bytes>,
    heartbeat: Option<Duration>,
    session: SessionId,
    counters: Arc<SessionCounters>,
) -> CloseReason {
    let mut ticker = heartbeat.map(|period| {
        let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        interval
    });

    loop {
        tokio::select! {
            frame = inbox.recv() => {
                let Some(frame) = frame else {
                    return CloseReason::Evicted;
                };
                if let Err(e) = sink.send(Message::Text(frame)).await {
                    return CloseReason::SendFailed(e.to_string());
                }
                counters.sent.fetch_add(1, Ordering::Relaxed);
            }
            _ = next_tick(&mut ticker) => {
                debug!(session_id = %session, "[WS] PING session_id={}", session);
                if let Err(e) = sink.send(Message::Ping(Bytes::new())).await {
                    return CloseReason::SendFailed(e.to_string());
                }
            }
        }
    }
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

/// Decode and dispatch one text frame. Returns `false` if the frame was dropped.
pub(crate) async fn handle_text(state: &ChatAppState, session: SessionId, text: &str) -> bool {
    if !state.directory.touch(session).await {
        debug!(session_id = %session, "[WS] FRAME_AFTER_CLOSE session_id={} - dropped", session);
        return false;
    }

    match codec::decode(text) {
        Ok(envelope) => {
            debug!(
                session_id = %session,
                kind = envelope.kind(),
                room = ?envelope.room(),
                "[WS] FRAME session_id={} type={}",
                session,
                envelope.kind()
            );
            dispatch(state, session, envelope).await;
            true
        }
        Err(e) => {
            warn!(
                session_id = %session,
                error = %e,
                size = text.len(),
                "[WS] FRAME_DROPPED session_id={} error={}",
                session,
                e
            );
            false
        }
    }
}

/// Apply one decoded envelope on behalf of `session`.
pub(crate) async fn dispatch(state: &ChatAppState, session: SessionId, envelope: ClientEnvelope) {
    match envelope {
        ClientEnvelope::Join { user, room } => {
            if !state.directory.join(&room, session).await {
                return;
            }
            info!(
                session_id = %session,
                username = %user.username,
                room = %room,
                "[CHAT] JOIN user={} room={}",
                user.username,
                room
            );
            let notice = ServerEnvelope::System {
                message: format!("{} joined the room", user.username),
                room: room.clone(),
                timestamp: now_iso(),
            };
            if let Err(e) = state.directory.broadcast(&room, &notice, None).await {
                error!(room = %room, error = %e, "[CHAT] ENCODE_ERROR room={} error={}", room, e);
            }
        }
        ClientEnvelope::Message { id, user, text, room } => {
            debug!(
                session_id = %session,
                username = %user.username,
                room = %room,
                size = text.len(),
                "[CHAT] MESSAGE user={} room={}",
                user.username,
                room
            );
            let message = ChatMessage {
                id,
                user,
                text,
                room,
                timestamp: now_iso(),
            };
            match state.directory.broadcast_chat(message).await {
                Ok(_) => {
                    state.record_message();
                }
                Err(e) => error!(error = %e, "[CHAT] ENCODE_ERROR error={}", e),
            }
        }
        ClientEnvelope::Typing { user, room } => {
            let indicator = ServerEnvelope::Typing {
                username: user.username,
                room: room.clone(),
            };
            if let Err(e) = state.directory.broadcast(&room, &indicator, Some(session)).await {
                error!(room = %room, error = %e, "[CHAT] ENCODE_ERROR room={} error={}", room, e);
            }
        }
        ClientEnvelope::Unknown => {
            debug!(session_id = %session, "[CHAT] UNKNOWN_TYPE session_id={} - ignored", session);
        }
    }
}
