use serde::Serialize;
use tracing::warn;

use crate::{
    dto::sse::{ClosedEvent, FinishedEvent, ServerEvent, SystemStatus, TickEvent},
    state::{SseHub, registry::SessionId, session::Outcome},
};

pub(crate) const EVENT_HANDSHAKE: &str = "handshake";
const EVENT_TICK: &str = "tick";
const EVENT_FINISHED: &str = "finished";
const EVENT_CLOSED: &str = "closed";
const EVENT_SYSTEM_STATUS: &str = "system_status";

/// Publish the new clock value of a session.
pub fn broadcast_tick(hub: &SseHub, session_id: SessionId, elapsed_seconds: u64) {
    send_event(hub, Some(session_id), EVENT_TICK, &TickEvent { elapsed_seconds });
}

/// Publish the end of a session with its final score.
pub fn broadcast_finished(hub: &SseHub, session_id: SessionId, outcome: Outcome, score: u32) {
    publish(hub, EVENT_FINISHED, finished_event(session_id, outcome, score));
}

/// Publish the removal of a session from the registry.
pub fn broadcast_closed(hub: &SseHub, session_id: SessionId) {
    publish(hub, EVENT_CLOSED, closed_event(session_id));
}

pub(crate) fn finished_event(
    session_id: SessionId,
    outcome: Outcome,
    score: u32,
) -> serde_json::Result<ServerEvent> {
    ServerEvent::json(
        Some(session_id),
        Some(EVENT_FINISHED.to_string()),
        &FinishedEvent { outcome, score },
    )
}

pub(crate) fn closed_event(session_id: SessionId) -> serde_json::Result<ServerEvent> {
    ServerEvent::json(
        Some(session_id),
        Some(EVENT_CLOSED.to_string()),
        &ClosedEvent { session_id },
    )
}

/// Whether `event` is the last one a stream of `session_id` carries.
pub(crate) fn ends_stream(event: &ServerEvent, session_id: SessionId) -> bool {
    event.session_id == Some(session_id)
        && matches!(event.event.as_deref(), Some(EVENT_FINISHED | EVENT_CLOSED))
}

/// Tell every subscriber whether the backend runs without storage.
pub fn broadcast_system_status(hub: &SseHub, degraded: bool) {
    send_event(hub, None, EVENT_SYSTEM_STATUS, &SystemStatus { degraded });
}

fn send_event(hub: &SseHub, session_id: Option<SessionId>, event: &str, payload: &impl Serialize) {
    publish(hub, event, ServerEvent::json(session_id, Some(event.to_string()), payload));
}

fn publish(hub: &SseHub, event: &str, built: serde_json::Result<ServerEvent>) {
    match built {
        Ok(built) => hub.broadcast(built),
        Err(err) => warn!(event, error = %err, "failed to serialize SSE payload"),
    }
}
