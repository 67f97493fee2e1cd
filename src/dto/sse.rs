use serde::Serialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::session::Outcome;

#[derive(Clone, Debug)]
/// Dispatched payload carried across SSE channels.
pub struct ServerEvent {
    /// Session the event is about; `None` for system-wide events.
    pub session_id: Option<Uuid>,
    pub event: Option<String>,
    pub data: String,
}

impl ServerEvent {
    /// Convenience wrapper that serialises `payload` into the SSE data field.
    pub fn json<E, T>(session_id: Option<Uuid>, event: E, payload: &T) -> serde_json::Result<Self>
    where
        E: Into<Option<String>>,
        T: Serialize,
    {
        Ok(Self {
            session_id,
            event: event.into(),
            data: serde_json::to_string(payload)?,
        })
    }

    /// Whether a subscriber of `session_id` should receive this event.
    pub fn is_for(&self, session_id: Uuid) -> bool {
        self.session_id.is_none_or(|id| id == session_id)
    }
}

#[derive(Debug, Serialize, ToSchema)]
/// Initial metadata sent to an SSE client when it connects.
pub struct Handshake {
    /// Session the stream is bound to.
    pub session_id: Uuid,
    /// Whether the backend is running without a storage backend connection.
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Broadcast when the backend enters or leaves degraded mode.
pub struct SystemStatus {
    pub degraded: bool,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted every second while a session is in progress.
pub struct TickEvent {
    pub elapsed_seconds: u64,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted once when a session reaches its outcome.
pub struct FinishedEvent {
    pub outcome: Outcome,
    pub score: u32,
}

#[derive(Debug, Serialize, ToSchema)]
/// Emitted when a session leaves the registry, after which its stream ends.
pub struct ClosedEvent {
    pub session_id: Uuid,
}
