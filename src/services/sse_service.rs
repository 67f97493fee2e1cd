use std::{convert::Infallible, time::Duration};

use axum::response::sse::{Event, KeepAlive, Sse};
use futures::Stream;
use tokio::sync::{
    broadcast::{self, error::RecvError},
    mpsc,
};
use tokio_stream::wrappers::ReceiverStream;
use tracing::debug;

use crate::{
    dto::sse::{Handshake, ServerEvent},
    error::ServiceError,
    services::sse_events::{self, EVENT_HANDSHAKE},
    state::{SharedState, registry::SessionId},
};

/// Live subscription to the events of one session.
pub struct SessionSubscription {
    receiver: broadcast::Receiver<ServerEvent>,
    handshake: ServerEvent,
    /// Terminal event already known at subscription time. The stream sends it
    /// right after the handshake and ends.
    replay: Option<ServerEvent>,
}

fn corrupted(err: serde_json::Error) -> ServiceError {
    ServiceError::Corrupted(err.to_string())
}

/// Subscribe to the events of a live session.
pub async fn subscribe_session(
    state: &SharedState,
    session_id: SessionId,
) -> Result<SessionSubscription, ServiceError> {
    let handle = state
        .sessions()
        .get(session_id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{session_id}` not found")))?;

    // subscribe under the session lock: the outcome is broadcast under it too
    let (receiver, mut replay) = {
        let live = handle.lock().await;
        let receiver = state.sse().subscribe();
        let replay = match (live.play.outcome(), live.score) {
            (Some(outcome), Some(score)) => {
                Some(sse_events::finished_event(session_id, outcome, score).map_err(corrupted)?)
            }
            _ => None,
        };
        (receiver, replay)
    };

    // removal happens before its broadcast
    if replay.is_none() && state.sessions().get(session_id).is_none() {
        replay = Some(sse_events::closed_event(session_id).map_err(corrupted)?);
    }

    let handshake = ServerEvent::json(
        Some(session_id),
        Some(EVENT_HANDSHAKE.to_string()),
        &Handshake {
            session_id,
            degraded: state.is_degraded().await,
        },
    )
    .map_err(corrupted)?;

    Ok(SessionSubscription {
        receiver,
        handshake,
        replay,
    })
}

fn to_event(payload: ServerEvent) -> Event {
    let event = Event::default().data(payload.data);
    match payload.event {
        Some(name) => event.event(name),
        None => event,
    }
}

/// Convert a subscription into the SSE response of one session, forwarding
/// only the events addressed to it. The stream ends once the session finishes
/// or leaves the registry.
pub fn to_sse_stream(
    subscription: SessionSubscription,
    session_id: SessionId,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let SessionSubscription {
        mut receiver,
        handshake,
        replay,
    } = subscription;
    let (tx, rx) = mpsc::channel::<Result<Event, Infallible>>(8);

    tokio::spawn(async move {
        if tx.send(Ok(to_event(handshake))).await.is_err() {
            return;
        }
        if let Some(replay) = replay {
            let _ = tx.send(Ok(to_event(replay))).await;
            debug!(session_id = %session_id, "session SSE stream replayed its end");
            return;
        }

        loop {
            tokio::select! {
                _ = tx.closed() => break,
                recv_result = receiver.recv() => {
                    match recv_result {
                        Ok(payload) if payload.is_for(session_id) => {
                            let last = sse_events::ends_stream(&payload, session_id);
                            if tx.send(Ok(to_event(payload))).await.is_err() || last {
                                break;
                            }
                        }
                        Ok(_) => continue,
                        Err(RecvError::Closed) => break,
                        // Skip lagged messages but keep the stream alive.
                        Err(RecvError::Lagged(_)) => continue,
                    }
                }
            }
        }

        debug!(session_id = %session_id, "session SSE stream disconnected");
    });

    let stream = ReceiverStream::new(rx);
    Sse::new(stream).keep_alive(
        KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}
