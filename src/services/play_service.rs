//! Play-history guard and the lifecycle of live sessions.
//!
//! Every operation locks the session for its whole duration, so a session is
//! never mutated concurrently. The only write to storage happens once, right
//! after the terminal transition and still under the lock, so the session
//! cannot be closed and reopened while its result is in flight.

use std::sync::Arc;

use tracing::{info, warn};

use crate::{
    dao::models::ScoreEntity,
    dto::{
        history::ScoreRecordView,
        session::{OpenSessionResponse, SessionView},
    },
    error::ServiceError,
    services::{
        challenge_service::{self, ChallengeKey},
        sse_events,
    },
    state::{
        SharedState,
        challenge::HintKind,
        record::ScoreRecord,
        registry::{LiveSession, PersistStatus, SessionHandle, SessionId},
        session::{GuessOutcome, Rejection},
        timer::{SessionTimer, TICK_PERIOD},
    },
};

fn lookup(state: &SharedState, id: SessionId) -> Result<SessionHandle, ServiceError> {
    state
        .sessions()
        .get(id)
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))
}

/// Open a session on `song_id` for `user` (anonymous when `None`).
///
/// An identified player with a stored result gets it back and no session is
/// created. A player with a live session on the song resumes it.
pub async fn open_session(
    state: &SharedState,
    user: Option<String>,
    song_id: String,
) -> Result<OpenSessionResponse, ServiceError> {
    let challenge =
        challenge_service::fetch_challenge(state, ChallengeKey::Id(song_id.clone())).await?;

    if let Some(user) = &user {
        let store = state.require_game_store().await?;
        if let Some(prior) = store.find_score(user.clone(), song_id.clone()).await? {
            let record = ScoreRecord::try_from(prior)?;
            info!(user = %user, song_id = %song_id, "replay blocked by stored result");
            return Ok(OpenSessionResponse::AlreadyPlayed {
                result: ScoreRecordView::from(&record),
            });
        }
    }

    let (handle, resumed) = state
        .sessions()
        .open(user.clone(), challenge, state.rules().max_tries);
    let mut live = handle.lock().await;
    live.touch();

    if resumed {
        info!(session_id = %live.id, song_id = %song_id, user = ?user, "session resumed");
    } else {
        info!(session_id = %live.id, song_id = %song_id, user = ?user, "session opened");
    }

    Ok(OpenSessionResponse::Opened {
        resumed,
        session: SessionView::from_live(&live),
    })
}

/// Current view of a session.
pub async fn get(state: &SharedState, id: SessionId) -> Result<SessionView, ServiceError> {
    let handle = lookup(state, id)?;
    let mut live = handle.lock().await;
    live.touch();
    Ok(SessionView::from_live(&live))
}

/// Leave the waiting screen and start the clock.
pub async fn start(state: &SharedState, id: SessionId) -> Result<SessionView, ServiceError> {
    let handle = lookup(state, id)?;
    let mut live = handle.lock().await;
    live.touch();

    let rejection = match live.play.start() {
        Ok(()) => {
            let timer = SessionTimer::spawn(
                id,
                Arc::downgrade(&handle),
                state.sse().clone(),
                TICK_PERIOD,
            );
            live.attach_timer(timer);
            info!(session_id = %id, song_id = %live.challenge.song_id, "session started");
            None
        }
        Err(reason) => Some(reason),
    };

    Ok(SessionView::from_live(&live).with_rejection(rejection))
}

/// Submit a title guess. The guess that ends the game settles the score and
/// triggers the single persistence attempt, anonymous sessions included.
pub async fn guess(
    state: &SharedState,
    id: SessionId,
    raw: &str,
) -> Result<SessionView, ServiceError> {
    let handle = lookup(state, id)?;
    let mut live = handle.lock().await;
    live.touch();

    match live.submit_guess(raw) {
        Ok(GuessOutcome::Finished(outcome)) => {
            let record = live.settle(state.rules());
            let score = live.score.unwrap_or_default();
            info!(
                session_id = %id,
                song_id = %live.challenge.song_id,
                ?outcome,
                score,
                "session finished"
            );
            sse_events::broadcast_finished(state.sse(), id, outcome, score);
            if let Some(record) = record {
                live.persistence = Some(persist(state, record).await);
            }
            Ok(SessionView::from_live(&live))
        }
        Ok(GuessOutcome::Missed { .. }) => Ok(SessionView::from_live(&live)),
        Err(reason) => Ok(SessionView::from_live(&live).with_rejection(Some(reason))),
    }
}

/// Reveal one more lyric line.
pub async fn reveal_line(state: &SharedState, id: SessionId) -> Result<SessionView, ServiceError> {
    apply(state, id, |live| live.play.reveal_next_line().map(drop)).await
}

/// Spend a hint.
pub async fn reveal_hint(
    state: &SharedState,
    id: SessionId,
    kind: HintKind,
) -> Result<SessionView, ServiceError> {
    apply(state, id, |live| live.play.reveal_hint(kind)).await
}

/// Tear a session down, stop its clock and end its event streams.
pub async fn close(state: &SharedState, id: SessionId) -> Result<(), ServiceError> {
    state
        .sessions()
        .remove(id)
        .await
        .ok_or_else(|| ServiceError::NotFound(format!("session `{id}` not found")))?;
    sse_events::broadcast_closed(state.sse(), id);
    info!(session_id = %id, "session closed");
    Ok(())
}

async fn apply<F>(state: &SharedState, id: SessionId, action: F) -> Result<SessionView, ServiceError>
where
    F: FnOnce(&mut LiveSession) -> Result<(), Rejection>,
{
    let handle = lookup(state, id)?;
    let mut live = handle.lock().await;
    live.touch();
    let rejection = action(&mut live).err();
    Ok(SessionView::from_live(&live).with_rejection(rejection))
}

/// Single write attempt of a finished session's record. Failures are logged
/// and never retried.
async fn persist(state: &SharedState, record: ScoreRecord) -> PersistStatus {
    let user = record.user_id.clone();
    let session_id = record.session_id;
    let song_id = record.song_id.clone();

    let store = match state.require_game_store().await {
        Ok(store) => store,
        Err(err) => {
            warn!(%session_id, user = ?user, song_id = %song_id, error = %err, "result not persisted");
            return PersistStatus::Failed;
        }
    };

    match store.save_score(ScoreEntity::from(record)).await {
        Ok(()) => {
            info!(%session_id, user = ?user, song_id = %song_id, "result persisted");
            PersistStatus::Stored
        }
        Err(err) => {
            warn!(%session_id, user = ?user, song_id = %song_id, error = %err, "result not persisted");
            PersistStatus::Failed
        }
    }
}
