//! In-memory registry of live play sessions.

use std::{sync::Arc, time::Duration};

use dashmap::{DashMap, mapref::entry::Entry};
use serde::Serialize;
use tokio::{sync::Mutex, time::Instant};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::state::{
    challenge::SongChallenge,
    record::ScoreRecord,
    scoring::{GameRules, compute_score},
    session::{GuessOutcome, PlaySession, Rejection},
    timer::SessionTimer,
};

/// Identifier of a live session.
pub type SessionId = Uuid;

/// Shared handle on a live session. Each operation holds the lock until it completes.
pub type SessionHandle = Arc<Mutex<LiveSession>>;

/// Where the result of a finished session stands with persistence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum PersistStatus {
    /// The write has not completed yet.
    Pending,
    /// The record reached the store.
    Stored,
    /// The single write attempt failed; the local result stays authoritative.
    Failed,
}

/// A play session together with everything needed to drive it.
#[derive(Debug)]
pub struct LiveSession {
    pub id: SessionId,
    /// Identified player, `None` for anonymous play.
    pub owner: Option<String>,
    pub challenge: SongChallenge,
    pub play: PlaySession,
    /// Final score, set on the terminal transition.
    pub score: Option<u32>,
    /// Set on the terminal transition.
    pub persistence: Option<PersistStatus>,
    timer: Option<SessionTimer>,
    last_activity: Instant,
}

impl LiveSession {
    /// Wrap a fresh waiting-screen session.
    pub fn new(
        id: SessionId,
        owner: Option<String>,
        challenge: SongChallenge,
        max_tries: u32,
    ) -> Self {
        let play = PlaySession::new(&challenge, max_tries);
        Self {
            id,
            owner,
            challenge,
            play,
            score: None,
            persistence: None,
            timer: None,
            last_activity: Instant::now(),
        }
    }

    /// Submit a guess against the session's own challenge.
    pub fn submit_guess(&mut self, raw: &str) -> Result<GuessOutcome, Rejection> {
        self.play.submit_guess(&self.challenge, raw)
    }

    /// Install the clock, replacing (and stopping) any previous one.
    pub fn attach_timer(&mut self, timer: SessionTimer) {
        if let Some(previous) = self.timer.replace(timer) {
            previous.cancel();
        }
    }

    /// Stop the clock if it runs.
    pub fn stop_timer(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.cancel();
        }
    }

    /// Whether a clock is attached.
    pub fn has_timer(&self) -> bool {
        self.timer.is_some()
    }

    /// Settle a session that just reached its outcome.
    ///
    /// Stops the clock, computes the score and returns the record to persist,
    /// anonymous sessions included. Calling it again, or on a running session,
    /// returns `None`.
    pub fn settle(&mut self, rules: &GameRules) -> Option<ScoreRecord> {
        if self.score.is_some() || !self.play.phase().is_finished() {
            return None;
        }

        self.stop_timer();
        let score = compute_score(rules, &self.play.score_input());
        self.score = Some(score);

        let record = ScoreRecord::from_session(
            self.owner.clone(),
            self.id,
            &self.challenge,
            &self.play,
            score,
        )?;
        self.persistence = Some(PersistStatus::Pending);
        Some(record)
    }

    /// Record player activity.
    pub fn touch(&mut self) {
        self.last_activity = Instant::now();
    }

    /// Time since the last player action.
    pub fn idle_for(&self) -> Duration {
        self.last_activity.elapsed()
    }
}

/// Live sessions by id, with at most one per identified (user, song) pair.
#[derive(Default)]
pub struct SessionRegistry {
    sessions: DashMap<SessionId, SessionHandle>,
    owners: DashMap<(String, String), SessionId>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a live session.
    pub fn get(&self, id: SessionId) -> Option<SessionHandle> {
        self.sessions.get(&id).map(|entry| entry.value().clone())
    }

    /// Live session of `user` for `song_id`, if any.
    pub fn find_owned(&self, user: &str, song_id: &str) -> Option<SessionHandle> {
        let id = *self.owners.get(&(user.to_owned(), song_id.to_owned()))?;
        self.get(id)
    }

    /// Return the live session of the owner for this challenge or register a
    /// new one. The boolean is `true` when an existing session was returned.
    pub fn open(
        &self,
        owner: Option<String>,
        challenge: SongChallenge,
        max_tries: u32,
    ) -> (SessionHandle, bool) {
        let Some(user) = owner else {
            let (_, handle) = self.register(None, challenge, max_tries);
            return (handle, false);
        };

        match self.owners.entry((user.clone(), challenge.song_id.clone())) {
            Entry::Occupied(mut entry) => {
                if let Some(existing) = self.get(*entry.get()) {
                    return (existing, true);
                }
                let (id, handle) = self.register(Some(user), challenge, max_tries);
                entry.insert(id);
                (handle, false)
            }
            Entry::Vacant(entry) => {
                let (id, handle) = self.register(Some(user), challenge, max_tries);
                entry.insert(id);
                (handle, false)
            }
        }
    }

    /// Drop a session and stop its clock.
    ///
    /// Waits for the operation holding the session, a pending result write
    /// included, so the session stays reachable until that write has landed.
    pub async fn remove(&self, id: SessionId) -> Option<SessionHandle> {
        let handle = self.get(id)?;
        let mut live = handle.lock().await;
        self.sessions.remove(&id)?;
        live.stop_timer();
        if let Some(user) = live.owner.clone() {
            let key = (user, live.challenge.song_id.clone());
            self.owners.remove_if(&key, |_, owned| *owned == id);
        }
        drop(live);
        Some(handle)
    }

    /// Drop every session idle for longer than `retention`. Sessions busy with
    /// an operation are skipped. Returns the ids of the evicted sessions.
    pub async fn evict_expired(&self, retention: Duration) -> Vec<SessionId> {
        let expired = self
            .sessions
            .iter()
            .filter_map(|entry| {
                let live = entry.value().try_lock().ok()?;
                (live.idle_for() > retention).then_some(*entry.key())
            })
            .collect::<Vec<_>>();

        let mut evicted = Vec::with_capacity(expired.len());
        for id in expired {
            if self.remove(id).await.is_some() {
                evicted.push(id);
            }
        }
        evicted
    }

    /// Number of live sessions.
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    fn register(
        &self,
        owner: Option<String>,
        challenge: SongChallenge,
        max_tries: u32,
    ) -> (SessionId, SessionHandle) {
        let id = SessionId::new_v4();
        let handle = Arc::new(Mutex::new(LiveSession::new(id, owner, challenge, max_tries)));
        self.sessions.insert(id, handle.clone());
        (id, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{challenge::tests::imagine, session::Outcome};

    #[tokio::test]
    async fn identified_players_get_one_session_per_song() {
        let registry = SessionRegistry::new();

        let (first, resumed) = registry.open(Some("u1".into()), imagine(), 3);
        assert!(!resumed);
        let (again, resumed) = registry.open(Some("u1".into()), imagine(), 3);
        assert!(resumed);
        assert!(Arc::ptr_eq(&first, &again));

        let (other_user, resumed) = registry.open(Some("u2".into()), imagine(), 3);
        assert!(!resumed);
        assert!(!Arc::ptr_eq(&first, &other_user));
        assert_eq!(registry.len(), 2);
    }

    #[tokio::test]
    async fn anonymous_players_always_get_a_fresh_session() {
        let registry = SessionRegistry::new();
        let (a, _) = registry.open(None, imagine(), 3);
        let (b, resumed) = registry.open(None, imagine(), 3);
        assert!(!resumed);
        assert!(!Arc::ptr_eq(&a, &b));
    }

    #[tokio::test]
    async fn removing_a_session_frees_the_owner_slot() {
        let registry = SessionRegistry::new();
        let (handle, _) = registry.open(Some("u1".into()), imagine(), 3);
        let id = handle.lock().await.id;

        assert!(registry.remove(id).await.is_some());
        assert!(registry.get(id).is_none());
        assert!(registry.find_owned("u1", &imagine().song_id).is_none());

        let (_, resumed) = registry.open(Some("u1".into()), imagine(), 3);
        assert!(!resumed);
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_are_evicted() {
        let registry = SessionRegistry::new();
        let (stale, _) = registry.open(Some("u1".into()), imagine(), 3);
        let stale_id = stale.lock().await.id;
        drop(stale);

        tokio::time::advance(Duration::from_secs(90)).await;
        let (fresh, _) = registry.open(Some("u2".into()), imagine(), 3);
        let fresh_id = fresh.lock().await.id;

        assert_eq!(
            registry.evict_expired(Duration::from_secs(60)).await,
            [stale_id]
        );
        assert!(registry.get(stale_id).is_none());
        assert!(registry.get(fresh_id).is_some());
    }

    #[test]
    fn settling_happens_once() {
        let rules = GameRules::default();
        let mut live = LiveSession::new(SessionId::new_v4(), Some("u1".into()), imagine(), 3);
        assert!(live.settle(&rules).is_none());

        live.play.start().unwrap();
        assert_eq!(
            live.submit_guess("Imagine"),
            Ok(GuessOutcome::Finished(Outcome::Won))
        );

        let record = live.settle(&rules).unwrap();
        assert_eq!(record.user_id.as_deref(), Some("u1"));
        assert_eq!(record.session_id, live.id);
        assert_eq!(Some(record.score), live.score);
        assert_eq!(live.persistence, Some(PersistStatus::Pending));
        assert!(live.settle(&rules).is_none());
    }

    #[test]
    fn anonymous_results_are_settled_once() {
        let rules = GameRules::default();
        let mut live = LiveSession::new(SessionId::new_v4(), None, imagine(), 1);
        live.play.start().unwrap();
        live.submit_guess("nope").unwrap();

        let record = live.settle(&rules).unwrap();
        assert_eq!(record.user_id, None);
        assert_eq!(record.session_id, live.id);
        assert_eq!(record.score, 0);
        assert_eq!(live.score, Some(0));
        assert_eq!(live.persistence, Some(PersistStatus::Pending));
        assert!(live.settle(&rules).is_none());
    }

    #[tokio::test]
    async fn removal_waits_for_the_running_operation() {
        let registry = Arc::new(SessionRegistry::new());
        let (handle, _) = registry.open(Some("u1".into()), imagine(), 3);
        let id = handle.lock().await.id;

        let busy = handle.clone().lock_owned().await;
        let removing = tokio::spawn({
            let registry = registry.clone();
            async move { registry.remove(id).await.is_some() }
        });
        tokio::task::yield_now().await;

        let (again, resumed) = registry.open(Some("u1".into()), imagine(), 3);
        assert!(resumed);
        assert!(Arc::ptr_eq(&handle, &again));

        drop(busy);
        assert!(removing.await.unwrap());
        assert!(registry.get(id).is_none());
        assert!(registry.find_owned("u1", &imagine().song_id).is_none());
    }
}
