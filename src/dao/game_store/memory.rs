//! Process-local store, used by tests and `STORE_BACKEND=memory`.

use std::{
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use dashmap::{DashMap, mapref::entry::Entry};
use futures::future::BoxFuture;
use thiserror::Error;

use crate::dao::{
    game_store::GameStore,
    models::{ScoreEntity, ScoreKey, SongEntity},
    storage::{StorageError, StorageResult},
};

/// Raised while the store is switched offline.
#[derive(Debug, Error)]
#[error("in-memory store is offline")]
pub struct Offline;

#[derive(Clone, Default)]
pub struct MemoryGameStore {
    inner: Arc<MemoryInner>,
}

#[derive(Default)]
struct MemoryInner {
    songs: DashMap<String, SongEntity>,
    scores: DashMap<ScoreKey, ScoreEntity>,
    offline: AtomicBool,
    failing_writes: AtomicBool,
    write_delay_ms: AtomicU64,
}

impl MemoryGameStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every operation fail as if the backend were unreachable.
    pub fn set_offline(&self, offline: bool) {
        self.inner.offline.store(offline, Ordering::SeqCst);
    }

    /// Make score writes fail while reads keep working.
    pub fn set_failing_writes(&self, failing: bool) {
        self.inner.failing_writes.store(failing, Ordering::SeqCst);
    }

    /// Hold every score write for `delay` before it lands.
    pub fn set_write_delay(&self, delay: Duration) {
        let millis = u64::try_from(delay.as_millis()).unwrap_or(u64::MAX);
        self.inner.write_delay_ms.store(millis, Ordering::SeqCst);
    }

    /// Number of stored results.
    pub fn score_count(&self) -> usize {
        self.inner.scores.len()
    }

    fn check_online(&self) -> StorageResult<()> {
        if self.inner.offline.load(Ordering::SeqCst) {
            return Err(StorageError::unavailable("memory store offline".into(), Offline));
        }
        Ok(())
    }
}

impl GameStore for MemoryGameStore {
    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            store.inner.songs.insert(song.id.clone(), song);
            Ok(())
        })
    }

    fn find_song(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.songs.get(&id).map(|song| song.clone()))
        })
    }

    fn find_song_by_date(
        &self,
        game_date: String,
    ) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .songs
                .iter()
                .find(|song| song.is_active && song.game_date == game_date)
                .map(|song| song.clone()))
        })
    }

    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store.inner.songs.iter().map(|song| song.clone()).collect())
        })
    }

    fn find_score(
        &self,
        user_id: String,
        song_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .scores
                .get(&ScoreKey::player(user_id, song_id))
                .map(|score| score.clone()))
        })
    }

    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            let delay = store.inner.write_delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if store.inner.failing_writes.load(Ordering::SeqCst) {
                return Err(StorageError::unavailable(
                    "memory store rejected the write".into(),
                    Offline,
                ));
            }
            match store.inner.scores.entry(score.key()) {
                Entry::Occupied(entry) => Err(StorageError::conflict(format!(
                    "score already recorded for {}",
                    entry.key()
                ))),
                Entry::Vacant(slot) => {
                    slot.insert(score);
                    Ok(())
                }
            }
        })
    }

    fn list_user_scores(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store.check_online()?;
            Ok(store
                .inner
                .scores
                .iter()
                .filter(|score| score.user_id.as_deref() == Some(user_id.as_str()))
                .map(|score| score.clone())
                .collect())
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.check_online() })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        self.health_check()
    }
}

#[cfg(test)]
mod tests {
    use std::time::SystemTime;

    use super::*;

    fn score(user: Option<&str>, song: &str) -> ScoreEntity {
        ScoreEntity {
            user_id: user.map(Into::into),
            session_id: uuid::Uuid::new_v4().to_string(),
            song_id: song.into(),
            song_title: "Imagine".into(),
            artist: "John Lennon".into(),
            album: "Imagine".into(),
            release_year: 1971,
            is_won: true,
            tries_used: 1,
            hints_used_count: 0,
            lines_revealed: 1,
            time_elapsed_seconds: 12,
            attempts: vec!["Imagine".into()],
            used_hint_types: vec![],
            score: 2400,
            completed_at: SystemTime::now(),
        }
    }

    #[tokio::test]
    async fn second_score_for_the_same_pair_conflicts() {
        let store = MemoryGameStore::new();
        store.save_score(score(Some("u1"), "s1")).await.unwrap();

        let err = store.save_score(score(Some("u1"), "s1")).await.unwrap_err();
        assert!(matches!(err, StorageError::Conflict { .. }));

        store.save_score(score(Some("u1"), "s2")).await.unwrap();
        store.save_score(score(Some("u2"), "s1")).await.unwrap();
        assert_eq!(store.score_count(), 3);
        assert_eq!(store.list_user_scores("u1".into()).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn anonymous_scores_are_kept_per_session() {
        let store = MemoryGameStore::new();
        store.save_score(score(None, "s1")).await.unwrap();
        store.save_score(score(None, "s1")).await.unwrap();
        store.save_score(score(Some("u1"), "s1")).await.unwrap();

        let replay = score(None, "s1");
        store.save_score(replay.clone()).await.unwrap();
        assert!(matches!(
            store.save_score(replay).await,
            Err(StorageError::Conflict { .. })
        ));

        assert_eq!(store.score_count(), 4);
        assert_eq!(store.list_user_scores("u1".into()).await.unwrap().len(), 1);
        assert!(store.list_user_scores("".into()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn offline_store_reports_unavailable() {
        let store = MemoryGameStore::new();
        store.set_offline(true);
        assert!(store.health_check().await.is_err());
        assert!(matches!(
            store.find_score("u1".into(), "s1".into()).await,
            Err(StorageError::Unavailable { .. })
        ));

        store.set_offline(false);
        assert!(store.health_check().await.is_ok());
    }
}
