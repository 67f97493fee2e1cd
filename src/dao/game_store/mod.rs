#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;
#[cfg(feature = "mongo-store")]
pub mod mongodb;

use crate::dao::models::{ScoreEntity, SongEntity};
use crate::dao::storage::StorageResult;
use futures::future::BoxFuture;

/// Abstraction over the persistence layer for published songs and player results.
pub trait GameStore: Send + Sync {
    /// Create or replace a song keyed by its id.
    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn find_song(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SongEntity>>>;
    /// Active song published for `game_date` (`YYYY-MM-DD`).
    fn find_song_by_date(
        &self,
        game_date: String,
    ) -> BoxFuture<'static, StorageResult<Option<SongEntity>>>;
    /// Every stored song, active or not.
    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>>;
    /// Prior result of `user_id` on `song_id`.
    fn find_score(
        &self,
        user_id: String,
        song_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>>;
    /// Insert a result. A second result for the same (user, song) fails with
    /// [`StorageError::Conflict`](crate::dao::storage::StorageError::Conflict).
    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>>;
    fn list_user_scores(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>>;
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>>;
}
