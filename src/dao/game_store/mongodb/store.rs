use std::sync::Arc;

use futures::{TryStreamExt, future::BoxFuture};
use mongodb::{
    Client, Collection, Database, IndexModel,
    bson::{Document, doc},
    options::IndexOptions,
};
use tokio::sync::RwLock;

use super::{
    config::MongoConfig,
    error::{MongoDaoError, MongoResult, is_duplicate_key},
    models::{MongoScoreDocument, MongoSongDocument},
};
use crate::dao::{
    game_store::GameStore,
    models::{ScoreEntity, SongEntity},
    storage::StorageResult,
};

const SONG_COLLECTION_NAME: &str = "songs";
const SCORE_COLLECTION_NAME: &str = "scores";

#[derive(Clone)]
pub struct MongoGameStore {
    inner: Arc<MongoInner>,
}

struct MongoInner {
    state: RwLock<MongoState>,
    config: MongoConfig,
}

struct MongoState {
    client: Client,
    database: Database,
}

impl MongoInner {
    async fn ping(&self) -> MongoResult<()> {
        let database = {
            let guard = self.state.read().await;
            guard.database.clone()
        };
        ping_database(&database).await
    }

    async fn reconnect(&self) -> MongoResult<()> {
        let (client, database) = open_database(&self.config).await?;
        let mut guard = self.state.write().await;
        guard.client = client;
        guard.database = database;
        Ok(())
    }
}

impl MongoGameStore {
    /// Connect to MongoDB and ensure indexes are present.
    pub async fn connect(config: MongoConfig) -> MongoResult<Self> {
        let (client, database) = open_database(&config).await?;

        let inner = Arc::new(MongoInner {
            state: RwLock::new(MongoState { client, database }),
            config,
        });

        let store = Self { inner };
        store.ensure_indexes().await?;
        Ok(store)
    }

    async fn ensure_indexes(&self) -> MongoResult<()> {
        let database = self.database().await;

        let songs = database.collection::<Document>(SONG_COLLECTION_NAME);
        let date_index = IndexModel::builder()
            .keys(doc! {"game_date": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("song_game_date_idx".to_owned()))
                    .build(),
            )
            .build();
        songs
            .create_index(date_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SONG_COLLECTION_NAME,
                index: "game_date",
                source,
            })?;

        // One result per identified player and song. Anonymous results
        // carry a null `user_id` and stay out of this index.
        let scores = database.collection::<Document>(SCORE_COLLECTION_NAME);
        let owner_index = IndexModel::builder()
            .keys(doc! {"user_id": 1, "song_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_player_song_idx".to_owned()))
                    .unique(Some(true))
                    .partial_filter_expression(Some(doc! {"user_id": {"$type": "string"}}))
                    .build(),
            )
            .build();
        scores
            .create_index(owner_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "user_id,song_id",
                source,
            })?;

        // One result per session.
        let session_index = IndexModel::builder()
            .keys(doc! {"session_id": 1})
            .options(
                IndexOptions::builder()
                    .name(Some("score_session_idx".to_owned()))
                    .unique(Some(true))
                    .build(),
            )
            .build();
        scores
            .create_index(session_index)
            .await
            .map_err(|source| MongoDaoError::EnsureIndex {
                collection: SCORE_COLLECTION_NAME,
                index: "session_id",
                source,
            })?;

        Ok(())
    }

    async fn database(&self) -> Database {
        let guard = self.inner.state.read().await;
        guard.database.clone()
    }

    async fn songs(&self) -> Collection<MongoSongDocument> {
        self.database()
            .await
            .collection::<MongoSongDocument>(SONG_COLLECTION_NAME)
    }

    async fn scores(&self) -> Collection<MongoScoreDocument> {
        self.database()
            .await
            .collection::<MongoScoreDocument>(SCORE_COLLECTION_NAME)
    }

    async fn save_song(&self, song: SongEntity) -> MongoResult<()> {
        let id = song.id.clone();
        let document: MongoSongDocument = song.into();
        self.songs()
            .await
            .replace_one(doc! {"_id": id.as_str()}, &document)
            .upsert(true)
            .await
            .map_err(|source| MongoDaoError::SaveSong { id, source })?;
        Ok(())
    }

    async fn find_song_where(&self, filter: Document, id: String) -> MongoResult<Option<SongEntity>> {
        let document = self
            .songs()
            .await
            .find_one(filter)
            .await
            .map_err(|source| MongoDaoError::LoadSong { id, source })?;
        Ok(document.map(Into::into))
    }

    async fn list_songs(&self) -> MongoResult<Vec<SongEntity>> {
        let documents: Vec<MongoSongDocument> = self
            .songs()
            .await
            .find(doc! {})
            .await
            .map_err(|source| MongoDaoError::ListSongs { source })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::ListSongs { source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }

    async fn save_score(&self, score: ScoreEntity) -> MongoResult<()> {
        let key = score.key();
        let document: MongoScoreDocument = score.into();
        match self.scores().await.insert_one(&document).await {
            Ok(_) => Ok(()),
            Err(source) if is_duplicate_key(&source) => Err(MongoDaoError::DuplicateScore { key }),
            Err(source) => Err(MongoDaoError::SaveScore { key, source }),
        }
    }

    async fn find_scores(&self, filter: Document, user_id: String) -> MongoResult<Vec<ScoreEntity>> {
        let documents: Vec<MongoScoreDocument> = self
            .scores()
            .await
            .find(filter)
            .await
            .map_err(|source| MongoDaoError::LoadScores {
                user_id: user_id.clone(),
                source,
            })?
            .try_collect()
            .await
            .map_err(|source| MongoDaoError::LoadScores { user_id, source })?;

        Ok(documents.into_iter().map(Into::into).collect())
    }
}

async fn open_database(config: &MongoConfig) -> MongoResult<(Client, Database)> {
    let client = Client::with_options(config.options.clone())
        .map_err(|source| MongoDaoError::ClientConstruction { source })?;
    let database = client.database(&config.database_name);
    ping_database(&database).await?;
    Ok((client, database))
}

async fn ping_database(database: &Database) -> MongoResult<()> {
    database
        .run_command(doc! { "ping": 1 })
        .await
        .map_err(|source| MongoDaoError::HealthPing { source })?;
    Ok(())
}

impl GameStore for MongoGameStore {
    fn save_song(&self, song: SongEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_song(song).await.map_err(Into::into) })
    }

    fn find_song(&self, id: String) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_song_where(doc! {"_id": id.as_str()}, id)
                .await
                .map_err(Into::into)
        })
    }

    fn find_song_by_date(
        &self,
        game_date: String,
    ) -> BoxFuture<'static, StorageResult<Option<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_song_where(doc! {"game_date": game_date.as_str(), "is_active": true}, game_date)
                .await
                .map_err(Into::into)
        })
    }

    fn list_songs(&self) -> BoxFuture<'static, StorageResult<Vec<SongEntity>>> {
        let store = self.clone();
        Box::pin(async move { store.list_songs().await.map_err(Into::into) })
    }

    fn find_score(
        &self,
        user_id: String,
        song_id: String,
    ) -> BoxFuture<'static, StorageResult<Option<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            let filter = doc! {"user_id": user_id.as_str(), "song_id": song_id.as_str()};
            let mut found = store.find_scores(filter, user_id).await?;
            Ok(found.pop())
        })
    }

    fn save_score(&self, score: ScoreEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.save_score(score).await.map_err(Into::into) })
    }

    fn list_user_scores(
        &self,
        user_id: String,
    ) -> BoxFuture<'static, StorageResult<Vec<ScoreEntity>>> {
        let store = self.clone();
        Box::pin(async move {
            store
                .find_scores(doc! {"user_id": user_id.as_str()}, user_id)
                .await
                .map_err(Into::into)
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.ping().await.map_err(Into::into) })
    }

    fn try_reconnect(&self) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        Box::pin(async move { store.inner.reconnect().await.map_err(Into::into) })
    }
}
