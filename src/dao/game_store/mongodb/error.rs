use mongodb::error::{Error as MongoError, ErrorKind, WriteFailure};
use thiserror::Error;

use crate::dao::models::ScoreKey;

pub type MongoResult<T> = std::result::Result<T, MongoDaoError>;

/// Server error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

#[derive(Debug, Error)]
pub enum MongoDaoError {
    #[error("failed to parse MongoDB connection URI `{uri}`")]
    InvalidUri {
        uri: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to build MongoDB client from options")]
    ClientConstruction {
        #[source]
        source: MongoError,
    },
    #[error("MongoDB ping health check failed")]
    HealthPing {
        #[source]
        source: MongoError,
    },
    #[error("failed to ensure index `{index}` on collection `{collection}`")]
    EnsureIndex {
        collection: &'static str,
        index: &'static str,
        #[source]
        source: MongoError,
    },
    #[error("failed to save song `{id}`")]
    SaveSong {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to load song `{id}`")]
    LoadSong {
        id: String,
        #[source]
        source: MongoError,
    },
    #[error("failed to list songs")]
    ListSongs {
        #[source]
        source: MongoError,
    },
    #[error("score already recorded for {key}")]
    DuplicateScore { key: ScoreKey },
    #[error("failed to save score of {key}")]
    SaveScore {
        key: ScoreKey,
        #[source]
        source: MongoError,
    },
    #[error("failed to load scores of user `{user_id}`")]
    LoadScores {
        user_id: String,
        #[source]
        source: MongoError,
    },
}

/// Whether `err` reports a unique index violation.
pub fn is_duplicate_key(err: &MongoError) -> bool {
    matches!(
        err.kind.as_ref(),
        ErrorKind::Write(WriteFailure::WriteError(write)) if write.code == DUPLICATE_KEY_CODE
    )
}
