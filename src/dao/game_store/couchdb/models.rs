use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dao::models::{ScoreEntity, ScoreKey, SongEntity};

pub const SONG_PREFIX: &str = "song::";
pub const SCORE_PREFIX: &str = "score::";
pub const ANONYMOUS_SCORE_PREFIX: &str = "anonymous-score::";
pub const END_SUFFIX: &str = "\u{ffff}";

#[derive(Debug, Deserialize)]
pub struct AllDocsResponse {
    pub rows: Vec<AllDocsRow>,
}

#[derive(Debug, Deserialize)]
pub struct AllDocsRow {
    #[serde(default)]
    pub doc: Option<Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchSongDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub song: SongEntity,
}

impl CouchSongDocument {
    pub fn from_entity(song: SongEntity, rev: Option<String>) -> Self {
        Self {
            id: song_doc_id(&song.id),
            rev,
            song,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CouchScoreDocument {
    #[serde(rename = "_id")]
    pub id: String,
    #[serde(rename = "_rev", skip_serializing_if = "Option::is_none")]
    pub rev: Option<String>,
    #[serde(flatten)]
    pub score: ScoreEntity,
}

impl From<ScoreEntity> for CouchScoreDocument {
    fn from(score: ScoreEntity) -> Self {
        Self {
            id: key_doc_id(&score.key()),
            rev: None,
            score,
        }
    }
}

pub fn song_doc_id(id: &str) -> String {
    format!("{SONG_PREFIX}{id}")
}

/// Prefix shared by every score document of `user_id`.
pub fn user_scores_prefix(user_id: &str) -> String {
    format!("{SCORE_PREFIX}{user_id}::")
}

pub fn score_doc_id(user_id: &str, song_id: &str) -> String {
    format!("{}{song_id}", user_scores_prefix(user_id))
}

/// Document id of a score. Anonymous results live outside every user prefix.
pub fn key_doc_id(key: &ScoreKey) -> String {
    match key {
        ScoreKey::Player { user_id, song_id } => score_doc_id(user_id, song_id),
        ScoreKey::Anonymous(session_id) => format!("{ANONYMOUS_SCORE_PREFIX}{session_id}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_ids_are_keyed_by_user_then_song() {
        assert_eq!(score_doc_id("u1", "7pKf"), "score::u1::7pKf");
        assert!(score_doc_id("u1", "7pKf").starts_with(&user_scores_prefix("u1")));
        assert!(!score_doc_id("u10", "7pKf").starts_with(&user_scores_prefix("u1")));
    }

    #[test]
    fn anonymous_scores_are_keyed_by_session() {
        let id = key_doc_id(&ScoreKey::Anonymous("0b1f".into()));
        assert_eq!(id, "anonymous-score::0b1f");
        assert!(!id.starts_with(SCORE_PREFIX));
        assert_eq!(
            key_doc_id(&ScoreKey::player("u1", "7pKf")),
            score_doc_id("u1", "7pKf")
        );
    }
}
