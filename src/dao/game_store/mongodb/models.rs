use mongodb::bson::DateTime;
use serde::{Deserialize, Serialize};

use crate::dao::models::{ScoreEntity, SongEntity};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoSongDocument {
    #[serde(rename = "_id")]
    pub id: String,
    song_title: String,
    acceptable_answers: Vec<String>,
    artist: String,
    album: String,
    release_year: i32,
    popularity: u8,
    album_cover: String,
    #[serde(default)]
    original_language: String,
    translated_lyrics: Vec<String>,
    #[serde(default)]
    original_lyrics_lines: Vec<String>,
    game_date: String,
    created_at: DateTime,
    updated_at: DateTime,
    #[serde(default = "default_active")]
    is_active: bool,
}

fn default_active() -> bool {
    true
}

impl From<SongEntity> for MongoSongDocument {
    fn from(value: SongEntity) -> Self {
        Self {
            id: value.id,
            song_title: value.song_title,
            acceptable_answers: value.acceptable_answers,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            popularity: value.popularity,
            album_cover: value.album_cover,
            original_language: value.original_language,
            translated_lyrics: value.translated_lyrics,
            original_lyrics_lines: value.original_lyrics_lines,
            game_date: value.game_date,
            created_at: DateTime::from_system_time(value.created_at),
            updated_at: DateTime::from_system_time(value.updated_at),
            is_active: value.is_active,
        }
    }
}

impl From<MongoSongDocument> for SongEntity {
    fn from(value: MongoSongDocument) -> Self {
        Self {
            id: value.id,
            song_title: value.song_title,
            acceptable_answers: value.acceptable_answers,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            popularity: value.popularity,
            album_cover: value.album_cover,
            original_language: value.original_language,
            translated_lyrics: value.translated_lyrics,
            original_lyrics_lines: value.original_lyrics_lines,
            game_date: value.game_date,
            created_at: value.created_at.to_system_time(),
            updated_at: value.updated_at.to_system_time(),
            is_active: value.is_active,
        }
    }
}

/// Score document; `_id` is left to the server, uniqueness comes from the
/// partial `(user_id, song_id)` index and the `session_id` index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MongoScoreDocument {
    #[serde(default)]
    user_id: Option<String>,
    session_id: String,
    song_id: String,
    #[serde(default)]
    song_title: String,
    #[serde(default)]
    artist: String,
    #[serde(default)]
    album: String,
    #[serde(default)]
    release_year: i32,
    is_won: bool,
    tries_used: u32,
    hints_used_count: u32,
    lines_revealed: u32,
    time_elapsed_seconds: i64,
    attempts: Vec<String>,
    used_hint_types: Vec<String>,
    score: u32,
    completed_at: DateTime,
}

impl From<ScoreEntity> for MongoScoreDocument {
    fn from(value: ScoreEntity) -> Self {
        Self {
            user_id: value.user_id,
            session_id: value.session_id,
            song_id: value.song_id,
            song_title: value.song_title,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            is_won: value.is_won,
            tries_used: value.tries_used,
            hints_used_count: value.hints_used_count,
            lines_revealed: value.lines_revealed,
            time_elapsed_seconds: i64::try_from(value.time_elapsed_seconds).unwrap_or(i64::MAX),
            attempts: value.attempts,
            used_hint_types: value.used_hint_types,
            score: value.score,
            completed_at: DateTime::from_system_time(value.completed_at),
        }
    }
}

impl From<MongoScoreDocument> for ScoreEntity {
    fn from(value: MongoScoreDocument) -> Self {
        Self {
            user_id: value.user_id,
            session_id: value.session_id,
            song_id: value.song_id,
            song_title: value.song_title,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            is_won: value.is_won,
            tries_used: value.tries_used,
            hints_used_count: value.hints_used_count,
            lines_revealed: value.lines_revealed,
            time_elapsed_seconds: u64::try_from(value.time_elapsed_seconds).unwrap_or(0),
            attempts: value.attempts,
            used_hint_types: value.used_hint_types,
            score: value.score,
            completed_at: value.completed_at.to_system_time(),
        }
    }
}
