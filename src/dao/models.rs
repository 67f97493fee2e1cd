use serde::{Deserialize, Serialize};
use std::{fmt, time::SystemTime};

/// Published song challenge as curated in the admin panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SongEntity {
    /// Catalog track identifier, also the primary key.
    pub id: String,
    /// Title shown once the game is over.
    pub song_title: String,
    /// Equivalent spellings accepted as a correct guess.
    pub acceptable_answers: Vec<String>,
    pub artist: String,
    pub album: String,
    pub release_year: i32,
    /// Catalog popularity, from 0 to 100.
    pub popularity: u8,
    /// Artwork URL.
    pub album_cover: String,
    /// Language of the original lyrics (e.g. "en").
    pub original_language: String,
    /// Ordered translated lyric lines revealed during the game.
    pub translated_lyrics: Vec<String>,
    /// First original lyric lines, kept for curators.
    pub original_lyrics_lines: Vec<String>,
    /// Publication date as `YYYY-MM-DD`. At most one active song per date.
    pub game_date: String,
    /// Creation timestamp, preserved across updates.
    pub created_at: SystemTime,
    /// Last time the curator touched the song.
    pub updated_at: SystemTime,
    /// Inactive songs are hidden from players.
    pub is_active: bool,
}

/// Result of one finished game. Identified players hold at most one per song;
/// anonymous results are keyed by the session that produced them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScoreEntity {
    /// `None` for anonymous play.
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub session_id: String,
    pub song_id: String,
    pub song_title: String,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub release_year: i32,
    pub is_won: bool,
    pub tries_used: u32,
    pub hints_used_count: u32,
    pub lines_revealed: u32,
    pub time_elapsed_seconds: u64,
    /// Raw guesses in submission order.
    pub attempts: Vec<String>,
    /// Hint identifiers in reveal order.
    pub used_hint_types: Vec<String>,
    pub score: u32,
    pub completed_at: SystemTime,
}

/// Natural key of a stored score.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ScoreKey {
    /// One record per (user, song).
    Player { user_id: String, song_id: String },
    /// One record per anonymous session.
    Anonymous(String),
}

impl ScoreKey {
    pub fn player(user_id: impl Into<String>, song_id: impl Into<String>) -> Self {
        Self::Player {
            user_id: user_id.into(),
            song_id: song_id.into(),
        }
    }
}

impl fmt::Display for ScoreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Player { user_id, song_id } => {
                write!(f, "user `{user_id}` on song `{song_id}`")
            }
            Self::Anonymous(session_id) => write!(f, "anonymous session `{session_id}`"),
        }
    }
}

impl ScoreEntity {
    /// Natural key of the record.
    pub fn key(&self) -> ScoreKey {
        match &self.user_id {
            Some(user_id) => ScoreKey::player(user_id.clone(), self.song_id.clone()),
            None => ScoreKey::Anonymous(self.session_id.clone()),
        }
    }
}
