use serde::Serialize;
use utoipa::ToSchema;

use crate::state::challenge::{HintKind, SongChallenge, format_game_date};

/// What a player may know about a song before guessing it.
///
/// Carries neither the title, the accepted answers nor any hint value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ChallengePreview {
    pub song_id: String,
    /// Publication date (`YYYY-MM-DD`), absent for undated songs.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game_date: Option<String>,
    /// Number of translated lines that can be revealed.
    pub line_count: u32,
    /// Hints that can be spent during play.
    pub hints: Vec<HintKind>,
}

impl From<&SongChallenge> for ChallengePreview {
    fn from(challenge: &SongChallenge) -> Self {
        Self {
            song_id: challenge.song_id.clone(),
            game_date: challenge.game_date.map(format_game_date),
            line_count: challenge.line_count(),
            hints: HintKind::ALL.to_vec(),
        }
    }
}
