//! Payloads of the per-player history routes.

use serde::Serialize;
use utoipa::ToSchema;

use crate::{
    dto::{challenge::ChallengePreview, format_system_time},
    state::{challenge::HintKind, record::ScoreRecord, session::Outcome},
};

/// A stored result, as shown on the "already played" screen and in history.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ScoreRecordView {
    pub song_id: String,
    pub song_title: String,
    pub artist: String,
    pub album: String,
    pub release_year: i32,
    pub outcome: Outcome,
    pub tries_used: u32,
    pub hints_used_count: u32,
    pub lines_revealed: u32,
    pub time_elapsed_seconds: u64,
    pub attempts: Vec<String>,
    pub used_hint_types: Vec<HintKind>,
    pub score: u32,
    /// RFC 3339 timestamp of the end of the game.
    pub completed_at: String,
}

impl From<&ScoreRecord> for ScoreRecordView {
    fn from(record: &ScoreRecord) -> Self {
        Self {
            song_id: record.song_id.clone(),
            song_title: record.song_title.clone(),
            artist: record.artist.clone(),
            album: record.album.clone(),
            release_year: record.release_year,
            outcome: record.outcome(),
            tries_used: record.tries_used,
            hints_used_count: record.hints_used_count,
            lines_revealed: record.lines_revealed,
            time_elapsed_seconds: record.time_elapsed_seconds,
            attempts: record.attempts.clone(),
            used_hint_types: record.used_hint_types.clone(),
            score: record.score,
            completed_at: format_system_time(record.completed_at),
        }
    }
}

/// Every result of a player, most recent first, with running totals.
#[derive(Debug, Serialize, ToSchema)]
pub struct ScoreHistoryResponse {
    pub games_played: usize,
    pub games_won: usize,
    pub total_score: u64,
    pub scores: Vec<ScoreRecordView>,
}

impl ScoreHistoryResponse {
    /// Summarise `records`, which are expected newest first.
    pub fn from_records(records: &[ScoreRecord]) -> Self {
        Self {
            games_played: records.len(),
            games_won: records.iter().filter(|record| record.is_won).count(),
            total_score: records.iter().map(|record| u64::from(record.score)).sum(),
            scores: records.iter().map(ScoreRecordView::from).collect(),
        }
    }
}

/// A published daily game, with the player's result when there is one.
#[derive(Debug, Serialize, ToSchema)]
pub struct PastGame {
    #[serde(flatten)]
    pub challenge: ChallengePreview,
    /// Absent when the player never finished this song.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<ScoreRecordView>,
}
