//! Payloads of the play session routes.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::{Validate, ValidationErrors};

use crate::{
    dto::{history::ScoreRecordView, validation::validate_song_id},
    state::{
        challenge::HintKind,
        registry::{LiveSession, PersistStatus},
        session::{Outcome, Rejection, SessionPhase},
    },
};

/// Request to open (or resume) a session on a song.
#[derive(Debug, Deserialize, ToSchema)]
pub struct OpenSessionRequest {
    pub song_id: String,
}

impl Validate for OpenSessionRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();
        if let Err(e) = validate_song_id(&self.song_id) {
            errors.add("song_id", e);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// A title guess. Blank guesses are accepted on the wire and ignored by the game.
#[derive(Debug, Deserialize, ToSchema)]
pub struct GuessRequest {
    pub guess: String,
}

/// Lifecycle phase exposed to players.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum VisiblePhase {
    NotStarted,
    InProgress,
    Won,
    Lost,
}

impl From<SessionPhase> for VisiblePhase {
    fn from(phase: SessionPhase) -> Self {
        match phase {
            SessionPhase::NotStarted => VisiblePhase::NotStarted,
            SessionPhase::InProgress => VisiblePhase::InProgress,
            SessionPhase::Finished(Outcome::Won) => VisiblePhase::Won,
            SessionPhase::Finished(Outcome::Lost) => VisiblePhase::Lost,
        }
    }
}

/// A hint the player paid for, with its value.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RevealedHint {
    pub kind: HintKind,
    pub value: String,
}

/// Player-facing snapshot of a live session.
///
/// Only revealed lines and hint values are included; the title shows up once
/// the game is over.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct SessionView {
    pub session_id: Uuid,
    pub song_id: String,
    pub phase: VisiblePhase,
    pub max_tries: u32,
    pub tries_remaining: u32,
    pub attempts: Vec<String>,
    /// Lyric lines visible so far, empty on the waiting screen.
    pub lines: Vec<String>,
    /// Total number of lyric lines.
    pub line_count: u32,
    /// Hints in reveal order.
    pub hints: Vec<RevealedHint>,
    pub elapsed_seconds: u64,
    pub album_blurred: bool,
    /// Canonical title, present once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub answer: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<u32>,
    /// Fate of the result write, present once the game is over.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence: Option<PersistStatus>,
    /// Why the last action left the session unchanged.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rejected: Option<Rejection>,
}

impl SessionView {
    /// Snapshot `live` as seen by its player.
    pub fn from_live(live: &LiveSession) -> Self {
        let play = &live.play;
        let phase = play.phase();
        let visible_lines = match phase {
            SessionPhase::NotStarted => 0,
            _ => play.revealed_line_count() as usize,
        };

        Self {
            session_id: live.id,
            song_id: live.challenge.song_id.clone(),
            phase: phase.into(),
            max_tries: play.max_tries(),
            tries_remaining: play.tries_remaining(),
            attempts: play.attempts().to_vec(),
            lines: live
                .challenge
                .translated_lyric_lines
                .iter()
                .take(visible_lines)
                .cloned()
                .collect(),
            line_count: live.challenge.line_count(),
            hints: play
                .used_hints()
                .map(|kind| RevealedHint {
                    kind,
                    value: live.challenge.hint_value(kind),
                })
                .collect(),
            elapsed_seconds: play.elapsed_seconds(),
            album_blurred: play.album_blurred(),
            answer: phase
                .is_finished()
                .then(|| live.challenge.canonical_title.clone()),
            score: live.score,
            persistence: live.persistence,
            rejected: None,
        }
    }

    /// Attach the reason an action was ignored.
    pub fn with_rejection(mut self, rejection: Option<Rejection>) -> Self {
        self.rejected = rejection;
        self
    }
}

/// Result of `POST /sessions`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OpenSessionResponse {
    /// A session is ready to be played.
    Opened {
        /// True when an existing live session was handed back.
        resumed: bool,
        session: SessionView,
    },
    /// The player already has a result for this song; no session was created.
    AlreadyPlayed { result: ScoreRecordView },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::challenge::tests::imagine;

    fn live() -> LiveSession {
        LiveSession::new(Uuid::new_v4(), Some("u1".into()), imagine(), 3)
    }

    #[test]
    fn waiting_screen_shows_no_lyrics() {
        let view = SessionView::from_live(&live());
        assert_eq!(view.phase, VisiblePhase::NotStarted);
        assert!(view.lines.is_empty());
        assert_eq!(view.line_count, 6);
        assert!(view.answer.is_none());
    }

    #[test]
    fn only_revealed_content_is_exposed() {
        let mut session = live();
        session.play.start().unwrap();
        session.play.reveal_next_line().unwrap();
        session.play.reveal_hint(HintKind::Year).unwrap();

        let view = SessionView::from_live(&session);
        assert_eq!(view.lines.len(), 2);
        assert_eq!(view.hints.len(), 1);
        assert_eq!(view.hints[0].value, "1971");
        assert!(view.album_blurred);

        let json = serde_json::to_string(&view).unwrap();
        assert!(!json.contains("John Lennon"));
        assert!(!json.contains("\"answer\""));
    }

    #[test]
    fn finished_view_reveals_the_title() {
        let mut session = live();
        session.play.start().unwrap();
        session.submit_guess("Imagine").unwrap();

        let view = SessionView::from_live(&session);
        assert_eq!(view.phase, VisiblePhase::Won);
        assert_eq!(view.answer.as_deref(), Some("Imagine"));
    }

    #[test]
    fn open_response_is_tagged_by_status() {
        let response = OpenSessionResponse::Opened {
            resumed: false,
            session: SessionView::from_live(&live()).with_rejection(Some(Rejection::NotStarted)),
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["status"], "opened");
        assert_eq!(json["session"]["rejected"], "not_started");
    }

    #[test]
    fn song_id_is_validated() {
        assert!(OpenSessionRequest { song_id: "abc".into() }.validate().is_ok());
        assert!(OpenSessionRequest { song_id: " ".into() }.validate().is_err());
    }
}
