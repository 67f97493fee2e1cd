use std::time::SystemTime;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    dao::models::ScoreEntity,
    state::{
        challenge::{HintKind, SongChallenge, UnknownHint},
        session::{Outcome, PlaySession},
    },
};

/// Persisted result of a finished session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreRecord {
    /// Player the record belongs to, `None` for anonymous play.
    pub user_id: Option<String>,
    /// Session that produced the record.
    pub session_id: Uuid,
    /// Song the record belongs to.
    pub song_id: String,
    /// Title of the song at the time of play.
    pub song_title: String,
    /// Artist of the song at the time of play.
    pub artist: String,
    pub album: String,
    pub release_year: i32,
    /// Whether the session was won.
    pub is_won: bool,
    /// Guesses spent, the winning one included.
    pub tries_used: u32,
    /// Distinct hints revealed.
    pub hints_used_count: u32,
    /// Lyric lines visible at the end.
    pub lines_revealed: u32,
    /// Seconds on the clock at the end.
    pub time_elapsed_seconds: u64,
    /// Raw guesses in submission order.
    pub attempts: Vec<String>,
    /// Hints in reveal order.
    pub used_hint_types: Vec<HintKind>,
    /// Final score, 0 for a loss.
    pub score: u32,
    /// Time of the terminal transition.
    pub completed_at: SystemTime,
}

impl ScoreRecord {
    /// Snapshot a finished session. Returns `None` while the session is still running.
    pub fn from_session(
        user_id: Option<String>,
        session_id: Uuid,
        challenge: &SongChallenge,
        session: &PlaySession,
        score: u32,
    ) -> Option<Self> {
        let outcome = session.outcome()?;
        let input = session.score_input();
        Some(Self {
            user_id,
            session_id,
            song_id: challenge.song_id.clone(),
            song_title: challenge.canonical_title.clone(),
            artist: challenge.artist.clone(),
            album: challenge.album.clone(),
            release_year: challenge.release_year,
            is_won: outcome == Outcome::Won,
            tries_used: input.tries_used,
            hints_used_count: input.hints_used,
            lines_revealed: input.lines_revealed,
            time_elapsed_seconds: input.time_elapsed_secs,
            attempts: session.attempts().to_vec(),
            used_hint_types: session.used_hints().collect(),
            score: if outcome == Outcome::Won { score } else { 0 },
            completed_at: session.finished_at().unwrap_or_else(SystemTime::now),
        })
    }

    /// Outcome stored in the record.
    pub fn outcome(&self) -> Outcome {
        if self.is_won {
            Outcome::Won
        } else {
            Outcome::Lost
        }
    }
}

impl From<ScoreRecord> for ScoreEntity {
    fn from(value: ScoreRecord) -> Self {
        Self {
            user_id: value.user_id,
            session_id: value.session_id.to_string(),
            song_id: value.song_id,
            song_title: value.song_title,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            is_won: value.is_won,
            tries_used: value.tries_used,
            hints_used_count: value.hints_used_count,
            lines_revealed: value.lines_revealed,
            time_elapsed_seconds: value.time_elapsed_seconds,
            attempts: value.attempts,
            used_hint_types: value
                .used_hint_types
                .into_iter()
                .map(|kind| kind.as_str().to_owned())
                .collect(),
            score: value.score,
            completed_at: value.completed_at,
        }
    }
}

/// Why a stored score could not be read back.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidScore {
    /// A used hint is not a known hint kind.
    #[error(transparent)]
    Hint(#[from] UnknownHint),
    /// The producing session id is not a UUID.
    #[error("invalid session id `{0}`")]
    SessionId(String),
}

impl TryFrom<ScoreEntity> for ScoreRecord {
    type Error = InvalidScore;

    fn try_from(value: ScoreEntity) -> Result<Self, Self::Error> {
        let used_hint_types = value
            .used_hint_types
            .iter()
            .map(|raw| raw.parse::<HintKind>())
            .collect::<Result<Vec<_>, _>>()?;
        let session_id = Uuid::parse_str(&value.session_id)
            .map_err(|_| InvalidScore::SessionId(value.session_id.clone()))?;

        Ok(Self {
            user_id: value.user_id,
            session_id,
            song_id: value.song_id,
            song_title: value.song_title,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            is_won: value.is_won,
            tries_used: value.tries_used,
            hints_used_count: value.hints_used_count,
            lines_revealed: value.lines_revealed,
            time_elapsed_seconds: value.time_elapsed_seconds,
            attempts: value.attempts,
            used_hint_types,
            score: value.score,
            completed_at: value.completed_at,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::ScoreKey;
    use crate::state::challenge::tests::imagine;

    fn snapshot(
        challenge: &SongChallenge,
        session: &PlaySession,
        score: u32,
    ) -> Option<ScoreRecord> {
        ScoreRecord::from_session(Some("u1".into()), Uuid::new_v4(), challenge, session, score)
    }

    #[test]
    fn running_sessions_have_no_record() {
        let challenge = imagine();
        let mut session = PlaySession::new(&challenge, 3);
        assert!(snapshot(&challenge, &session, 0).is_none());
        session.start().unwrap();
        assert!(snapshot(&challenge, &session, 0).is_none());
    }

    #[test]
    fn record_copies_terminal_statistics() {
        let challenge = imagine();
        let mut session = PlaySession::new(&challenge, 3);
        session.start().unwrap();
        session.reveal_hint(HintKind::Year).unwrap();
        session.reveal_hint(HintKind::AlbumCover).unwrap();
        session.reveal_next_line().unwrap();
        session.submit_guess(&challenge, "Jealous Guy").unwrap();
        session.submit_guess(&challenge, "IMAGINE").unwrap();

        let record = snapshot(&challenge, &session, 1650).unwrap();

        assert!(record.is_won);
        assert_eq!(record.song_title, "Imagine");
        assert_eq!(record.artist, "John Lennon");
        assert_eq!(record.album, "Imagine");
        assert_eq!(record.release_year, 1971);
        assert_eq!(record.tries_used, 2);
        assert_eq!(record.hints_used_count, 2);
        assert_eq!(record.lines_revealed, 2);
        assert_eq!(record.attempts, ["Jealous Guy", "IMAGINE"]);
        assert_eq!(
            record.used_hint_types,
            [HintKind::Year, HintKind::AlbumCover]
        );
        assert_eq!(record.score, 1650);
    }

    #[test]
    fn lost_records_never_carry_points() {
        let challenge = imagine();
        let mut session = PlaySession::new(&challenge, 1);
        session.start().unwrap();
        session.submit_guess(&challenge, "Woman").unwrap();

        let record = snapshot(&challenge, &session, 999).unwrap();
        assert_eq!(record.outcome(), Outcome::Lost);
        assert_eq!(record.score, 0);
    }

    #[test]
    fn stored_hint_identifiers_are_checked() {
        let challenge = imagine();
        let mut session = PlaySession::new(&challenge, 1);
        session.start().unwrap();
        session.reveal_hint(HintKind::Popularity).unwrap();
        session.submit_guess(&challenge, "Imagine").unwrap();
        let record = snapshot(&challenge, &session, 10).unwrap();

        let mut entity = ScoreEntity::from(record.clone());
        assert_eq!(entity.used_hint_types, ["popularity"]);
        assert_eq!(ScoreRecord::try_from(entity.clone()), Ok(record));

        entity.used_hint_types.push("lyrics".into());
        assert!(matches!(
            ScoreRecord::try_from(entity),
            Err(InvalidScore::Hint(_))
        ));
    }

    #[test]
    fn anonymous_records_keep_their_session() {
        let challenge = imagine();
        let mut session = PlaySession::new(&challenge, 1);
        session.start().unwrap();
        session.submit_guess(&challenge, "Woman").unwrap();
        let session_id = Uuid::new_v4();

        let record = ScoreRecord::from_session(None, session_id, &challenge, &session, 0).unwrap();
        let entity = ScoreEntity::from(record.clone());
        assert_eq!(entity.user_id, None);
        assert_eq!(entity.session_id, session_id.to_string());
        assert_eq!(entity.key(), ScoreKey::Anonymous(session_id.to_string()));
        assert_eq!(ScoreRecord::try_from(entity), Ok(record));
    }
}
