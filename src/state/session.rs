//! Per-player state machine for a single song challenge.
//!
//! A session moves `NotStarted -> InProgress -> Finished(Won | Lost)` and never
//! leaves the finished state. Every operation either applies or is rejected
//! with a [`Rejection`] while leaving the session untouched.

use std::time::SystemTime;

use indexmap::IndexSet;
use serde::Serialize;
use thiserror::Error;
use utoipa::ToSchema;

use crate::state::{
    challenge::{HintKind, SongChallenge},
    scoring::ScoreInput,
};

/// Terminal result of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The title was guessed.
    Won,
    /// Every try was spent without a match.
    Lost,
}

/// Lifecycle phase of a [`PlaySession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Waiting screen, the clock is not running.
    NotStarted,
    /// Guesses, reveals and ticks are accepted.
    InProgress,
    /// Terminal, nothing mutates the session anymore.
    Finished(Outcome),
}

impl SessionPhase {
    /// Whether the phase is terminal.
    pub fn is_finished(self) -> bool {
        matches!(self, SessionPhase::Finished(_))
    }
}

/// Reason an operation left the session unchanged.
///
/// These are expected, routine conditions rather than failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error, Serialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Rejection {
    /// The session has not been started yet.
    #[error("session has not started")]
    NotStarted,
    /// `start` was called on a session that already left the waiting screen.
    #[error("session already started")]
    AlreadyStarted,
    /// The session is finished.
    #[error("game is over")]
    GameOver,
    /// The guess is empty once trimmed.
    #[error("guess is blank")]
    BlankGuess,
    /// No try is left to spend.
    #[error("no tries left")]
    NoTriesLeft,
    /// Every lyric line is already visible.
    #[error("all lines are already revealed")]
    AllLinesRevealed,
    /// The hint was revealed before.
    #[error("hint already used")]
    HintAlreadyUsed,
}

/// Result of an accepted guess.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuessOutcome {
    /// Wrong guess, the game goes on.
    Missed {
        /// Tries still available.
        tries_remaining: u32,
    },
    /// The guess ended the game. Returned exactly once per session.
    Finished(Outcome),
}

/// Mutable progress of one player on one song.
#[derive(Debug, Clone)]
pub struct PlaySession {
    phase: SessionPhase,
    max_tries: u32,
    tries_remaining: u32,
    attempts: Vec<String>,
    used_hints: IndexSet<HintKind>,
    revealed_line_count: u32,
    line_count: u32,
    elapsed_seconds: u64,
    album_blurred: bool,
    started_at: Option<SystemTime>,
    finished_at: Option<SystemTime>,
}

impl PlaySession {
    /// Create a session on the waiting screen for `challenge`.
    pub fn new(challenge: &SongChallenge, max_tries: u32) -> Self {
        let max_tries = max_tries.max(1);
        Self {
            phase: SessionPhase::NotStarted,
            max_tries,
            tries_remaining: max_tries,
            attempts: Vec::new(),
            used_hints: IndexSet::new(),
            revealed_line_count: 1,
            line_count: challenge.line_count().max(1),
            elapsed_seconds: 0,
            album_blurred: true,
            started_at: None,
            finished_at: None,
        }
    }

    /// Leave the waiting screen and start the clock.
    pub fn start(&mut self) -> Result<(), Rejection> {
        if self.phase != SessionPhase::NotStarted {
            return Err(Rejection::AlreadyStarted);
        }

        self.tries_remaining = self.max_tries;
        self.attempts.clear();
        self.used_hints.clear();
        self.revealed_line_count = 1;
        self.elapsed_seconds = 0;
        self.album_blurred = true;
        self.started_at = Some(SystemTime::now());
        self.phase = SessionPhase::InProgress;
        Ok(())
    }

    /// Submit a guess against `challenge`.
    ///
    /// The raw guess is recorded as typed. A correct guess wins even when it
    /// spends the last try.
    pub fn submit_guess(
        &mut self,
        challenge: &SongChallenge,
        raw: &str,
    ) -> Result<GuessOutcome, Rejection> {
        self.ensure_in_progress()?;
        if self.tries_remaining == 0 {
            return Err(Rejection::NoTriesLeft);
        }
        if raw.trim().is_empty() {
            return Err(Rejection::BlankGuess);
        }

        self.attempts.push(raw.to_owned());
        self.tries_remaining -= 1;

        if challenge.accepts(raw) {
            Ok(GuessOutcome::Finished(self.finish(Outcome::Won)))
        } else if self.tries_remaining == 0 {
            Ok(GuessOutcome::Finished(self.finish(Outcome::Lost)))
        } else {
            Ok(GuessOutcome::Missed {
                tries_remaining: self.tries_remaining,
            })
        }
    }

    /// Reveal one more lyric line, returning the new visible count.
    pub fn reveal_next_line(&mut self) -> Result<u32, Rejection> {
        self.ensure_in_progress()?;
        if self.revealed_line_count >= self.line_count {
            return Err(Rejection::AllLinesRevealed);
        }

        self.revealed_line_count += 1;
        Ok(self.revealed_line_count)
    }

    /// Reveal a hint. Revealing the same hint twice is rejected.
    pub fn reveal_hint(&mut self, kind: HintKind) -> Result<(), Rejection> {
        self.ensure_in_progress()?;
        if !self.used_hints.insert(kind) {
            return Err(Rejection::HintAlreadyUsed);
        }

        if kind == HintKind::AlbumCover {
            self.album_blurred = false;
        }
        Ok(())
    }

    /// Advance the clock by one second, returning the new elapsed time.
    pub fn tick(&mut self) -> Result<u64, Rejection> {
        self.ensure_in_progress()?;
        self.elapsed_seconds += 1;
        Ok(self.elapsed_seconds)
    }

    /// Statistics fed to the scorer.
    pub fn score_input(&self) -> ScoreInput {
        ScoreInput {
            won: self.phase == SessionPhase::Finished(Outcome::Won),
            tries_used: self.tries_used(),
            hints_used: u32::try_from(self.used_hints.len()).unwrap_or(u32::MAX),
            lines_revealed: self.revealed_line_count,
            time_elapsed_secs: self.elapsed_seconds,
        }
    }

    /// Current lifecycle phase.
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    /// Terminal outcome, if any.
    pub fn outcome(&self) -> Option<Outcome> {
        match self.phase {
            SessionPhase::Finished(outcome) => Some(outcome),
            _ => None,
        }
    }

    pub fn max_tries(&self) -> u32 {
        self.max_tries
    }

    pub fn tries_remaining(&self) -> u32 {
        self.tries_remaining
    }

    /// Guesses spent so far, a winning guess included.
    pub fn tries_used(&self) -> u32 {
        self.max_tries - self.tries_remaining
    }

    /// Raw guesses in submission order.
    pub fn attempts(&self) -> &[String] {
        &self.attempts
    }

    /// Revealed hints in reveal order.
    pub fn used_hints(&self) -> impl Iterator<Item = HintKind> + '_ {
        self.used_hints.iter().copied()
    }

    pub fn has_used_hint(&self, kind: HintKind) -> bool {
        self.used_hints.contains(&kind)
    }

    pub fn revealed_line_count(&self) -> u32 {
        self.revealed_line_count
    }

    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Whether the album artwork is still blurred.
    pub fn album_blurred(&self) -> bool {
        self.album_blurred
    }

    pub fn started_at(&self) -> Option<SystemTime> {
        self.started_at
    }

    pub fn finished_at(&self) -> Option<SystemTime> {
        self.finished_at
    }

    fn ensure_in_progress(&self) -> Result<(), Rejection> {
        match self.phase {
            SessionPhase::NotStarted => Err(Rejection::NotStarted),
            SessionPhase::InProgress => Ok(()),
            SessionPhase::Finished(_) => Err(Rejection::GameOver),
        }
    }

    fn finish(&mut self, outcome: Outcome) -> Outcome {
        self.phase = SessionPhase::Finished(outcome);
        self.finished_at = Some(SystemTime::now());
        outcome
    }
}
