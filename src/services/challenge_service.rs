//! Resolution of the song a player is about to play.

use std::fmt;

use rand::seq::IndexedRandom;
use time::{Date, OffsetDateTime};
use tracing::debug;

use crate::{
    dao::models::SongEntity,
    error::ServiceError,
    state::{
        SharedState,
        challenge::{SongChallenge, format_game_date},
    },
};

/// Which challenge a player asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChallengeKey {
    /// The song published for the current UTC date.
    Today,
    /// Any active song.
    Random,
    /// An active song by catalog id.
    Id(String),
}

impl fmt::Display for ChallengeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChallengeKey::Today => f.write_str("today"),
            ChallengeKey::Random => f.write_str("random"),
            ChallengeKey::Id(id) => write!(f, "song `{id}`"),
        }
    }
}

/// Current calendar date in UTC, the reference for daily games.
pub fn today() -> Date {
    OffsetDateTime::now_utc().date()
}

/// Load the challenge designated by `key`.
///
/// Inactive songs are never returned. A missing song yields
/// [`ServiceError::NotFound`].
pub async fn fetch_challenge(
    state: &SharedState,
    key: ChallengeKey,
) -> Result<SongChallenge, ServiceError> {
    let store = state.require_game_store().await?;

    let song = match &key {
        ChallengeKey::Today => store.find_song_by_date(format_game_date(today())).await?,
        ChallengeKey::Random => pick_active(store.list_songs().await?),
        ChallengeKey::Id(id) => store.find_song(id.clone()).await?,
    };

    let Some(song) = song.filter(|song| song.is_active) else {
        debug!(%key, "no challenge available");
        return Err(ServiceError::NotFound(format!("no challenge for {key}")));
    };

    Ok(SongChallenge::try_from(song)?)
}

fn pick_active(songs: Vec<SongEntity>) -> Option<SongEntity> {
    let active = songs
        .into_iter()
        .filter(|song| song.is_active)
        .collect::<Vec<_>>();
    active.choose(&mut rand::rng()).cloned()
}
