//! Curator operations on the song catalog.

use std::time::SystemTime;

use tracing::info;

use crate::{
    dao::models::SongEntity,
    dto::admin::{PublishSongRequest, SongSummary},
    error::ServiceError,
    state::{
        SharedState,
        challenge::{format_game_date, parse_game_date},
    },
};

/// Number of original lyric lines kept alongside a song.
pub const ORIGINAL_LYRICS_KEPT: usize = 5;

/// First non-empty lines of pasted lyrics, trimmed.
pub fn split_original_lyrics(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(ORIGINAL_LYRICS_KEPT)
        .map(str::to_owned)
        .collect()
}

fn clean_lines(lines: Vec<String>) -> Vec<String> {
    lines
        .into_iter()
        .map(|line| line.trim().to_owned())
        .filter(|line| !line.is_empty())
        .collect()
}

/// Create or update the song of a date.
///
/// Only one active song may be published for a given date; publishing an
/// existing id keeps its creation time and reactivates it.
pub async fn publish_song(
    state: &SharedState,
    request: PublishSongRequest,
) -> Result<SongSummary, ServiceError> {
    let game_date = parse_game_date(request.game_date.trim())
        .map(format_game_date)
        .map_err(|_| {
            ServiceError::InvalidInput(format!("invalid game date `{}`", request.game_date))
        })?;
    let store = state.require_game_store().await?;

    if let Some(existing) = store.find_song_by_date(game_date.clone()).await? {
        if existing.id != request.song_id {
            return Err(ServiceError::Conflict(format!(
                "{game_date} already has song `{}`",
                existing.id
            )));
        }
    }

    let previous = store.find_song(request.song_id.clone()).await?;
    let now = SystemTime::now();
    let original_lyrics_lines = match (&request.original_lyrics, &previous) {
        (Some(text), _) => split_original_lyrics(text),
        (None, Some(previous)) => previous.original_lyrics_lines.clone(),
        (None, None) => Vec::new(),
    };

    let song = SongEntity {
        id: request.song_id,
        song_title: request.song_title.trim().to_owned(),
        acceptable_answers: clean_lines(request.acceptable_answers),
        artist: request.artist.trim().to_owned(),
        album: request.album.trim().to_owned(),
        release_year: request.release_year,
        popularity: request.popularity,
        album_cover: request.album_cover,
        original_language: request.original_language,
        translated_lyrics: clean_lines(request.translated_lyrics),
        original_lyrics_lines,
        game_date,
        created_at: previous.as_ref().map_or(now, |previous| previous.created_at),
        updated_at: now,
        is_active: true,
    };

    if song.translated_lyrics.is_empty() {
        return Err(ServiceError::InvalidInput(
            "at least one translated lyric line is required".into(),
        ));
    }

    store.save_song(song.clone()).await?;
    info!(
        song_id = %song.id,
        game_date = %song.game_date,
        updated = previous.is_some(),
        "song published"
    );
    Ok(song.into())
}

/// Every song, newest publication date first.
pub async fn list_songs(state: &SharedState) -> Result<Vec<SongSummary>, ServiceError> {
    let store = state.require_game_store().await?;
    let mut songs = store.list_songs().await?;
    songs.sort_by(|a, b| b.game_date.cmp(&a.game_date).then_with(|| a.id.cmp(&b.id)));
    Ok(songs.into_iter().map(SongSummary::from).collect())
}

/// A song by id, active or not.
pub async fn get_song(state: &SharedState, song_id: &str) -> Result<SongSummary, ServiceError> {
    load_song(state, song_id).await.map(SongSummary::from)
}

/// Hide a song from players. Stored results are kept.
pub async fn deactivate_song(
    state: &SharedState,
    song_id: &str,
) -> Result<SongSummary, ServiceError> {
    let mut song = load_song(state, song_id).await?;
    if song.is_active {
        song.is_active = false;
        song.updated_at = SystemTime::now();
        state.require_game_store().await?.save_song(song.clone()).await?;
        info!(song_id = %song.id, "song deactivated");
    }
    Ok(song.into())
}

async fn load_song(state: &SharedState, song_id: &str) -> Result<SongEntity, ServiceError> {
    let store = state.require_game_store().await?;
    store
        .find_song(song_id.to_owned())
        .await?
        .ok_or_else(|| ServiceError::NotFound(format!("song `{song_id}` not found")))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::game_store::memory::MemoryGameStore,
        dto::admin::tests::publish_request,
        state::AppState,
    };

    async fn state_with_store() -> SharedState {
        let state = AppState::new(AppConfig::default());
        state.set_game_store(Arc::new(MemoryGameStore::new())).await;
        state
    }

    #[test]
    fn original_lyrics_keep_five_trimmed_lines() {
        let text = "  one \n\n two\nthree\n   \nfour\nfive\nsix\n";
        assert_eq!(
            split_original_lyrics(text),
            ["one", "two", "three", "four", "five"]
        );
        assert!(split_original_lyrics("\n  \n").is_empty());
    }

    #[tokio::test]
    async fn one_active_song_per_date() {
        let state = state_with_store().await;
        publish_song(&state, publish_request("s1", "2025-06-01"))
            .await
            .unwrap();

        let err = publish_song(&state, publish_request("s2", "2025-06-01"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Conflict(_)));

        deactivate_song(&state, "s1").await.unwrap();
        publish_song(&state, publish_request("s2", "2025-06-01"))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn republishing_keeps_creation_time() {
        let state = state_with_store().await;
        let first = publish_song(&state, publish_request("s1", "2025-06-01"))
            .await
            .unwrap();

        let mut update = publish_request("s1", "2025-06-01");
        update.original_lyrics = None;
        update.translated_lyrics = vec!["  שורה  ".into(), "".into()];
        let second = publish_song(&state, update).await.unwrap();

        assert_eq!(second.created_at, first.created_at);
        assert_eq!(second.translated_lyrics, ["שורה"]);
        assert_eq!(
            second.original_lyrics_lines,
            ["Imagine there's no heaven", "It's easy if you try"]
        );
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let state = state_with_store().await;
        for (id, date) in [("a", "2025-06-01"), ("b", "2025-06-03"), ("c", "2025-06-02")] {
            publish_song(&state, publish_request(id, date)).await.unwrap();
        }

        let ids = list_songs(&state)
            .await
            .unwrap()
            .into_iter()
            .map(|song| song.song_id)
            .collect::<Vec<_>>();
        assert_eq!(ids, ["b", "c", "a"]);
    }

    #[tokio::test]
    async fn unknown_song_is_not_found() {
        let state = state_with_store().await;
        assert!(matches!(
            get_song(&state, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(matches!(
            deactivate_song(&state, "missing").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
