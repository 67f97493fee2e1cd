//! DTO definitions used by the curator REST API and documentation layer.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::{
    dao::models::SongEntity,
    dto::{
        format_system_time,
        validation::{validate_game_date, validate_non_blank_list, validate_song_id},
    },
};

/// Highest accepted popularity.
pub const MAX_POPULARITY: u8 = 100;

/// Song published by a curator for a given date. Publishing an existing
/// `song_id` updates it.
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct PublishSongRequest {
    /// Catalog track identifier.
    pub song_id: String,
    pub song_title: String,
    /// Equivalent spellings of the title; the title itself is always accepted.
    pub acceptable_answers: Vec<String>,
    pub artist: String,
    #[serde(default)]
    pub album: String,
    #[serde(default)]
    pub release_year: i32,
    /// Catalog popularity, from 0 to 100.
    #[serde(default)]
    pub popularity: u8,
    #[serde(default)]
    pub album_cover: String,
    #[serde(default)]
    pub original_language: String,
    /// Translated lyric lines, in reveal order.
    pub translated_lyrics: Vec<String>,
    /// Original lyrics as pasted by the curator; only the first lines are kept.
    #[serde(default)]
    pub original_lyrics: Option<String>,
    /// Publication date as `YYYY-MM-DD`.
    pub game_date: String,
}

fn required(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("required");
        err.message = Some(format!("{field} is required").into());
        return Err(err);
    }
    Ok(())
}

impl Validate for PublishSongRequest {
    fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::new();

        if let Err(e) = validate_song_id(&self.song_id) {
            errors.add("song_id", e);
        }
        if let Err(e) = required(&self.song_title, "song_title") {
            errors.add("song_title", e);
        }
        if let Err(e) = required(&self.artist, "artist") {
            errors.add("artist", e);
        }
        if let Err(e) = validate_non_blank_list(&self.acceptable_answers) {
            errors.add("acceptable_answers", e);
        }
        if !self
            .translated_lyrics
            .iter()
            .any(|line| !line.trim().is_empty())
        {
            let mut err = ValidationError::new("lyrics_empty");
            err.message = Some("At least one translated lyric line is required".into());
            errors.add("translated_lyrics", err);
        }
        if let Err(e) = validate_game_date(&self.game_date) {
            errors.add("game_date", e);
        }
        if self.popularity > MAX_POPULARITY {
            let mut err = ValidationError::new("range");
            err.message = Some(
                format!(
                    "Popularity must be between 0 and {MAX_POPULARITY} (got {})",
                    self.popularity
                )
                .into(),
            );
            errors.add("popularity", err);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Full projection of a song for curators.
#[derive(Debug, Serialize, ToSchema)]
pub struct SongSummary {
    pub song_id: String,
    pub song_title: String,
    pub acceptable_answers: Vec<String>,
    pub artist: String,
    pub album: String,
    pub release_year: i32,
    pub popularity: u8,
    pub album_cover: String,
    pub original_language: String,
    pub translated_lyrics: Vec<String>,
    pub original_lyrics_lines: Vec<String>,
    pub game_date: String,
    pub is_active: bool,
    pub created_at: String,
    pub updated_at: String,
}

impl From<SongEntity> for SongSummary {
    fn from(song: SongEntity) -> Self {
        Self {
            song_id: song.id,
            song_title: song.song_title,
            acceptable_answers: song.acceptable_answers,
            artist: song.artist,
            album: song.album,
            release_year: song.release_year,
            popularity: song.popularity,
            album_cover: song.album_cover,
            original_language: song.original_language,
            translated_lyrics: song.translated_lyrics,
            original_lyrics_lines: song.original_lyrics_lines,
            game_date: song.game_date,
            is_active: song.is_active,
            created_at: format_system_time(song.created_at),
            updated_at: format_system_time(song.updated_at),
        }
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn publish_request(song_id: &str, game_date: &str) -> PublishSongRequest {
        PublishSongRequest {
            song_id: song_id.into(),
            song_title: "Imagine".into(),
            acceptable_answers: vec!["Imagine".into()],
            artist: "John Lennon".into(),
            album: "Imagine".into(),
            release_year: 1971,
            popularity: 78,
            album_cover: "https://img.example/imagine.jpg".into(),
            original_language: "en".into(),
            translated_lyrics: vec!["דמיין שאין גן עדן".into(), "זה קל אם תנסה".into()],
            original_lyrics: Some("Imagine there's no heaven\n\nIt's easy if you try\n".into()),
            game_date: game_date.into(),
        }
    }

    #[test]
    fn complete_request_is_valid() {
        assert!(publish_request("s1", "2025-06-01").validate().is_ok());
    }

    #[test]
    fn every_invalid_field_is_reported() {
        let mut request = publish_request("s1", "2025-13-01");
        request.song_title = "  ".into();
        request.acceptable_answers.clear();
        request.translated_lyrics = vec!["".into(), " ".into()];
        request.popularity = 101;

        let errors = request.validate().unwrap_err();
        let fields = errors.field_errors();
        for field in [
            "song_title",
            "acceptable_answers",
            "translated_lyrics",
            "game_date",
            "popularity",
        ] {
            assert!(fields.contains_key(field), "missing error for {field}");
        }
        assert!(!fields.contains_key("artist"));
    }
}
