use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Date, format_description::BorrowedFormatItem, macros::format_description};
use utoipa::ToSchema;

use crate::dao::models::SongEntity;

/// Number of hint kinds a game offers.
pub const HINT_KIND_COUNT: usize = 5;

/// Calendar date format used for game dates, e.g. `2025-06-01`.
pub const GAME_DATE_FORMAT: &[BorrowedFormatItem<'static>] =
    format_description!("[year]-[month]-[day]");

/// Hints a player can spend while guessing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub enum HintKind {
    /// Removes the blur from the album artwork.
    AlbumCover,
    /// Name of the performing artist.
    Artist,
    /// Catalog popularity, from 0 to 100.
    Popularity,
    /// Album the song was released on.
    Album,
    /// Release year.
    Year,
}

impl HintKind {
    /// Every hint kind, in the order the game offers them.
    pub const ALL: [HintKind; HINT_KIND_COUNT] = [
        HintKind::AlbumCover,
        HintKind::Artist,
        HintKind::Popularity,
        HintKind::Album,
        HintKind::Year,
    ];

    /// Wire identifier of the hint.
    pub fn as_str(self) -> &'static str {
        match self {
            HintKind::AlbumCover => "albumCover",
            HintKind::Artist => "artist",
            HintKind::Popularity => "popularity",
            HintKind::Album => "album",
            HintKind::Year => "year",
        }
    }
}

impl fmt::Display for HintKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raised when a persisted hint identifier is not one of [`HintKind::ALL`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown hint `{0}`")]
pub struct UnknownHint(pub String);

impl FromStr for HintKind {
    type Err = UnknownHint;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        HintKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == value)
            .ok_or_else(|| UnknownHint(value.to_owned()))
    }
}

/// Reasons a stored song cannot be played.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidChallenge {
    /// The song has no translated lyric line to show.
    #[error("song `{0}` has no translated lyrics")]
    NoLyrics(String),
    /// The stored game date is not a `YYYY-MM-DD` calendar date.
    #[error("song `{song_id}` has an invalid game date `{value}`")]
    BadGameDate {
        /// Offending song.
        song_id: String,
        /// Raw stored value.
        value: String,
    },
}

/// Parse a `YYYY-MM-DD` game date.
pub fn parse_game_date(value: &str) -> Result<Date, time::error::Parse> {
    Date::parse(value.trim(), GAME_DATE_FORMAT)
}

/// Render a game date as `YYYY-MM-DD`.
pub fn format_game_date(date: Date) -> String {
    date.format(GAME_DATE_FORMAT)
        .unwrap_or_else(|_| date.to_string())
}

/// Read-only challenge a player tries to solve.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SongChallenge {
    /// Catalog identifier of the song.
    pub song_id: String,
    /// Primary correct answer.
    pub canonical_title: String,
    /// Curated equivalents of a correct guess.
    pub acceptable_answers: Vec<String>,
    /// Hint payload: artist name.
    pub artist: String,
    /// Hint payload: album name.
    pub album: String,
    /// Hint payload: release year.
    pub release_year: i32,
    /// Hint payload: popularity from 0 to 100.
    pub popularity: u8,
    /// Hint payload: artwork location.
    pub album_cover_url: String,
    /// Lyric lines revealed one at a time, never empty.
    pub translated_lyric_lines: Vec<String>,
    /// Calendar date the song is published for.
    pub game_date: Option<Date>,
}

impl SongChallenge {
    /// Whether `guess` matches the canonical title or one of the acceptable answers.
    ///
    /// Matching ignores case and surrounding whitespace only; punctuation and
    /// diacritics stay significant.
    pub fn accepts(&self, guess: &str) -> bool {
        let guess = normalize_answer(guess);
        self.acceptable_answers
            .iter()
            .chain(std::iter::once(&self.canonical_title))
            .any(|answer| normalize_answer(answer) == guess)
    }

    /// Number of lyric lines available for reveal.
    pub fn line_count(&self) -> u32 {
        u32::try_from(self.translated_lyric_lines.len()).unwrap_or(u32::MAX)
    }

    /// Value shown to the player once `kind` has been revealed.
    pub fn hint_value(&self, kind: HintKind) -> String {
        match kind {
            HintKind::AlbumCover => self.album_cover_url.clone(),
            HintKind::Artist => self.artist.clone(),
            HintKind::Popularity => format!("{}/100", self.popularity),
            HintKind::Album => self.album.clone(),
            HintKind::Year => self.release_year.to_string(),
        }
    }
}

/// Normalise a guess or an answer for comparison.
pub fn normalize_answer(raw: &str) -> String {
    raw.trim().to_lowercase()
}

impl TryFrom<SongEntity> for SongChallenge {
    type Error = InvalidChallenge;

    fn try_from(value: SongEntity) -> Result<Self, Self::Error> {
        if value.translated_lyrics.is_empty() {
            return Err(InvalidChallenge::NoLyrics(value.id));
        }

        let game_date = match value.game_date.trim() {
            "" => None,
            raw => Some(parse_game_date(raw).map_err(|_| InvalidChallenge::BadGameDate {
                song_id: value.id.clone(),
                value: raw.to_owned(),
            })?),
        };

        Ok(Self {
            song_id: value.id,
            canonical_title: value.song_title,
            acceptable_answers: value.acceptable_answers,
            artist: value.artist,
            album: value.album,
            release_year: value.release_year,
            popularity: value.popularity,
            album_cover_url: value.album_cover,
            translated_lyric_lines: value.translated_lyrics,
            game_date,
        })
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use time::macros::date;

    pub(crate) fn imagine() -> SongChallenge {
        SongChallenge {
            song_id: "7pKfPomDEeI4TPT6EOYjn9".into(),
            canonical_title: "Imagine".into(),
            acceptable_answers: vec!["Imagine".into()],
            artist: "John Lennon".into(),
            album: "Imagine".into(),
            release_year: 1971,
            popularity: 78,
            album_cover_url: "https://img.example/imagine.jpg".into(),
            translated_lyric_lines: vec![
                "תדמיין שאין גן עדן".into(),
                "זה קל אם תנסה".into(),
                "אין גיהנום מתחתינו".into(),
                "מעלינו רק שמיים".into(),
                "תדמיין את כל האנשים".into(),
                "חיים בשביל היום".into(),
            ],
            game_date: Some(date!(2025 - 06 - 01)),
        }
    }

    #[test]
    fn guess_matching_ignores_case_and_surrounding_whitespace() {
        let mut challenge = imagine();
        challenge.acceptable_answers = vec!["yesterday".into()];
        assert!(challenge.accepts("  Yesterday  "));
        assert!(challenge.accepts("YESTERDAY"));
    }

    #[test]
    fn canonical_title_is_always_accepted() {
        let mut challenge = imagine();
        challenge.acceptable_answers = vec!["Imagine (Remastered 2010)".into()];
        assert!(challenge.accepts("imagine"));
        assert!(challenge.accepts("imagine (remastered 2010)"));
    }

    #[test]
    fn punctuation_and_partial_titles_do_not_match() {
        let challenge = imagine();
        assert!(!challenge.accepts("imagin"));
        assert!(!challenge.accepts("Imagines"));
        assert!(!challenge.accepts("imagine!"));
        assert!(!challenge.accepts("im agine"));
    }

    #[test]
    fn hint_values_are_rendered_for_display() {
        let challenge = imagine();
        assert_eq!(challenge.hint_value(HintKind::Popularity), "78/100");
        assert_eq!(challenge.hint_value(HintKind::Year), "1971");
        assert_eq!(challenge.hint_value(HintKind::Artist), "John Lennon");
    }

    #[test]
    fn game_dates_use_the_iso_calendar_form() {
        assert_eq!(parse_game_date("2025-06-01").ok(), Some(date!(2025 - 06 - 01)));
        assert_eq!(format_game_date(date!(2025 - 12 - 31)), "2025-12-31");
        assert!(parse_game_date("01/06/2025").is_err());
    }

    #[test]
    fn hint_kinds_round_trip_through_their_identifiers() {
        for kind in HintKind::ALL {
            assert_eq!(kind.as_str().parse::<HintKind>(), Ok(kind));
        }
        assert!("lyrics".parse::<HintKind>().is_err());
    }
}
