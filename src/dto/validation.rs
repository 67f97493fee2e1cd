//! Validation helpers for DTOs.

use validator::ValidationError;

use crate::state::challenge::parse_game_date;

/// Longest identifier accepted for songs.
pub const MAX_SONG_ID_LEN: usize = 128;

/// Validates a catalog song identifier: non-blank, no surrounding whitespace,
/// no `::` (reserved as a key separator by the document store).
pub fn validate_song_id(id: &str) -> Result<(), ValidationError> {
    if id.trim().is_empty() {
        let mut err = ValidationError::new("song_id_blank");
        err.message = Some("Song ID must not be blank".into());
        return Err(err);
    }

    if id.len() > MAX_SONG_ID_LEN {
        let mut err = ValidationError::new("song_id_length");
        err.message = Some(
            format!(
                "Song ID must be at most {MAX_SONG_ID_LEN} characters (got {})",
                id.len()
            )
            .into(),
        );
        return Err(err);
    }

    if id.trim() != id || id.contains("::") {
        let mut err = ValidationError::new("song_id_format");
        err.message =
            Some("Song ID must not contain surrounding whitespace or `::`".into());
        return Err(err);
    }

    Ok(())
}

/// Validates a publication date written as `YYYY-MM-DD`.
///
/// # Examples
///
/// ```ignore
/// validate_game_date("2025-06-01") // Ok
/// validate_game_date("2025-6-1")   // Err - not zero padded
/// validate_game_date("2025-02-30") // Err - no such day
/// ```
pub fn validate_game_date(value: &str) -> Result<(), ValidationError> {
    if parse_game_date(value).is_err() {
        let mut err = ValidationError::new("game_date_format");
        err.message = Some(format!("Game date must be a YYYY-MM-DD date (got `{value}`)").into());
        return Err(err);
    }
    Ok(())
}

/// Validates that a list holds at least one entry and no blank entries.
pub fn validate_non_blank_list(values: &[String]) -> Result<(), ValidationError> {
    if values.is_empty() {
        let mut err = ValidationError::new("list_empty");
        err.message = Some("At least one entry is required".into());
        return Err(err);
    }

    if let Some(index) = values.iter().position(|value| value.trim().is_empty()) {
        let mut err = ValidationError::new("list_blank_entry");
        err.message = Some(format!("Entry {index} is blank").into());
        return Err(err);
    }

    Ok(())
}
