use axum::{
    Json, Router,
    extract::{Path, State},
    routing::get,
};

use crate::{
    dto::challenge::ChallengePreview,
    error::AppError,
    services::challenge_service::{self, ChallengeKey},
    state::SharedState,
};

/// Public lookup of playable songs.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/challenges/today", get(today))
        .route("/challenges/random", get(random))
        .route("/challenges/{song_id}", get(by_id))
}

async fn preview(state: &SharedState, key: ChallengeKey) -> Result<Json<ChallengePreview>, AppError> {
    let challenge = challenge_service::fetch_challenge(state, key).await?;
    Ok(Json(ChallengePreview::from(&challenge)))
}

/// Song published for the current UTC date.
#[utoipa::path(
    get,
    path = "/challenges/today",
    tag = "challenges",
    responses(
        (status = 200, description = "Today's song", body = ChallengePreview),
        (status = 404, description = "Nothing published today"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn today(State(state): State<SharedState>) -> Result<Json<ChallengePreview>, AppError> {
    preview(&state, ChallengeKey::Today).await
}

/// Any active song.
#[utoipa::path(
    get,
    path = "/challenges/random",
    tag = "challenges",
    responses(
        (status = 200, description = "A random song", body = ChallengePreview),
        (status = 404, description = "No active song"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn random(State(state): State<SharedState>) -> Result<Json<ChallengePreview>, AppError> {
    preview(&state, ChallengeKey::Random).await
}

/// An active song by catalog id.
#[utoipa::path(
    get,
    path = "/challenges/{song_id}",
    tag = "challenges",
    params(("song_id" = String, Path, description = "Catalog song identifier")),
    responses(
        (status = 200, description = "The song", body = ChallengePreview),
        (status = 404, description = "Unknown or inactive song"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn by_id(
    State(state): State<SharedState>,
    Path(song_id): Path<String>,
) -> Result<Json<ChallengePreview>, AppError> {
    preview(&state, ChallengeKey::Id(song_id)).await
}
