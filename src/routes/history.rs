use axum::{Json, Router, extract::State, routing::get};

use crate::{
    dto::history::{PastGame, ScoreHistoryResponse},
    error::AppError,
    routes::identity::RequiredUser,
    services::history_service,
    state::SharedState,
};

/// Per-player history, identified by the `x-user-id` header.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/history/scores", get(scores))
        .route("/history/games", get(games))
}

/// Every stored result of the player.
#[utoipa::path(
    get,
    path = "/history/scores",
    tag = "history",
    params(("x-user-id" = String, Header, description = "Player identifier")),
    responses(
        (status = 200, description = "Results, most recent first", body = ScoreHistoryResponse),
        (status = 401, description = "Missing player header"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn scores(
    State(state): State<SharedState>,
    RequiredUser(user): RequiredUser,
) -> Result<Json<ScoreHistoryResponse>, AppError> {
    Ok(Json(history_service::user_scores(&state, &user).await?))
}

/// Daily games published so far, with the player's results.
#[utoipa::path(
    get,
    path = "/history/games",
    tag = "history",
    params(("x-user-id" = String, Header, description = "Player identifier")),
    responses(
        (status = 200, description = "Past games, newest first", body = [PastGame]),
        (status = 401, description = "Missing player header"),
        (status = 503, description = "Storage unavailable")
    )
)]
pub async fn games(
    State(state): State<SharedState>,
    RequiredUser(user): RequiredUser,
) -> Result<Json<Vec<PastGame>>, AppError> {
    Ok(Json(history_service::past_games(&state, &user).await?))
}
